use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{ElectionPhase, ElectionState},
    db::election::Election,
    mongodb::Id,
};

/// A summary of an election instance's current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionSummary {
    pub id: Id,
    pub config_id: Id,
    pub state: ElectionState,
    pub current_position: u32,
    pub current_phase: ElectionPhase,
    pub created_at: DateTime<Utc>,
}

impl From<&Election> for ElectionSummary {
    fn from(election: &Election) -> Self {
        Self {
            id: election.id,
            config_id: election.config_id,
            state: election.state,
            current_position: election.current_position,
            current_phase: election.current_phase,
            created_at: election.created_at,
        }
    }
}

/// Start an election. With no `config_id`, the most recently created
/// config is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartElectionRequest {
    #[serde(default)]
    pub config_id: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartElectionResponse {
    pub election_id: Id,
    pub candidates: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancePhaseRequest {
    pub config_id: Id,
    pub phase: ElectionPhase,
}

/// Jump the instance to the given position index. Deliberately unguarded:
/// the admin UI drives this and may legitimately revisit earlier positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancePositionRequest {
    pub config_id: Id,
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetVotingRequest {
    pub config_id: Id,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetVotingResponse {
    pub position: String,
    pub current_phase: ElectionPhase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaxNominationsRequest {
    pub config_id: Id,
    pub max_nominations: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveAllMembersResponse {
    pub approved: u64,
}
