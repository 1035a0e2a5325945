use serde::{Deserialize, Serialize};

use crate::model::{common::ElectionPhase, mongodb::Id};

use super::election::ElectionSummary;

/// The active election a voter may participate in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveElectionResponse {
    pub election: ElectionSummary,
    pub church_name: String,
    pub positions: Vec<String>,
}

/// One candidate as shown on a voter's ballot.
///
/// In the nomination phase this is the full frozen pool and `nominations`
/// is zero; in the voting phase only nominated candidates appear, with
/// their nomination counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallotCandidate {
    pub id: Id,
    pub name: String,
    pub nominations: u64,
}

/// Everything a voter needs to render their ballot for the current
/// position: the candidate list plus their own progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingView {
    pub election: ElectionSummary,
    pub current_position: u32,
    pub total_positions: u32,
    pub position_name: String,
    pub phase: ElectionPhase,
    pub candidates: Vec<BallotCandidate>,
    pub has_voted: bool,
    pub voted_candidate_name: Option<String>,
    pub nomination_count: u64,
    pub max_nominations: u32,
    pub has_reached_nomination_limit: bool,
}

/// A voter's submission. The action type is not part of the request; it
/// is derived from the instance's current phase at write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallotSpec {
    pub config_id: Id,
    pub candidate_id: Id,
}
