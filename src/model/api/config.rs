use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{ConfigState, ElectionState, EligibilityCriteria},
    db::config::{ElectionConfig, NewElectionConfig},
    mongodb::Id,
};

fn default_max_nominations() -> u32 {
    1
}

/// An admin's request to create an election config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionConfigSpec {
    pub church_id: u32,
    pub church_name: String,
    pub voters: Vec<Id>,
    #[serde(default)]
    pub criteria: EligibilityCriteria,
    pub positions: Vec<String>,
    #[serde(default = "default_max_nominations")]
    pub max_nominations_per_voter: u32,
}

impl From<ElectionConfigSpec> for NewElectionConfig {
    fn from(spec: ElectionConfigSpec) -> Self {
        Self {
            church_id: spec.church_id,
            church_name: spec.church_name,
            voters: spec.voters,
            criteria: spec.criteria,
            positions: spec.positions,
            max_nominations_per_voter: spec.max_nominations_per_voter,
            state: ConfigState::Draft,
            created_at: Utc::now(),
        }
    }
}

/// An API-friendly config description, including the state of the most
/// recent instance started from it (if any).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionConfigDescription {
    pub id: Id,
    pub church_id: u32,
    pub church_name: String,
    pub voters: Vec<Id>,
    pub criteria: EligibilityCriteria,
    pub positions: Vec<String>,
    pub max_nominations_per_voter: u32,
    pub state: ConfigState,
    pub created_at: DateTime<Utc>,
    pub election_state: Option<ElectionState>,
}

impl ElectionConfigDescription {
    pub fn new(config: ElectionConfig, election_state: Option<ElectionState>) -> Self {
        Self {
            id: config.id,
            church_id: config.config.church_id,
            church_name: config.config.church_name,
            voters: config.config.voters,
            criteria: config.config.criteria,
            positions: config.config.positions,
            max_nominations_per_voter: config.config.max_nominations_per_voter,
            state: config.config.state,
            created_at: config.config.created_at,
            election_state,
        }
    }
}
