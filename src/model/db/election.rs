use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{ElectionPhase, ElectionState},
    mongodb::Id,
};

/// Core election instance data: the state machine for one run of a config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionCore {
    pub config_id: Id,
    pub state: ElectionState,
    /// 0-based index into the config's position list.
    pub current_position: u32,
    pub current_phase: ElectionPhase,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl ElectionCore {
    /// A fresh instance for the given config: position 0, nomination phase.
    pub fn new(config_id: Id) -> Self {
        Self {
            config_id,
            state: ElectionState::Active,
            current_position: 0,
            current_phase: ElectionPhase::Nomination,
            created_at: Utc::now(),
        }
    }
}

/// An instance without an ID.
pub type NewElection = ElectionCore;

/// An election instance from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Election {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub election: ElectionCore,
}

impl Deref for Election {
    type Target = ElectionCore;

    fn deref(&self) -> &Self::Target {
        &self.election
    }
}

impl DerefMut for Election {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.election
    }
}
