use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{ConfigState, EligibilityCriteria},
    mongodb::Id,
};

/// Core election config data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionConfigCore {
    pub church_id: u32,
    pub church_name: String,
    /// The members entitled to nominate and vote. No role restriction.
    pub voters: Vec<Id>,
    pub criteria: EligibilityCriteria,
    /// Officer positions to fill, in the order they will be processed.
    pub positions: Vec<String>,
    /// Nomination cap per voter per position. Always at least 1.
    pub max_nominations_per_voter: u32,
    pub state: ConfigState,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// A config without an ID, ready for insertion.
pub type NewElectionConfig = ElectionConfigCore;

/// An election config from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionConfig {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub config: ElectionConfigCore,
}

impl ElectionConfig {
    /// The name of the position at the given index, if it is in range.
    pub fn position_name(&self, index: u32) -> Option<&str> {
        self.positions.get(index as usize).map(String::as_str)
    }
}

impl Deref for ElectionConfig {
    type Target = ElectionConfigCore;

    fn deref(&self) -> &Self::Target {
        &self.config
    }
}

impl DerefMut for ElectionConfig {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_name_is_bounds_checked() {
        // Admin position jumps are unguarded, so lookups must tolerate an
        // out-of-range index.
        let config = ElectionConfig::example(vec![Id::new()], vec!["Elder", "Deacon"]);
        assert_eq!(config.position_name(0), Some("Elder"));
        assert_eq!(config.position_name(1), Some("Deacon"));
        assert_eq!(config.position_name(2), None);
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl ElectionConfig {
        pub fn example(voters: Vec<Id>, positions: Vec<&str>) -> Self {
            Self {
                id: Id::new(),
                config: ElectionConfigCore {
                    church_id: 1,
                    church_name: "Igreja Central".to_string(),
                    voters,
                    criteria: EligibilityCriteria::default(),
                    positions: positions.into_iter().map(String::from).collect(),
                    max_nominations_per_voter: 1,
                    state: ConfigState::Draft,
                    created_at: Utc::now(),
                },
            }
        }
    }
}
