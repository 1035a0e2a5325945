use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::{
    doc, serde_helpers::chrono_datetime_as_bson_datetime, to_bson, Bson, Document,
};
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core member data, as stored by the wider app.
///
/// Only the fields the election engine reads are modelled; the rest of the
/// member document round-trips untouched through the `profile` map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberCore {
    pub name: String,
    pub church: String,
    pub role: Role,
    pub status: MemberStatus,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub joined_at: DateTime<Utc>,
    /// Free-form management data (tithing type, engagement, ...).
    /// Translated into a typed profile by `AuxiliaryProfile::derive`.
    #[serde(default)]
    pub profile: Document,
}

/// A member from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub member: MemberCore,
}

impl Deref for Member {
    type Target = MemberCore;

    fn deref(&self) -> &Self::Target {
        &self.member
    }
}

impl DerefMut for Member {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.member
    }
}

/// Member roles known to the app.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
    Interested,
    Missionary,
}

impl Role {
    /// Does this role carry the admin capability?
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Membership approval status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Pending,
    Approved,
    Rejected,
}

impl From<Role> for Bson {
    fn from(role: Role) -> Self {
        to_bson(&role).expect("Serialisation is infallible")
    }
}

impl From<MemberStatus> for Bson {
    fn from(status: MemberStatus) -> Self {
        to_bson(&status).expect("Serialisation is infallible")
    }
}

/// Filter selecting the candidate roster for a church: approved members only.
pub fn candidate_roster_filter(church_name: &str) -> Document {
    doc! {
        "church": church_name,
        "role": Role::Member,
        "status": MemberStatus::Approved,
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    use chrono::TimeZone;

    impl Member {
        pub fn example(name: &str, profile: Document) -> Self {
            Self {
                id: Id::new(),
                member: MemberCore {
                    name: name.to_string(),
                    church: "Igreja Central".to_string(),
                    role: Role::Member,
                    status: MemberStatus::Approved,
                    joined_at: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
                    profile,
                },
            }
        }
    }
}
