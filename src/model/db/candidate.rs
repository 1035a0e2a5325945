use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core candidate data: one eligible member for one position of one
/// election instance.
///
/// Rows are written once when the election starts and never updated; later
/// roster or profile changes do not alter the pool. Counts are not stored
/// here — tallies are always derived from the ballot ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateCore {
    pub election_id: Id,
    pub position: String,
    pub member_id: Id,
    pub name: String,
    // Derived attributes, frozen at election start for the admin UI.
    pub tithing_recurring: bool,
    pub offering_recurring: bool,
    pub attendance_percent: u32,
    pub months_in_church: u32,
}

/// A candidate without an ID.
pub type NewCandidate = CandidateCore;

/// A candidate from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}
