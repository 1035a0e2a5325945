use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};

/// States in the election instance lifecycle.
///
/// There is at most one `Active` instance across the whole system;
/// starting a new one completes every other active instance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElectionState {
    Active,
    Completed,
}

/// States in the election config lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigState {
    /// Under construction; not yet started.
    Draft,
    /// Has a running instance.
    Active,
    /// Its instance has finished. Retained for audit until deleted.
    Completed,
}

/// The two sub-stages each position goes through.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElectionPhase {
    Nomination,
    Voting,
}

/// The kind of a ballot action. Derived from the instance's current phase
/// at write time, never from the client.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BallotType {
    Nomination,
    Vote,
}

impl From<ElectionPhase> for BallotType {
    fn from(phase: ElectionPhase) -> Self {
        match phase {
            ElectionPhase::Nomination => BallotType::Nomination,
            ElectionPhase::Voting => BallotType::Vote,
        }
    }
}

// Bson conversions so these enums can appear in filter documents.

impl From<ElectionState> for Bson {
    fn from(state: ElectionState) -> Self {
        to_bson(&state).expect("Serialisation is infallible")
    }
}

impl From<ConfigState> for Bson {
    fn from(state: ConfigState) -> Self {
        to_bson(&state).expect("Serialisation is infallible")
    }
}

impl From<ElectionPhase> for Bson {
    fn from(phase: ElectionPhase) -> Self {
        to_bson(&phase).expect("Serialisation is infallible")
    }
}

impl From<BallotType> for Bson {
    fn from(action: BallotType) -> Self {
        to_bson(&action).expect("Serialisation is infallible")
    }
}
