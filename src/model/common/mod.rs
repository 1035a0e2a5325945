mod criteria;
mod election;
mod profile;

pub use criteria::EligibilityCriteria;
pub use election::{BallotType, ConfigState, ElectionPhase, ElectionState};
pub use profile::{AuxiliaryProfile, Classification, Engagement, Regularity};
