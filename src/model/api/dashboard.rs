use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::BallotType,
    db::{ballot::BallotAction, candidate::Candidate},
    election::tally::{CandidateTally, PositionTally},
    mongodb::Id,
};

use super::election::ElectionSummary;

/// One candidate's standing in the results of a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResult {
    pub id: Id,
    pub name: String,
    pub nominations: u64,
    pub votes: u64,
    pub percentage: f64,
}

impl From<&CandidateTally> for CandidateResult {
    fn from(tally: &CandidateTally) -> Self {
        Self {
            id: tally.member_id,
            name: tally.name.clone(),
            nominations: tally.nominations,
            votes: tally.votes,
            percentage: tally.percentage,
        }
    }
}

/// Results of one position: every candidate with activity, plus the
/// winner if anyone has votes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSummary {
    pub position: String,
    pub total_nominations: u64,
    pub winner: Option<CandidateResult>,
    pub results: Vec<CandidateResult>,
}

impl From<&PositionTally> for PositionSummary {
    fn from(tally: &PositionTally) -> Self {
        Self {
            position: tally.position.clone(),
            total_nominations: tally.total_nominations,
            winner: tally.winner().map(CandidateResult::from),
            results: tally.results.iter().map(CandidateResult::from).collect(),
        }
    }
}

/// The admin dashboard: live turnout and per-position results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub election: ElectionSummary,
    pub church_name: String,
    pub total_voters: u64,
    pub voted_voters: u64,
    pub current_position: u32,
    pub total_positions: u32,
    pub positions: Vec<PositionSummary>,
}

/// One row of the audit log, with names resolved for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallotLogEntry {
    pub voter_id: Id,
    pub voter_name: Option<String>,
    pub candidate_id: Id,
    pub candidate_name: Option<String>,
    pub position: String,
    pub action: BallotType,
    pub cast_at: DateTime<Utc>,
}

/// Raw candidate and ledger rows for one instance (debug surface).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionDump {
    pub election_id: Id,
    pub candidates: Vec<Candidate>,
    pub actions: Vec<BallotAction>,
    pub total_candidates: u64,
    pub total_actions: u64,
}
