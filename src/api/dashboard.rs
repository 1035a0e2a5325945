use std::collections::{HashMap, HashSet};

use mongodb::{bson::doc, options::FindOptions};
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::error::Result;
use crate::model::{
    api::{
        dashboard::{BallotLogEntry, DashboardResponse, ElectionDump, PositionSummary},
        election::ElectionSummary,
    },
    db::{
        ballot::{self, BallotAction},
        candidate::Candidate,
        config::ElectionConfig,
        election::Election,
        member::Member,
    },
    election::tally::tally_position,
    mongodb::{Coll, Id},
};

use super::common::{active_election_for_config, config_by_id, member_names};

pub fn routes() -> Vec<Route> {
    routes![dashboard, vote_log, dump]
}

/// Live results for a config's active election. Everything is recomputed
/// from the ledger on every call; nothing is cached.
#[get("/elections/dashboard/<config_id>")]
async fn dashboard(
    config_id: Id,
    configs: Coll<ElectionConfig>,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    ballots: Coll<BallotAction>,
) -> Result<Json<DashboardResponse>> {
    let config = config_by_id(&configs, config_id).await?;
    let election = active_election_for_config(&elections, config_id).await?;

    let rows = ballot::rows_for_election(&ballots, election.id).await?;
    let names: HashMap<Id, String> = candidates
        .find(doc! { "election_id": election.id }, None)
        .await?
        .map_ok(|candidate| (candidate.member_id, candidate.candidate.name))
        .try_collect()
        .await?;

    let positions: Vec<PositionSummary> = config
        .positions
        .iter()
        .map(|position| PositionSummary::from(&tally_position(position, &rows, &names)))
        .collect();

    Ok(Json(DashboardResponse {
        election: ElectionSummary::from(&election),
        church_name: config.config.church_name.clone(),
        total_voters: config.voters.len() as u64,
        voted_voters: ballot::turnout(&ballots, election.id).await?,
        current_position: election.current_position,
        total_positions: config.positions.len() as u32,
        positions,
    }))
}

/// The full audit log of an instance, newest first, with names resolved.
#[get("/elections/vote-log/<election_id>")]
async fn vote_log(
    election_id: Id,
    ballots: Coll<BallotAction>,
    members: Coll<Member>,
) -> Result<Json<Vec<BallotLogEntry>>> {
    let options = FindOptions::builder().sort(doc! { "cast_at": -1 }).build();
    let rows: Vec<BallotAction> = ballots
        .find(doc! { "election_id": election_id }, options)
        .await?
        .try_collect()
        .await?;

    let ids: HashSet<Id> = rows
        .iter()
        .flat_map(|row| [row.voter_id, row.candidate_id])
        .collect();
    let names = member_names(&members, ids).await?;

    let entries = rows
        .into_iter()
        .map(|row| BallotLogEntry {
            voter_id: row.voter_id,
            voter_name: names.get(&row.voter_id).cloned(),
            candidate_id: row.candidate_id,
            candidate_name: names.get(&row.candidate_id).cloned(),
            position: row.position,
            action: row.action,
            cast_at: row.cast_at,
        })
        .collect();
    Ok(Json(entries))
}

/// Raw candidate and ledger rows for an instance (debug surface).
#[get("/elections/debug/<election_id>")]
async fn dump(
    election_id: Id,
    candidates: Coll<Candidate>,
    ballots: Coll<BallotAction>,
) -> Result<Json<ElectionDump>> {
    let filter = doc! { "election_id": election_id };
    let sort = FindOptions::builder()
        .sort(doc! { "position": 1, "name": 1 })
        .build();

    let candidate_rows: Vec<Candidate> = candidates
        .find(filter.clone(), sort)
        .await?
        .try_collect()
        .await?;
    let action_rows = ballot::rows_for_election(&ballots, election_id).await?;

    Ok(Json(ElectionDump {
        election_id,
        total_candidates: candidate_rows.len() as u64,
        total_actions: action_rows.len() as u64,
        candidates: candidate_rows,
        actions: action_rows,
    }))
}
