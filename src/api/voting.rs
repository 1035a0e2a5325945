use std::collections::HashMap;

use mongodb::{bson::doc, options::FindOptions, Client};
use rocket::{futures::TryStreamExt, serde::json::Json, Route, State};

use crate::error::{Error, Result};
use crate::model::{
    api::{
        election::ElectionSummary,
        voting::{ActiveElectionResponse, BallotCandidate, BallotSpec, VotingView},
    },
    auth::MemberIdentity,
    common::{BallotType, ElectionPhase, ElectionState},
    db::{
        ballot::{self, BallotAction},
        candidate::Candidate,
        config::ElectionConfig,
        election::Election,
        member::Member,
    },
    mongodb::{Coll, Id},
};

use super::common::{
    active_election_for_config, config_by_id, current_position_name, latest_election_for_config,
    member_names, newest_first,
};

pub fn routes() -> Vec<Route> {
    routes![active_election, voting_view, submit]
}

/// The active election this voter is entitled to participate in.
#[get("/elections/active")]
async fn active_election(
    member: MemberIdentity,
    elections: Coll<Election>,
    configs: Coll<ElectionConfig>,
) -> Result<Json<ActiveElectionResponse>> {
    let options = FindOptions::builder().sort(newest_first()).build();
    let active: Vec<Election> = elections
        .find(doc! { "state": ElectionState::Active }, options)
        .await?
        .try_collect()
        .await?;

    // At most one instance is active system-wide, but walk them all in
    // case a deployment predates that invariant.
    for election in &active {
        let config = configs.find_one(election.config_id.as_doc(), None).await?;
        if let Some(config) = config {
            if config.voters.contains(&member.id) {
                return Ok(Json(ActiveElectionResponse {
                    election: ElectionSummary::from(election),
                    church_name: config.config.church_name,
                    positions: config.config.positions,
                }));
            }
        }
    }
    Err(Error::NotFound(format!(
        "No active election for voter {}",
        member.id
    )))
}

/// The voter's ballot for the current position, plus their own progress.
#[get("/elections/voting/<config_id>")]
async fn voting_view(
    member: MemberIdentity,
    config_id: Id,
    configs: Coll<ElectionConfig>,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    ballots: Coll<BallotAction>,
    members: Coll<Member>,
) -> Result<Json<VotingView>> {
    let config = config_by_id(&configs, config_id).await?;
    let election = active_election_for_config(&elections, config_id).await?;
    let position = current_position_name(&config, &election)?;

    // The frozen pool for this position, which doubles as the name lookup.
    let pool: Vec<Candidate> = candidates
        .find(
            doc! { "election_id": election.id, "position": &position },
            None,
        )
        .await?
        .try_collect()
        .await?;
    let pool_names: HashMap<Id, String> = pool
        .iter()
        .map(|candidate| (candidate.member_id, candidate.name.clone()))
        .collect();

    let ballot_candidates = match election.current_phase {
        // Nomination phase: every eligible candidate is on the ballot.
        ElectionPhase::Nomination => {
            let mut list: Vec<BallotCandidate> = pool
                .iter()
                .map(|candidate| BallotCandidate {
                    id: candidate.member_id,
                    name: candidate.name.clone(),
                    nominations: 0,
                })
                .collect();
            list.sort_by(|a, b| a.name.cmp(&b.name));
            list
        }
        // Voting phase: only candidates someone nominated.
        ElectionPhase::Voting => {
            let nominations =
                ballot::nominations_for_position(&ballots, election.id, &position).await?;
            let mut counts: HashMap<Id, u64> = HashMap::new();
            for row in &nominations {
                *counts.entry(row.candidate_id).or_default() += 1;
            }
            let names =
                resolve_names(&pool_names, counts.keys().copied(), &members).await?;
            let mut list: Vec<BallotCandidate> = counts
                .into_iter()
                .map(|(id, nominations)| BallotCandidate {
                    id,
                    name: names.get(&id).cloned().unwrap_or_else(|| id.to_string()),
                    nominations,
                })
                .collect();
            list.sort_by(|a, b| a.name.cmp(&b.name));
            list
        }
    };

    // The voter's own progress for this position.
    let own_rows =
        ballot::rows_for_voter_position(&ballots, election.id, member.id, &position).await?;
    let voted_candidate = own_rows
        .iter()
        .find(|row| row.action == BallotType::Vote)
        .map(|row| row.candidate_id);
    let nomination_count = own_rows
        .iter()
        .filter(|row| row.action == BallotType::Nomination)
        .count() as u64;
    let voted_candidate_name = match voted_candidate {
        Some(id) => resolve_names(&pool_names, [id], &members)
            .await?
            .remove(&id)
            .or_else(|| Some(id.to_string())),
        None => None,
    };

    let max_nominations = config.max_nominations_per_voter;
    Ok(Json(VotingView {
        election: ElectionSummary::from(&election),
        current_position: election.current_position,
        total_positions: config.positions.len() as u32,
        position_name: position,
        phase: election.current_phase,
        candidates: ballot_candidates,
        has_voted: voted_candidate.is_some(),
        voted_candidate_name,
        nomination_count,
        max_nominations,
        has_reached_nomination_limit: nomination_count >= max_nominations as u64,
    }))
}

/// Submit a choice for the current position. Whether it lands as a
/// nomination or a vote depends on the phase the instance is in at write
/// time, not on anything the client sent.
#[post("/elections/vote", data = "<spec>", format = "json")]
async fn submit(
    member: MemberIdentity,
    spec: Json<BallotSpec>,
    configs: Coll<ElectionConfig>,
    elections: Coll<Election>,
    ballots: Coll<BallotAction>,
    db_client: &State<Client>,
) -> Result<()> {
    let config = config_by_id(&configs, spec.config_id).await?;
    let election = latest_election_for_config(&elections, spec.config_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("No election for config {}", spec.config_id)))?;
    if election.state != ElectionState::Active {
        return Err(Error::ElectionInactive(format!(
            "Election {} has been completed",
            election.id
        )));
    }
    let position = current_position_name(&config, &election)?;

    let action = BallotType::from(election.current_phase);
    let row = BallotAction::new(election.id, member.id, &position, spec.candidate_id, action);
    ballot::record(db_client, &ballots, row, config.max_nominations_per_voter).await?;

    info!(
        "Recorded {action:?} by voter {} for position '{position}' in election {}",
        member.id, election.id
    );
    Ok(())
}

/// Look up names for ids, preferring the frozen snapshot and falling back
/// to the roster for ids outside it.
async fn resolve_names(
    pool_names: &HashMap<Id, String>,
    ids: impl IntoIterator<Item = Id>,
    members: &Coll<Member>,
) -> Result<HashMap<Id, String>> {
    let mut names = HashMap::new();
    let mut missing = Vec::new();
    for id in ids {
        match pool_names.get(&id) {
            Some(name) => {
                names.insert(id, name.clone());
            }
            None => missing.push(id),
        }
    }
    if !missing.is_empty() {
        names.extend(member_names(members, missing).await?);
    }
    Ok(names)
}
