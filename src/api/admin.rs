use chrono::Utc;
use mongodb::{bson::doc, options::FindOptions, Client};
use rocket::{futures::TryStreamExt, serde::json::Json, Route, State};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    api::{
        config::{ElectionConfigDescription, ElectionConfigSpec},
        election::{
            AdvancePhaseRequest, AdvancePositionRequest, ApproveAllMembersResponse,
            ElectionSummary, MaxNominationsRequest, ResetVotingRequest, ResetVotingResponse,
            StartElectionRequest, StartElectionResponse,
        },
    },
    auth::AdminIdentity,
    common::{BallotType, ConfigState, ElectionPhase, ElectionState},
    db::{
        ballot::BallotAction,
        candidate::{Candidate, NewCandidate},
        config::{ElectionConfig, NewElectionConfig},
        election::{Election, ElectionCore},
        member::{candidate_roster_filter, Member, MemberStatus},
    },
    election::eligibility::snapshot_candidates,
    mongodb::{Coll, Id},
};

use super::common::{
    active_election_for_config, config_by_id, current_position_name, latest_config,
    latest_election_for_config, newest_first,
};

pub fn routes() -> Vec<Route> {
    routes![
        create_config,
        get_config,
        get_config_by_id,
        list_configs,
        delete_config,
        start_election,
        advance_phase,
        advance_position,
        reset_voting,
        set_max_nominations,
        approve_all_members,
        cleanup,
    ]
}

#[post("/elections/config", data = "<spec>", format = "json")]
async fn create_config(
    _admin: AdminIdentity,
    spec: Json<ElectionConfigSpec>,
    new_configs: Coll<NewElectionConfig>,
    configs: Coll<ElectionConfig>,
) -> Result<Json<ElectionConfigDescription>> {
    if spec.max_nominations_per_voter == 0 {
        return Err(Error::InvalidConfiguration(
            "Nomination cap must be at least 1".to_string(),
        ));
    }

    let config: NewElectionConfig = spec.0.into();
    let new_id: Id = new_configs
        .insert_one(&config, None)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB.
        .into();

    let config = configs
        .find_one(new_id.as_doc(), None)
        .await?
        .unwrap(); // Just inserted.
    info!("Created election config {new_id}");
    Ok(Json(ElectionConfigDescription::new(config, None)))
}

/// Fetch a config by query parameter, or the most recent one without.
#[get("/elections/config?<id>")]
async fn get_config(
    id: Option<Id>,
    configs: Coll<ElectionConfig>,
    elections: Coll<Election>,
) -> Result<Json<ElectionConfigDescription>> {
    let config = match id {
        Some(id) => config_by_id(&configs, id).await?,
        None => latest_config(&configs).await?,
    };
    describe_config(config, &elections).await.map(Json)
}

#[get("/elections/config/<config_id>")]
async fn get_config_by_id(
    config_id: Id,
    configs: Coll<ElectionConfig>,
    elections: Coll<Election>,
) -> Result<Json<ElectionConfigDescription>> {
    let config = config_by_id(&configs, config_id).await?;
    describe_config(config, &elections).await.map(Json)
}

#[get("/elections/configs")]
async fn list_configs(
    configs: Coll<ElectionConfig>,
    elections: Coll<Election>,
) -> Result<Json<Vec<ElectionConfigDescription>>> {
    let options = FindOptions::builder().sort(newest_first()).build();
    let all: Vec<ElectionConfig> = configs.find(None, options).await?.try_collect().await?;

    let mut descriptions = Vec::with_capacity(all.len());
    for config in all {
        descriptions.push(describe_config(config, &elections).await?);
    }
    Ok(Json(descriptions))
}

/// Delete a config and everything started from it: instances, candidate
/// snapshots, and ballot rows.
#[delete("/elections/config/<config_id>")]
async fn delete_config(
    admin: AdminIdentity,
    config_id: Id,
    configs: Coll<ElectionConfig>,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    ballots: Coll<BallotAction>,
    db_client: &State<Client>,
) -> Result<()> {
    // Check existence up front for a distinguishable 404.
    config_by_id(&configs, config_id).await?;

    let election_ids: Vec<Id> = elections
        .find(doc! { "config_id": config_id }, None)
        .await?
        .map_ok(|election| election.id)
        .try_collect()
        .await?;

    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    if !election_ids.is_empty() {
        let by_election = doc! { "election_id": { "$in": election_ids.clone() } };
        ballots
            .delete_many_with_session(by_election.clone(), None, &mut session)
            .await?;
        candidates
            .delete_many_with_session(by_election, None, &mut session)
            .await?;
        elections
            .delete_many_with_session(doc! { "config_id": config_id }, None, &mut session)
            .await?;
    }
    configs
        .delete_one_with_session(config_id.as_doc(), None, &mut session)
        .await?;

    session.commit_transaction().await?;
    info!(
        "Admin {} deleted config {config_id} and {} instance(s)",
        admin.id,
        election_ids.len()
    );
    Ok(())
}

/// Start an election from the given config (or the most recent one).
///
/// Any other active instance anywhere in the system is completed inside
/// the same transaction that creates the new one, so at most one active
/// instance can exist at any time.
#[post("/elections/start", data = "<request>", format = "json")]
async fn start_election(
    admin: AdminIdentity,
    request: Json<StartElectionRequest>,
    configs: Coll<ElectionConfig>,
    elections: Coll<Election>,
    new_candidates: Coll<NewCandidate>,
    members: Coll<Member>,
    db_client: &State<Client>,
) -> Result<Json<StartElectionResponse>> {
    let config = match request.config_id {
        Some(id) => config_by_id(&configs, id).await?,
        None => latest_config(&configs).await?,
    };
    if config.positions.is_empty() {
        return Err(Error::InvalidConfiguration(
            "Config has no positions to elect".to_string(),
        ));
    }

    // Evaluate the candidate pool once, against the roster as it stands
    // right now. The snapshot is frozen for the instance's lifetime.
    let roster: Vec<Member> = members
        .find(candidate_roster_filter(&config.church_name), None)
        .await?
        .try_collect()
        .await?;

    let election = Election {
        id: Id::new(),
        election: ElectionCore::new(config.id),
    };
    let snapshot = snapshot_candidates(
        election.id,
        &config.positions,
        &roster,
        &config.criteria,
        Utc::now(),
    );

    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    // Complete every other active instance (and mark its config done).
    elections
        .update_many_with_session(
            doc! { "state": ElectionState::Active },
            doc! { "$set": { "state": ElectionState::Completed } },
            None,
            &mut session,
        )
        .await?;
    configs
        .update_many_with_session(
            doc! { "state": ConfigState::Active },
            doc! { "$set": { "state": ConfigState::Completed } },
            None,
            &mut session,
        )
        .await?;

    elections
        .insert_one_with_session(&election, None, &mut session)
        .await?;
    if !snapshot.is_empty() {
        new_candidates
            .insert_many_with_session(&snapshot, None, &mut session)
            .await?;
    }
    configs
        .update_one_with_session(
            config.id.as_doc(),
            doc! { "$set": { "state": ConfigState::Active } },
            None,
            &mut session,
        )
        .await?;

    session.commit_transaction().await?;

    info!(
        "Admin {} started election {} for config {} with {} candidate row(s)",
        admin.id,
        election.id,
        config.id,
        snapshot.len()
    );
    Ok(Json(StartElectionResponse {
        election_id: election.id,
        candidates: snapshot.len() as u64,
    }))
}

/// Set the instance's phase. Deliberately unguarded: the admin may move
/// voting back to nomination or re-enter a phase.
#[post("/elections/advance-phase", data = "<request>", format = "json")]
async fn advance_phase(
    admin: AdminIdentity,
    request: Json<AdvancePhaseRequest>,
    elections: Coll<Election>,
) -> Result<Json<ElectionSummary>> {
    let mut election = active_election_for_config(&elections, request.config_id).await?;
    elections
        .update_one(
            election.id.as_doc(),
            doc! { "$set": { "current_phase": request.phase } },
            None,
        )
        .await?;
    election.current_phase = request.phase;

    info!(
        "Admin {} set election {} phase to {:?}",
        admin.id, election.id, request.phase
    );
    Ok(Json(ElectionSummary::from(&election)))
}

/// Jump to a position index and restart it at the nomination phase.
/// The index is not bounds-checked; reads reject an out-of-range value.
#[post("/elections/advance-position", data = "<request>", format = "json")]
async fn advance_position(
    admin: AdminIdentity,
    request: Json<AdvancePositionRequest>,
    elections: Coll<Election>,
) -> Result<Json<ElectionSummary>> {
    let mut election = active_election_for_config(&elections, request.config_id).await?;
    elections
        .update_one(
            election.id.as_doc(),
            doc! { "$set": {
                "current_position": request.position,
                "current_phase": ElectionPhase::Nomination,
            } },
            None,
        )
        .await?;
    election.current_position = request.position;
    election.current_phase = ElectionPhase::Nomination;

    info!(
        "Admin {} moved election {} to position {}",
        admin.id, election.id, request.position
    );
    Ok(Json(ElectionSummary::from(&election)))
}

/// Re-run the current position's voting: delete its vote rows (keeping
/// all nominations) and force the phase to voting.
#[post("/elections/reset-voting", data = "<request>", format = "json")]
async fn reset_voting(
    admin: AdminIdentity,
    request: Json<ResetVotingRequest>,
    configs: Coll<ElectionConfig>,
    elections: Coll<Election>,
    ballots: Coll<BallotAction>,
    db_client: &State<Client>,
) -> Result<Json<ResetVotingResponse>> {
    let config = config_by_id(&configs, request.config_id).await?;
    let election = active_election_for_config(&elections, request.config_id).await?;
    let position = current_position_name(&config, &election)?;

    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    let deleted = ballots
        .delete_many_with_session(
            doc! {
                "election_id": election.id,
                "position": &position,
                "action": BallotType::Vote,
            },
            None,
            &mut session,
        )
        .await?
        .deleted_count;
    elections
        .update_one_with_session(
            election.id.as_doc(),
            doc! { "$set": { "current_phase": ElectionPhase::Voting } },
            None,
            &mut session,
        )
        .await?;

    session.commit_transaction().await?;

    info!(
        "Admin {} reset voting for '{position}' on election {} ({deleted} vote(s) removed)",
        admin.id, election.id
    );
    Ok(Json(ResetVotingResponse {
        position,
        current_phase: ElectionPhase::Voting,
    }))
}

#[post("/elections/set-max-nominations", data = "<request>", format = "json")]
async fn set_max_nominations(
    admin: AdminIdentity,
    request: Json<MaxNominationsRequest>,
    configs: Coll<ElectionConfig>,
) -> Result<()> {
    if request.max_nominations == 0 {
        return Err(Error::InvalidConfiguration(
            "Nomination cap must be at least 1".to_string(),
        ));
    }

    let result = configs
        .update_one(
            request.config_id.as_doc(),
            doc! { "$set": { "max_nominations_per_voter": request.max_nominations } },
            None,
        )
        .await?;
    if result.matched_count == 0 {
        return Err(Error::NotFound(format!(
            "Election config {}",
            request.config_id
        )));
    }

    info!(
        "Admin {} set nomination cap to {} on config {}",
        admin.id, request.max_nominations, request.config_id
    );
    Ok(())
}

/// Approve every member in the system, in one statement.
/// Not election-specific, but exposed through the same admin surface.
#[post("/elections/approve-all-members")]
async fn approve_all_members(
    admin: AdminIdentity,
    members: Coll<Member>,
) -> Result<Json<ApproveAllMembersResponse>> {
    members
        .update_many(
            doc! { "status": { "$ne": MemberStatus::Approved } },
            doc! { "$set": { "status": MemberStatus::Approved } },
            None,
        )
        .await?;

    let approved = members
        .count_documents(doc! { "status": MemberStatus::Approved }, None)
        .await?;
    info!("Admin {} approved all members ({approved} now approved)", admin.id);
    Ok(Json(ApproveAllMembersResponse { approved }))
}

/// Irreversibly wipe all election data. For test and reset use only;
/// refused unless the deployment enables it.
#[post("/elections/cleanup")]
async fn cleanup(
    admin: AdminIdentity,
    app_config: &State<Config>,
    configs: Coll<ElectionConfig>,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    ballots: Coll<BallotAction>,
    db_client: &State<Client>,
) -> Result<()> {
    if !app_config.allow_cleanup() {
        return Err(Error::Forbidden(
            "Cleanup is disabled on this deployment".to_string(),
        ));
    }

    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;
    ballots
        .delete_many_with_session(doc! {}, None, &mut session)
        .await?;
    candidates
        .delete_many_with_session(doc! {}, None, &mut session)
        .await?;
    elections
        .delete_many_with_session(doc! {}, None, &mut session)
        .await?;
    configs
        .delete_many_with_session(doc! {}, None, &mut session)
        .await?;
    session.commit_transaction().await?;

    warn!("Admin {} wiped all election data", admin.id);
    Ok(())
}

/// Describe a config together with the state of its most recent instance.
async fn describe_config(
    config: ElectionConfig,
    elections: &Coll<Election>,
) -> Result<ElectionConfigDescription> {
    let latest = latest_election_for_config(elections, config.id).await?;
    Ok(ElectionConfigDescription::new(
        config,
        latest.map(|election| election.state),
    ))
}
