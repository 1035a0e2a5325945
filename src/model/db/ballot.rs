use chrono::{DateTime, Utc};
use mongodb::{
    bson::{doc, serde_helpers::chrono_datetime_as_bson_datetime},
    Client,
};
use rocket::futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    common::BallotType,
    mongodb::{is_duplicate_key_error, Coll, Id},
};

/// One append-only row of the ballot ledger: a single nomination or vote.
///
/// Rows are never updated. They are only ever deleted by an admin's
/// reset-voting (votes of one position), a config cascade delete, or the
/// full cleanup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallotAction {
    #[serde(rename = "_id")]
    pub id: Id,
    pub election_id: Id,
    pub voter_id: Id,
    pub position: String,
    pub candidate_id: Id,
    pub action: BallotType,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub cast_at: DateTime<Utc>,
}

impl BallotAction {
    pub fn new(
        election_id: Id,
        voter_id: Id,
        position: &str,
        candidate_id: Id,
        action: BallotType,
    ) -> Self {
        Self {
            id: Id::new(),
            election_id,
            voter_id,
            position: position.to_string(),
            candidate_id,
            action,
            cast_at: Utc::now(),
        }
    }
}

/// Decide whether a new action is admissible given the voter's prior rows
/// for the same election and position.
///
/// Invariants enforced:
/// - at most one vote per (election, voter, position);
/// - nominations per (election, voter, position) never exceed the cap;
/// - a voter may not nominate the same candidate twice for one position.
pub fn admit(
    candidate_id: Id,
    action: BallotType,
    prior: &[BallotAction],
    max_nominations: u32,
) -> Result<()> {
    match action {
        BallotType::Vote => {
            if prior.iter().any(|row| row.action == BallotType::Vote) {
                return Err(Error::AlreadyActed(
                    "Voter has already voted for this position".to_string(),
                ));
            }
        }
        BallotType::Nomination => {
            let nominations = prior
                .iter()
                .filter(|row| row.action == BallotType::Nomination)
                .collect::<Vec<_>>();
            if nominations
                .iter()
                .any(|row| row.candidate_id == candidate_id)
            {
                return Err(Error::AlreadyActed(
                    "Voter has already nominated this candidate for this position".to_string(),
                ));
            }
            if nominations.len() >= max_nominations as usize {
                return Err(Error::LimitReached(format!(
                    "Voter has reached the limit of {max_nominations} nomination(s) for this position"
                )));
            }
        }
    }
    Ok(())
}

/// Atomically check-and-insert a ledger row.
///
/// The admission check and the insert run inside one transaction, so two
/// in-flight submissions from the same voter cannot both pass the check.
/// The unique ballot index catches exact duplicates as a second line of
/// defence if the transaction is downgraded.
pub async fn record(
    db_client: &Client,
    ballots: &Coll<BallotAction>,
    new_row: BallotAction,
    max_nominations: u32,
) -> Result<()> {
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    // The voter's prior actions for this position, both types.
    let filter = doc! {
        "election_id": new_row.election_id,
        "voter_id": new_row.voter_id,
        "position": &new_row.position,
    };
    let mut cursor = ballots
        .find_with_session(filter, None, &mut session)
        .await?;
    let prior: Vec<BallotAction> = cursor.stream(&mut session).try_collect().await?;

    // Dropping the session without committing aborts the transaction.
    admit(new_row.candidate_id, new_row.action, &prior, max_nominations)?;

    ballots
        .insert_one_with_session(&new_row, None, &mut session)
        .await
        .map_err(|err| {
            if is_duplicate_key_error(&err) {
                Error::AlreadyActed("Duplicate ballot action".to_string())
            } else {
                Error::Db(err)
            }
        })?;

    session.commit_transaction().await?;
    Ok(())
}

/// Turnout: the number of distinct voters with at least one vote anywhere
/// in the given election instance.
pub async fn turnout(ballots: &Coll<BallotAction>, election_id: Id) -> Result<u64> {
    let filter = doc! {
        "election_id": election_id,
        "action": BallotType::Vote,
    };
    let voters = ballots.distinct("voter_id", filter, None).await?;
    Ok(voters.len() as u64)
}

/// All ledger rows for one election instance.
pub async fn rows_for_election(
    ballots: &Coll<BallotAction>,
    election_id: Id,
) -> Result<Vec<BallotAction>> {
    let filter = doc! { "election_id": election_id };
    let rows = ballots.find(filter, None).await?.try_collect().await?;
    Ok(rows)
}

/// One voter's rows for one position of one election instance.
pub async fn rows_for_voter_position(
    ballots: &Coll<BallotAction>,
    election_id: Id,
    voter_id: Id,
    position: &str,
) -> Result<Vec<BallotAction>> {
    let filter = doc! {
        "election_id": election_id,
        "voter_id": voter_id,
        "position": position,
    };
    let rows = ballots.find(filter, None).await?.try_collect().await?;
    Ok(rows)
}

/// All nomination rows for one position of one election instance.
pub async fn nominations_for_position(
    ballots: &Coll<BallotAction>,
    election_id: Id,
    position: &str,
) -> Result<Vec<BallotAction>> {
    let filter = doc! {
        "election_id": election_id,
        "position": position,
        "action": BallotType::Nomination,
    };
    let rows = ballots.find(filter, None).await?.try_collect().await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(voter: Id, candidate: Id, action: BallotType) -> BallotAction {
        BallotAction::new(Id::new(), voter, "Elder", candidate, action)
    }

    #[test]
    fn first_action_is_admitted() {
        assert!(admit(Id::new(), BallotType::Nomination, &[], 1).is_ok());
        assert!(admit(Id::new(), BallotType::Vote, &[], 1).is_ok());
    }

    #[test]
    fn nomination_cap_is_enforced() {
        let voter = Id::new();
        let prior = vec![row(voter, Id::new(), BallotType::Nomination)];

        // Cap of 1: a second nomination of a different candidate is rejected.
        let result = admit(Id::new(), BallotType::Nomination, &prior, 1);
        assert!(matches!(result, Err(Error::LimitReached(_))));

        // Cap of 2: the same submission is admitted.
        assert!(admit(Id::new(), BallotType::Nomination, &prior, 2).is_ok());
    }

    #[test]
    fn duplicate_candidate_nomination_is_rejected_under_cap() {
        let voter = Id::new();
        let candidate = Id::new();
        let prior = vec![row(voter, candidate, BallotType::Nomination)];

        // Even with room left under the cap, the same candidate twice is a
        // duplicate, not a limit problem.
        let result = admit(candidate, BallotType::Nomination, &prior, 3);
        assert!(matches!(result, Err(Error::AlreadyActed(_))));
    }

    #[test]
    fn second_vote_is_rejected() {
        let voter = Id::new();
        let prior = vec![row(voter, Id::new(), BallotType::Vote)];

        let result = admit(Id::new(), BallotType::Vote, &prior, 1);
        assert!(matches!(result, Err(Error::AlreadyActed(_))));

        // Voting for the same candidate again is equally rejected.
        let result = admit(prior[0].candidate_id, BallotType::Vote, &prior, 1);
        assert!(matches!(result, Err(Error::AlreadyActed(_))));
    }

    #[test]
    fn votes_do_not_count_against_the_nomination_cap() {
        let voter = Id::new();
        let prior = vec![row(voter, Id::new(), BallotType::Vote)];
        assert!(admit(Id::new(), BallotType::Nomination, &prior, 1).is_ok());
    }

    #[test]
    fn vote_admitted_after_votes_cleared() {
        // After reset-voting deletes the vote rows, only nominations remain
        // and a fresh vote is admissible again.
        let voter = Id::new();
        let prior = vec![row(voter, Id::new(), BallotType::Nomination)];
        assert!(admit(Id::new(), BallotType::Vote, &prior, 1).is_ok());
    }
}
