use std::ops::Deref;

use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::model::db::{
    ballot::BallotAction,
    candidate::{Candidate, NewCandidate},
    config::{ElectionConfig, NewElectionConfig},
    election::{Election, NewElection},
    member::Member,
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromRequest<'r> for Coll<T>
where
    T: MongoCollection,
{
    type Error = ();

    /// Get the database connection from the managed state and wrap it in a collection.
    ///
    /// Panics iff the [`Database`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = req.guard::<&State<Database>>().await.unwrap();
        request::Outcome::Success(Coll::from_db(db))
    }
}

// Member collection.
// The wider app owns this data; the election engine only reads it, apart
// from the bulk-approval utility.
const MEMBERS: &str = "members";
impl MongoCollection for Member {
    const NAME: &'static str = MEMBERS;
}

// Election config collection.
const CONFIGS: &str = "election_configs";
impl MongoCollection for ElectionConfig {
    const NAME: &'static str = CONFIGS;
}
impl MongoCollection for NewElectionConfig {
    const NAME: &'static str = CONFIGS;
}

// Election instance collection.
const ELECTIONS: &str = "elections";
impl MongoCollection for Election {
    const NAME: &'static str = ELECTIONS;
}
impl MongoCollection for NewElection {
    const NAME: &'static str = ELECTIONS;
}

// Candidate snapshot collection.
const CANDIDATES: &str = "election_candidates";
impl MongoCollection for Candidate {
    const NAME: &'static str = CANDIDATES;
}
impl MongoCollection for NewCandidate {
    const NAME: &'static str = CANDIDATES;
}

// Ballot action collection.
const BALLOTS: &str = "election_ballots";
impl MongoCollection for BallotAction {
    const NAME: &'static str = BALLOTS;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // Ballot collection: a voter may not record the same action for the
    // same candidate twice. This is the write-race backstop behind the
    // transactional admission checks.
    let ballot_index = IndexModel::builder()
        .keys(doc! {"election_id": 1, "voter_id": 1, "position": 1, "candidate_id": 1, "action": 1})
        .options(unique.clone())
        .build();
    Coll::<BallotAction>::from_db(db)
        .create_index(ballot_index, None)
        .await?;

    // Candidate snapshot collection: one row per member per position.
    let candidate_index = IndexModel::builder()
        .keys(doc! {"election_id": 1, "position": 1, "member_id": 1})
        .options(unique)
        .build();
    Coll::<Candidate>::from_db(db)
        .create_index(candidate_index, None)
        .await?;

    Ok(())
}
