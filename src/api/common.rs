use std::collections::HashMap;

use mongodb::{
    bson::{doc, Bson},
    options::{FindOneOptions, FindOptions},
};
use rocket::futures::TryStreamExt;

use crate::error::{Error, Result};
use crate::model::{
    common::ElectionState,
    db::{config::ElectionConfig, election::Election, member::Member},
    mongodb::{Coll, Id},
};

/// Newest-first sort on creation time.
pub fn newest_first() -> mongodb::bson::Document {
    doc! { "created_at": -1 }
}

pub async fn config_by_id(configs: &Coll<ElectionConfig>, id: Id) -> Result<ElectionConfig> {
    configs
        .find_one(id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Election config {id}")))
}

/// The most recently created config.
pub async fn latest_config(configs: &Coll<ElectionConfig>) -> Result<ElectionConfig> {
    let options = FindOneOptions::builder().sort(newest_first()).build();
    configs
        .find_one(None, options)
        .await?
        .ok_or_else(|| Error::NotFound("No election config exists".to_string()))
}

/// The active instance of the given config, if there is one.
pub async fn active_election_for_config(
    elections: &Coll<Election>,
    config_id: Id,
) -> Result<Election> {
    let filter = doc! {
        "config_id": config_id,
        "state": ElectionState::Active,
    };
    let options = FindOneOptions::builder().sort(newest_first()).build();
    elections
        .find_one(filter, options)
        .await?
        .ok_or_else(|| Error::NotFound(format!("No active election for config {config_id}")))
}

/// The most recent instance of the given config in any state.
pub async fn latest_election_for_config(
    elections: &Coll<Election>,
    config_id: Id,
) -> Result<Option<Election>> {
    let filter = doc! { "config_id": config_id };
    let options = FindOneOptions::builder().sort(newest_first()).build();
    Ok(elections.find_one(filter, options).await?)
}

/// The name of the instance's current position.
///
/// Admin position transitions are unguarded, so the stored index can be
/// out of range; surface that as a config problem rather than panicking.
pub fn current_position_name(config: &ElectionConfig, election: &Election) -> Result<String> {
    config
        .position_name(election.current_position)
        .map(str::to_string)
        .ok_or_else(|| {
            Error::InvalidConfiguration(format!(
                "Current position {} is out of range ({} configured)",
                election.current_position,
                config.positions.len()
            ))
        })
}

/// Resolve display names for the given member ids in one query.
pub async fn member_names(
    members: &Coll<Member>,
    ids: impl IntoIterator<Item = Id>,
) -> Result<HashMap<Id, String>> {
    let ids: Vec<Bson> = ids.into_iter().map(Bson::from).collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let filter = doc! { "_id": { "$in": ids } };
    let names = members
        .find(filter, FindOptions::default())
        .await?
        .map_ok(|member| (member.id, member.member.name))
        .try_collect()
        .await?;
    Ok(names)
}
