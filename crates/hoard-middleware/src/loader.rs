//! Hydrates a store from its storage engine.

use hoard_core::{actions, Result};
use hoard_storage::StorageEngine;
use serde_json::Value;

use crate::store::StoreApi;

/// Read persisted state from `engine` and dispatch it as a LOAD action.
///
/// Returns the loaded state. Unlike saving, loading reports engine errors:
/// the caller decides whether to start from an empty store.
pub async fn load(engine: &dyn StorageEngine, api: &dyn StoreApi) -> Result<Value> {
    let state = engine.load().await?;
    api.dispatch(actions::load(state.clone()));
    tracing::debug!("Persisted state loaded");
    Ok(state)
}
