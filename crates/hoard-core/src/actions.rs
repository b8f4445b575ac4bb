//! Constructors for the two sentinel actions.

use serde_json::Value;

use crate::types::{Action, LOAD, SAVE};

/// Action announcing that `state` was loaded from the storage engine.
pub fn load(state: Value) -> Action {
    Action::new(LOAD).with("payload", state)
}

/// Action announcing that `state` was persisted to the storage engine.
pub fn save(state: Value) -> Action {
    Action::new(SAVE).with("payload", state)
}
