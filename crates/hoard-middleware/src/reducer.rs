//! Reducer wrapper that folds loaded state into the store on LOAD.

use std::sync::Arc;

use hoard_core::LOAD;
use serde_json::{Map, Value};

use crate::store::Reducer;

/// Combines the current state with freshly loaded state.
pub type Merger = fn(&Value, &Value) -> Value;

/// Wrap `inner` so that a LOAD action first merges its payload into the
/// state with `merger`. The inner reducer then sees the merged state and
/// the LOAD action as usual.
pub fn persisted(inner: Reducer, merger: Merger) -> Reducer {
    Arc::new(move |state: &Value, action: &Map<String, Value>| {
        let is_load = action.get("type").and_then(Value::as_str) == Some(LOAD);
        match action.get("payload") {
            Some(loaded) if is_load => inner(&merger(state, loaded), action),
            _ => inner(state, action),
        }
    })
}

/// Top-level keys of `loaded` replace those of `old`. When only `old` is an
/// object, or `loaded` is null, `old` is kept; otherwise `loaded` wins.
pub fn merge_shallow(old: &Value, loaded: &Value) -> Value {
    match (old, loaded) {
        (Value::Object(old_map), Value::Object(loaded_map)) => {
            let mut merged = old_map.clone();
            for (key, value) in loaded_map {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        (Value::Object(_), _) => old.clone(),
        (_, Value::Null) => old.clone(),
        _ => loaded.clone(),
    }
}

/// Like [`merge_shallow`], but where both sides hold an object under the
/// same key those two objects are merged shallowly as well.
pub fn merge_tree(old: &Value, loaded: &Value) -> Value {
    match (old, loaded) {
        (Value::Object(old_map), Value::Object(loaded_map)) => {
            let mut merged = old_map.clone();
            for (key, value) in loaded_map {
                let next = match merged.get(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge_shallow(existing, value)
                    }
                    _ => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        _ => merge_shallow(old, loaded),
    }
}
