//! Action representation and the sentinel action types.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

/// Action type dispatched after persisted state has been loaded.
///
/// The literal string is shared with existing persisted-state consumers and
/// must not change.
pub const LOAD: &str = "REDUX_STORAGE_LOAD";

/// Action type dispatched after state has been saved.
pub const SAVE: &str = "REDUX_STORAGE_SAVE";

/// Name of the discriminator field every well-formed action carries.
pub const TYPE_FIELD: &str = "type";

/// A deferred action: a callable that should have been resolved by an
/// upstream middleware before reaching the storage layer.
///
/// It receives the current state and returns whatever the deferred work
/// produces.
#[derive(Clone)]
pub struct Thunk(Arc<dyn Fn(&Value) -> Value + Send + Sync>);

impl Thunk {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Run the deferred work against `state`.
    pub fn call(&self, state: &Value) -> Value {
        (self.0)(state)
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Thunk(..)")
    }
}

/// Anything that can flow through the dispatch pipeline.
///
/// Only [`Action::Object`] values carrying a `type` field are well-formed
/// actions; the other variants exist so the pipeline can observe (and
/// reject) malformed input instead of failing to type-check it away.
#[derive(Clone, Debug)]
pub enum Action {
    /// A structured record. Well-formed when it has a `type` field.
    Object(Map<String, Value>),
    /// An unresolved deferred action.
    Thunk(Thunk),
    /// Any JSON value that is not a record (string, number, array, null...).
    Scalar(Value),
}

impl Action {
    /// Build a record action with the given type and no payload.
    pub fn new(action_type: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert(TYPE_FIELD.to_string(), Value::String(action_type.into()));
        Action::Object(map)
    }

    /// Add a field to a record action. No-op for the other variants.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        if let Action::Object(map) = &mut self {
            map.insert(key.into(), value);
        }
        self
    }

    /// Wrap a deferred computation.
    pub fn thunk<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Action::Thunk(Thunk::new(f))
    }

    /// The raw `type` field, if this is a record that has one.
    pub fn type_value(&self) -> Option<&Value> {
        match self {
            Action::Object(map) => map.get(TYPE_FIELD),
            _ => None,
        }
    }

    /// The `type` field when it is a string.
    pub fn action_type(&self) -> Option<&str> {
        self.type_value().and_then(Value::as_str)
    }

    /// The record body, if any.
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Action::Object(map) => Some(map),
            _ => None,
        }
    }

    /// The `payload` field of a record action.
    pub fn payload(&self) -> Option<&Value> {
        self.as_object().and_then(|map| map.get("payload"))
    }

    /// JSON view of the action. Thunks have no JSON form and map to `Null`.
    pub fn to_value(&self) -> Value {
        match self {
            Action::Object(map) => Value::Object(map.clone()),
            Action::Thunk(_) => Value::Null,
            Action::Scalar(value) => value.clone(),
        }
    }
}

impl From<Value> for Action {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Action::Object(map),
            other => Action::Scalar(other),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Object(map) => write!(f, "{}", Value::Object(map.clone())),
            Action::Thunk(_) => f.write_str("[function]"),
            Action::Scalar(value) => write!(f, "{}", value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_sets_type() {
        let action = Action::new("ADD_TODO");
        assert_eq!(action.action_type(), Some("ADD_TODO"));
        assert!(action.payload().is_none());
    }

    #[test]
    fn test_from_value_object_and_scalar() {
        let action = Action::from(json!({"type": "A", "payload": 1}));
        assert!(matches!(action, Action::Object(_)));
        assert_eq!(action.payload(), Some(&json!(1)));

        let action = Action::from(json!("A"));
        assert!(matches!(action, Action::Scalar(_)));
        assert!(action.type_value().is_none());
    }

    #[test]
    fn test_non_string_type_is_present_but_not_a_str() {
        let action = Action::from(json!({"type": 7}));
        assert_eq!(action.type_value(), Some(&json!(7)));
        assert!(action.action_type().is_none());
    }

    #[test]
    fn test_with_ignored_for_non_records() {
        let action = Action::from(json!(3)).with("payload", json!(1));
        assert_eq!(action.to_value(), json!(3));
    }

    #[test]
    fn test_thunk_call_and_display() {
        let action = Action::thunk(|state| state.clone());
        assert_eq!(action.to_string(), "[function]");
        assert_eq!(action.to_value(), Value::Null);
        if let Action::Thunk(thunk) = action {
            assert_eq!(thunk.call(&json!({"a": 1})), json!({"a": 1}));
        }
    }

    #[test]
    fn test_sentinels_are_stable() {
        assert_eq!(LOAD, "REDUX_STORAGE_LOAD");
        assert_eq!(SAVE, "REDUX_STORAGE_SAVE");
    }
}
