//! Engine decorator that persists only selected top-level state keys.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::engine::StorageEngine;
use crate::error::StorageError;

/// Wraps an engine and strips state keys before saving.
///
/// An empty whitelist keeps every key; the blacklist is applied afterwards.
/// Non-object states are passed through untouched. Loading is delegated
/// as-is.
pub struct FilterEngine<E> {
    inner: E,
    whitelist: Vec<String>,
    blacklist: Vec<String>,
}

impl<E: StorageEngine> FilterEngine<E> {
    pub fn new(inner: E, whitelist: Vec<String>, blacklist: Vec<String>) -> Self {
        Self {
            inner,
            whitelist,
            blacklist,
        }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    fn keep(&self, key: &str) -> bool {
        let listed = self.whitelist.is_empty() || self.whitelist.iter().any(|k| k == key);
        listed && !self.blacklist.iter().any(|k| k == key)
    }

    fn filter(&self, state: &Value) -> Value {
        match state {
            Value::Object(map) => Value::Object(
                map.iter()
                    .filter(|(key, _)| self.keep(key))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect::<Map<String, Value>>(),
            ),
            other => other.clone(),
        }
    }
}

#[async_trait]
impl<E: StorageEngine> StorageEngine for FilterEngine<E> {
    async fn save(&self, state: &Value) -> Result<(), StorageError> {
        self.inner.save(&self.filter(state)).await
    }

    async fn load(&self) -> Result<Value, StorageError> {
        self.inner.load().await
    }
}
