//! The storage engine contract.
//!
//! Engines are opaque to the middleware: it hands them the whole state on
//! save and asks for it back on load. How the bytes are laid out is entirely
//! the engine's business.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;

/// Asynchronous persistence backend.
///
/// `save` may be called concurrently when save cycles overlap; engines are
/// responsible for their own consistency under concurrent calls.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Persist `state`. The success value carries no information.
    async fn save(&self, state: &Value) -> Result<(), StorageError>;

    /// Read back the last persisted state. Engines with nothing stored
    /// return an empty object.
    async fn load(&self) -> Result<Value, StorageError>;
}

#[async_trait]
impl<E: StorageEngine + ?Sized> StorageEngine for Arc<E> {
    async fn save(&self, state: &Value) -> Result<(), StorageError> {
        (**self).save(state).await
    }

    async fn load(&self) -> Result<Value, StorageError> {
        (**self).load().await
    }
}
