//! In-process storage engine.
//!
//! Keeps the last saved state plus the full save history in memory. Useful
//! for tests and for hosts that only need persistence across store rebuilds
//! within one process. Can be switched into a failing mode and given an
//! artificial latency to exercise error and overlap paths.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::engine::StorageEngine;
use crate::error::StorageError;

#[derive(Debug, Default)]
pub struct MemoryEngine {
    stored: Mutex<Option<Value>>,
    history: Mutex<Vec<Value>>,
    failing: AtomicBool,
    latency: Mutex<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `state` already persisted.
    pub fn with_state(state: Value) -> Self {
        let engine = Self::default();
        *lock(&engine.stored) = Some(state);
        engine
    }

    /// Make every subsequent `save` and `load` fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay each `save` by `latency` before it completes.
    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.latency) = latency;
    }

    /// Number of `save` calls that reached the engine, successful or not.
    pub fn save_count(&self) -> usize {
        lock(&self.history).len()
    }

    /// Every state handed to `save`, in call order.
    pub fn saves(&self) -> Vec<Value> {
        lock(&self.history).clone()
    }

    /// The last successfully persisted state.
    pub fn stored(&self) -> Option<Value> {
        lock(&self.stored).clone()
    }

    /// Highest number of `save` calls observed running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageEngine for MemoryEngine {
    async fn save(&self, state: &Value) -> Result<(), StorageError> {
        lock(&self.history).push(state.clone());

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);

        let latency = *lock(&self.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "memory engine is failing".to_string(),
            ));
        }
        *lock(&self.stored) = Some(state.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Value, StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "memory engine is failing".to_string(),
            ));
        }
        Ok(lock(&self.stored)
            .clone()
            .unwrap_or_else(|| Value::Object(Map::new())))
    }
}
