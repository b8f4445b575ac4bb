//! Runs one save cycle against the storage engine.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hoard_core::{actions, Action, MiddlewareOptions, SaveEvent};
use hoard_storage::StorageEngine;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::scheduler::CycleToken;
use crate::store::StoreApi;

/// Reads the current state at fire time, persists it, and optionally
/// dispatches the SAVE action.
///
/// Engine failures are swallowed: nothing is retried, returned or logged.
/// The only trace of a failure is a [`SaveEvent::Failed`] on the
/// observation channel, which nobody has to listen to.
pub struct SaveExecutor {
    engine: Arc<dyn StorageEngine>,
    api: Arc<dyn StoreApi>,
    options: MiddlewareOptions,
    events: broadcast::Sender<SaveEvent>,
    cycles: AtomicU64,
}

impl SaveExecutor {
    pub fn new(
        engine: Arc<dyn StorageEngine>,
        api: Arc<dyn StoreApi>,
        options: MiddlewareOptions,
        events: broadcast::Sender<SaveEvent>,
    ) -> Self {
        Self {
            engine,
            api,
            options,
            events,
            cycles: AtomicU64::new(0),
        }
    }

    /// Take the state snapshot now, then persist it on its own task so the
    /// debounce loop is never held up by the engine. Overlapping cycles are
    /// allowed.
    pub fn spawn_cycle(self: &Arc<Self>, token: CycleToken) {
        let pending = self.snapshot();
        let executor = Arc::clone(self);
        tokio::spawn(async move {
            executor.persist(pending).await;
            drop(token);
        });
    }

    /// Snapshot and persist in one go.
    pub async fn run_cycle(&self) -> SaveEvent {
        let pending = self.snapshot();
        self.persist(pending).await
    }

    fn snapshot(&self) -> PendingSave {
        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        let state = self.api.get_state();
        let action = actions::save(state.clone());
        tracing::debug!(cycle, "Save cycle started");
        PendingSave {
            cycle,
            state,
            action,
        }
    }

    async fn persist(&self, pending: PendingSave) -> SaveEvent {
        let PendingSave {
            cycle,
            state,
            action,
        } = pending;

        let event = match self.engine.save(&state).await {
            Ok(()) => {
                let dispatched = !self.options.disable_dispatch_save_action;
                if dispatched {
                    self.api.dispatch(action);
                }
                tracing::debug!(cycle, dispatched, "State persisted");
                SaveEvent::saved(cycle, dispatched)
            }
            Err(e) => SaveEvent::failed(cycle, e.to_string()),
        };

        let _ = self.events.send(event.clone());
        event
    }
}

/// State read when a window closed, with the SAVE action built from it.
struct PendingSave {
    cycle: u64,
    state: Value,
    action: Action,
}
