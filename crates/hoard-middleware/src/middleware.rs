//! The storage middleware: observe every action, schedule saves for the
//! ones that qualify, and otherwise stay out of the way.
//!
//! Per action the interceptor forwards to `next` first and returns its
//! result untouched. Only afterwards is the action classified; a
//! qualifying action sends a signal to the save scheduler and nothing is
//! awaited. Dispatch order, semantics and return values are those of the
//! wrapped chain.

use std::sync::Arc;

use hoard_core::{Action, MiddlewareOptions, Result, SaveEvent};
use hoard_storage::StorageEngine;
use tokio::sync::broadcast;

use crate::classifier::ActionFilter;
use crate::executor::SaveExecutor;
use crate::scheduler::{Outstanding, SaveScheduler};
use crate::store::{Dispatcher, Middleware, StoreApi};

const EVENT_CAPACITY: usize = 64;

/// Configured storage middleware, ready to be attached to a store.
///
/// One middleware may be attached to several stores; each attachment gets
/// its own scheduler, while the event channel is shared.
pub struct StorageMiddleware {
    engine: Arc<dyn StorageEngine>,
    filter: Arc<ActionFilter>,
    options: MiddlewareOptions,
    events: broadcast::Sender<SaveEvent>,
    outstanding: Outstanding,
}

impl StorageMiddleware {
    pub fn new<E>(engine: E, filter: ActionFilter, options: MiddlewareOptions) -> Self
    where
        E: StorageEngine + 'static,
    {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            engine: Arc::new(engine),
            filter: Arc::new(filter),
            options,
            events,
            outstanding: Outstanding::new(),
        }
    }

    /// No blacklist beyond the sentinels, unrestricted whitelist, save
    /// immediately, dispatch SAVE after each save.
    pub fn with_defaults<E>(engine: E) -> Self
    where
        E: StorageEngine + 'static,
    {
        Self::new(engine, ActionFilter::default(), MiddlewareOptions::default())
    }

    pub fn options(&self) -> MiddlewareOptions {
        self.options
    }

    pub fn filter(&self) -> &ActionFilter {
        &self.filter
    }

    /// Observe save outcomes, failures included. Purely informational:
    /// whether anyone subscribes has no effect on saving.
    pub fn subscribe(&self) -> broadcast::Receiver<SaveEvent> {
        self.events.subscribe()
    }

    /// Wait until no save is pending in a debounce window or running
    /// against the engine.
    pub async fn settled(&self) {
        self.outstanding.wait_idle().await
    }

    /// Set up against a store: start the scheduler and bind the executor to
    /// the store's capabilities. Needs a tokio runtime.
    pub fn attach(&self, api: Arc<dyn StoreApi>) -> Result<Interceptor> {
        let executor = Arc::new(SaveExecutor::new(
            Arc::clone(&self.engine),
            api,
            self.options,
            self.events.clone(),
        ));
        let scheduler = SaveScheduler::spawn(
            self.options.debounce,
            self.outstanding.clone(),
            move |token| executor.spawn_cycle(token),
        )?;
        Ok(Interceptor {
            filter: Arc::clone(&self.filter),
            scheduler: Arc::new(scheduler),
        })
    }
}

impl Middleware for StorageMiddleware {
    fn apply(&self, api: Arc<dyn StoreApi>, next: Dispatcher) -> Result<Dispatcher> {
        Ok(self.attach(api)?.wrap(next))
    }
}

/// A storage middleware bound to one store.
#[derive(Clone)]
pub struct Interceptor {
    filter: Arc<ActionFilter>,
    scheduler: Arc<SaveScheduler>,
}

impl Interceptor {
    /// Handle one action: forward, then maybe schedule a save.
    pub fn intercept(&self, action: Action, next: &Dispatcher) -> serde_json::Value {
        let observed = action.clone();
        let result = next(action);

        if self.filter.accepts(&observed) {
            self.scheduler.signal();
        }
        result
    }

    pub fn wrap(self, next: Dispatcher) -> Dispatcher {
        Arc::new(move |action: Action| self.intercept(action, &next))
    }
}
