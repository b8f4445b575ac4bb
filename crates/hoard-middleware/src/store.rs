//! Minimal host store: a reducer, a state cell, and a middleware chain.
//!
//! Dispatch is synchronous. Middlewares are applied so that the first one
//! in the list sees each action first; the innermost handler runs the
//! reducer and returns the action as JSON.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, Weak};

use hoard_core::{Action, Result};
use serde_json::{Map, Value};

/// A handler in the dispatch chain.
pub type Dispatcher = Arc<dyn Fn(Action) -> Value + Send + Sync>;

/// Pure state transition for record actions.
pub type Reducer = Arc<dyn Fn(&Value, &Map<String, Value>) -> Value + Send + Sync>;

/// Capabilities a store hands to each middleware at setup.
pub trait StoreApi: Send + Sync {
    /// Snapshot of the current state.
    fn get_state(&self) -> Value;

    /// Dispatch through the full chain, including the calling middleware.
    fn dispatch(&self, action: Action) -> Value;
}

/// Dispatch interceptor installed into a [`Store`].
pub trait Middleware: Send + Sync {
    /// Wrap `next`, returning the handler that receives each action.
    fn apply(&self, api: Arc<dyn StoreApi>, next: Dispatcher) -> Result<Dispatcher>;
}

struct StoreInner {
    state: Mutex<Value>,
    reducer: Reducer,
    dispatch: OnceLock<Dispatcher>,
}

impl StoreInner {
    fn new(reducer: Reducer, initial: Value) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(initial),
            reducer,
            dispatch: OnceLock::new(),
        })
    }

    fn state(&self) -> MutexGuard<'_, Value> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn dispatch(&self, action: Action) -> Value {
        match self.dispatch.get() {
            Some(dispatch) => dispatch(action),
            None => {
                tracing::warn!("Dispatch while the middleware chain is being built; action dropped");
                Value::Null
            }
        }
    }
}

/// Weak handle given to middlewares, so the chain does not keep the store
/// alive.
struct StoreHandle(Weak<StoreInner>);

impl StoreApi for StoreHandle {
    fn get_state(&self) -> Value {
        self.0
            .upgrade()
            .map(|inner| inner.state().clone())
            .unwrap_or(Value::Null)
    }

    fn dispatch(&self, action: Action) -> Value {
        match self.0.upgrade() {
            Some(inner) => inner.dispatch(action),
            None => Value::Null,
        }
    }
}

pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// A store without middleware.
    pub fn new(reducer: Reducer, initial: Value) -> Self {
        let inner = StoreInner::new(reducer, initial);
        let _ = inner.dispatch.set(base_dispatcher(&inner));
        Self { inner }
    }

    /// A store whose dispatch runs through `middlewares`, outermost first.
    pub fn with_middleware(
        reducer: Reducer,
        initial: Value,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) -> Result<Self> {
        let inner = StoreInner::new(reducer, initial);

        let mut chain = base_dispatcher(&inner);
        for middleware in middlewares.iter().rev() {
            let api: Arc<dyn StoreApi> = Arc::new(StoreHandle(Arc::downgrade(&inner)));
            chain = middleware.apply(api, chain)?;
        }

        let _ = inner.dispatch.set(chain);
        Ok(Self { inner })
    }

    pub fn dispatch(&self, action: Action) -> Value {
        self.inner.dispatch(action)
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> Value {
        self.inner.state().clone()
    }

    /// A handle exposing this store's capabilities, as given to middlewares.
    pub fn api(&self) -> Arc<dyn StoreApi> {
        Arc::new(StoreHandle(Arc::downgrade(&self.inner)))
    }
}

fn base_dispatcher(inner: &Arc<StoreInner>) -> Dispatcher {
    let weak = Arc::downgrade(inner);
    Arc::new(move |action: Action| match weak.upgrade() {
        Some(inner) => reduce(&inner, action),
        None => Value::Null,
    })
}

fn reduce(inner: &StoreInner, action: Action) -> Value {
    match action {
        Action::Object(map) => {
            let mut state = inner.state();
            let next = (inner.reducer)(&*state, &map);
            *state = next;
            Value::Object(map)
        }
        Action::Thunk(thunk) => {
            let state = inner.state();
            thunk.call(&*state)
        }
        other => {
            tracing::debug!(action = %other, "Non-record action reached the reducer; ignored");
            other.to_value()
        }
    }
}

/// Wrap a closure as a [`Reducer`].
pub fn reducer<F>(f: F) -> Reducer
where
    F: Fn(&Value, &Map<String, Value>) -> Value + Send + Sync + 'static,
{
    Arc::new(f)
}
