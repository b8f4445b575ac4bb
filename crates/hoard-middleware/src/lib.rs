//! Save-trigger middleware for Hoard.
//!
//! Sits in a store's dispatch pipeline, watches every action, and schedules
//! a debounced save of the whole state to a [`StorageEngine`] when an action
//! passes the blacklist/whitelist filter. Also ships a small reference
//! store, the load path, and a reducer wrapper that merges loaded state.

pub mod classifier;
pub mod executor;
pub mod loader;
pub mod middleware;
pub mod reducer;
pub mod scheduler;
pub mod store;

pub use classifier::{ActionFilter, Rejection, Whitelist};
pub use executor::SaveExecutor;
pub use loader::load;
pub use middleware::{Interceptor, StorageMiddleware};
pub use scheduler::SaveScheduler;
pub use store::{Dispatcher, Middleware, Reducer, Store, StoreApi};

pub use hoard_storage::StorageEngine;
