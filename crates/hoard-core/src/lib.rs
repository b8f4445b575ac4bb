//! Core types shared across the Hoard crates: actions, sentinel action
//! types, configuration, save-cycle events and the top-level error type.

pub mod actions;
pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::{HoardConfig, MiddlewareOptions};
pub use error::{HoardError, Result};
pub use events::SaveEvent;
pub use types::{Action, Thunk, LOAD, SAVE};
