//! Hoard storage crate - the engine contract the middleware persists
//! through, plus in-memory and JSON-file engines and a key-filter decorator.

pub mod engine;
pub mod error;
pub mod file;
pub mod filter;
pub mod memory;

pub use engine::StorageEngine;
pub use error::StorageError;
pub use file::JsonFileEngine;
pub use filter::FilterEngine;
pub use memory::MemoryEngine;
