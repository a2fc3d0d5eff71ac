//! GraphGen Storage Layer
//!
//! Implements the `GraphStore` trait consumed by the merge stage.
//!
//! # Architecture
//!
//! - `MemoryGraphStore`: hash maps behind an async lock, for tests and
//!   one-shot runs
//! - `SqliteGraphStore`: SQLite tables keyed by entity name and by ordered
//!   pair, for persistent output
//!
//! Both stores treat `upsert_*` as a full replacement of the stored value.
//!
//! # Examples
//!
//! ```no_run
//! use graphgen_store::SqliteGraphStore;
//!
//! let store = SqliteGraphStore::new("graph.db").unwrap();
//! // Store is now ready for merge operations
//! ```

#![warn(missing_docs)]

mod memory;
mod sqlite;

use thiserror::Error;

pub use memory::MemoryGraphStore;
pub use sqlite::SqliteGraphStore;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A lock guarding the connection was poisoned by a panicking writer
    #[error("Store lock poisoned: {0}")]
    Lock(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}
