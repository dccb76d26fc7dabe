//! Storyforge Storage Layer
//!
//! Implements the `RecordStore` trait from `storyforge-domain`.
//!
//! # Backends
//!
//! - `SqliteStore`: persistent storage, one row per record with the field map as JSON
//! - `MemoryStore`: in-process map, with failure injection for tests
//!
//! Both serialize access internally, so a single instance can be shared as
//! `Arc<S>` by concurrent writers.
//!
//! # Examples
//!
//! ```no_run
//! use storyforge_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for record operations
//! ```

#![warn(missing_docs)]

mod codec;
pub mod memory;
pub mod sqlite;

use thiserror::Error;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The store refused the write
    #[error("Write rejected: {0}")]
    Rejected(String),

    /// Internal lock was poisoned by a panicking writer
    #[error("Store lock poisoned")]
    Poisoned,
}
