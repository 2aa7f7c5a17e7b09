//! Durable key-value store
//!
//! A tiny transactional store holding the serialized watch list. The
//! `KvStore` trait is what the watch-list manager depends on; `SqliteStore`
//! is the on-disk implementation.

mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by the durable store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database file or its directory could not be prepared
    #[error("Failed to open store: {0}")]
    Open(String),

    /// The database engine rejected an operation
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The blocking worker running the operation did not finish
    #[error("Store task failed: {0}")]
    Task(String),

    /// A previous operation panicked while holding the connection
    #[error("Store connection lock poisoned")]
    Poisoned,
}

/// Transactional get/put of opaque values by key
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Reads the value stored under `key` in a read-only transaction
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replaces the value stored under `key` in a read-write transaction
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}
