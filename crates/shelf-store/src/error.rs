//! Store error types.

use std::time::Duration;

use shelf_core::ShelfError;
use thiserror::Error;

/// Errors that can occur when reading or writing the store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Record an update targets does not exist.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Record a create targets already exists.
    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    /// Failed to serialize or deserialize a record.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend failure.
    #[error("Store operation failed: {0}")]
    Backend(String),

    /// Concurrent modification detected.
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    /// Operation exceeded its time budget.
    #[error("{op} timed out after {limit:?}")]
    Timeout { op: &'static str, limit: Duration },

    /// Failed to load or save a snapshot file.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] std::io::Error),
}

impl From<StoreError> for ShelfError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(key) => ShelfError::NotFound(key),
            other => ShelfError::Store(other.to_string()),
        }
    }
}
