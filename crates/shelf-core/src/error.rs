//! Shelf error types.

use thiserror::Error;

/// Errors that can occur while selecting, recording or analyzing variants.
#[derive(Error, Debug)]
pub enum ShelfError {
    /// Selection was asked to pick from a slot with nothing active.
    ///
    /// Callers render their fallback content for the slot.
    #[error("No active variants for slot {0}")]
    NoActiveVariants(String),

    /// A record that an update targets does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed event, seed or configuration payload.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage failure (I/O, timeout, serialization).
    #[error("Store error: {0}")]
    Store(String),
}

impl ShelfError {
    /// Whether the error came from bad input rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ShelfError::Validation(_))
    }
}

impl From<serde_json::Error> for ShelfError {
    fn from(e: serde_json::Error) -> Self {
        ShelfError::Validation(e.to_string())
    }
}
