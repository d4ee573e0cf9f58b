//! # Domain Errors
//!
//! Error types for the reconciled store and its persistence port.

use thiserror::Error;

/// Reconciled store error types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error in the persistence backend.
    #[error("Store I/O error: {message}")]
    Io {
        /// Details.
        message: String,
    },

    /// Persisted data could not be read back.
    #[error("Store corruption: {message}")]
    Corruption {
        /// Details.
        message: String,
    },

    /// A value could not be encoded or decoded.
    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A snapshot key is not of the form `<resourceKind>:<entityId>`.
    #[error("Invalid snapshot key: {0}")]
    InvalidKey(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io {
            message: err.to_string(),
        }
    }
}
