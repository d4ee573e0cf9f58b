//! # Top-Up Errors

use shared_types::{RemoteError, SyncError};
use thiserror::Error;

/// Why a top-up was not confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopUpError {
    /// The minter kept answering "processing".
    #[error("Top-up of block {block_index} not confirmed after {attempts} attempts")]
    Timeout {
        /// Ledger block of the transfer.
        block_index: u64,
        /// Probe invocations made.
        attempts: u32,
    },

    /// The minter refused the notification.
    #[error("Top-up of block {block_index} rejected: {source}")]
    Rejected {
        /// Ledger block of the transfer.
        block_index: u64,
        /// The minter's error.
        source: RemoteError,
    },
}

impl From<TopUpError> for SyncError {
    fn from(error: TopUpError) -> Self {
        SyncError::Fatal(error.to_string())
    }
}
