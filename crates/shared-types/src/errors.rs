//! # Error Types
//!
//! Error taxonomy shared by every sync subsystem.
//!
//! | Category | Meaning |
//! |----------|---------|
//! | `TransientRead` | One read branch failed; the next tick retries. |
//! | `VerifiedRead` | The verified branch failed; the trustworthy path is broken. |
//! | `Processing` | The remote says "not ready yet"; always retried. |
//! | `Fatal` | Terminal; stops the poller or task and is surfaced upward. |

use crate::trust::ReadChannel;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a single remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RemoteError {
    /// The call never reached the remote or the reply was lost.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote rejected the call.
    #[error("Call rejected: {0}")]
    Rejected(String),

    /// A verified reply failed its certificate check.
    #[error("Certificate check failed: {0}")]
    Certificate(String),

    /// The remote is still processing a previously submitted operation.
    #[error("Operation still processing")]
    Processing,

    /// The requested entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl RemoteError {
    /// Whether the remote asked us to come back later.
    #[must_use]
    pub fn is_processing(&self) -> bool {
        matches!(self, Self::Processing)
    }
}

/// Errors surfaced by the sync core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// One read branch failed; not fatal.
    #[error("Transient read failure on {channel} channel: {source}")]
    TransientRead {
        /// Channel that failed.
        channel: ReadChannel,
        /// Underlying remote error.
        source: RemoteError,
    },

    /// The verified branch failed.
    #[error("Verified read failed: {0}")]
    VerifiedRead(RemoteError),

    /// The remote signalled "not ready yet".
    #[error("Remote operation still processing")]
    Processing,

    /// Terminal failure.
    #[error("Fatal: {0}")]
    Fatal(String),
}

impl SyncError {
    /// Classify a failed read by the channel it happened on.
    #[must_use]
    pub fn from_read(channel: ReadChannel, source: RemoteError) -> Self {
        match channel {
            ReadChannel::Verified => Self::VerifiedRead(source),
            ReadChannel::Unverified => Self::TransientRead { channel, source },
        }
    }

    /// Category of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TransientRead { .. } => ErrorCategory::TransientRead,
            Self::VerifiedRead(_) => ErrorCategory::VerifiedRead,
            Self::Processing => ErrorCategory::Processing,
            Self::Fatal(_) => ErrorCategory::Fatal,
        }
    }

    /// Whether the error came from the verified channel.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::VerifiedRead(_))
    }
}

/// Serialisable category of a [`SyncError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// See [`SyncError::TransientRead`].
    TransientRead,
    /// See [`SyncError::VerifiedRead`].
    VerifiedRead,
    /// See [`SyncError::Processing`].
    Processing,
    /// See [`SyncError::Fatal`].
    Fatal,
}

/// Error as it crosses the worker boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Error category.
    pub category: ErrorCategory,
    /// Human readable message.
    pub message: String,
    /// `true` when the failing branch was the verified one.
    pub verified: bool,
    /// `true` when the task stopped because of this error.
    pub terminal: bool,
}

impl ErrorEnvelope {
    /// Wrap an error; `terminal` marks an auto-stopped task.
    #[must_use]
    pub fn new(error: &SyncError, terminal: bool) -> Self {
        Self {
            category: error.category(),
            message: error.to_string(),
            verified: error.is_verified(),
            terminal,
        }
    }
}

impl From<&SyncError> for ErrorEnvelope {
    fn from(error: &SyncError) -> Self {
        Self::new(error, false)
    }
}

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A field failed validation.
    #[error("Invalid config field `{field}`: {reason}")]
    Invalid {
        /// Field name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// An environment variable could not be parsed.
    #[error("Cannot parse {var}={value}")]
    Env {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },
}
