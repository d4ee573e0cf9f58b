//! # Supervisor Errors

use serde::{Deserialize, Serialize};
use shared_bus::{CodecError, ContextId};
use shared_types::{ConfigError, RemoteError};
use thiserror::Error;

/// Errors of the worker supervisor.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A context could not be spawned.
    #[error("Failed to spawn {context}: {message}")]
    Spawn {
        /// Context that failed.
        context: ContextId,
        /// Underlying error.
        message: String,
    },

    /// A context no longer accepts commands.
    #[error("{0} is gone")]
    ContextGone(ContextId),

    /// A wire message could not be decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A context panicked while shutting down.
    #[error("{0} panicked")]
    Panicked(ContextId),
}

/// Error shape of the custom-domain registration interface, as sent on the
/// wire inside `{"Err": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationError {
    /// No registration exists for the domain.
    NotFound,
    /// The domain name is malformed.
    InvalidDomain(String),
    /// Too many requests; try later.
    RateLimited,
    /// Service-side failure.
    Internal(String),
}

impl From<RegistrationError> for RemoteError {
    fn from(error: RegistrationError) -> Self {
        match error {
            RegistrationError::NotFound => RemoteError::NotFound("registration".to_string()),
            RegistrationError::InvalidDomain(domain) => {
                RemoteError::Rejected(format!("invalid domain {domain}"))
            }
            RegistrationError::RateLimited => RemoteError::Transport("rate limited".to_string()),
            RegistrationError::Internal(message) => RemoteError::Rejected(message),
        }
    }
}
