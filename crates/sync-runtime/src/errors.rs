//! # Runtime Errors

use ls_01_reconciled_store::StoreError;
use ls_03_confirmation_poller::TopUpError;
use ls_05_worker_supervisor::SupervisorError;
use shared_types::ConfigError;
use thiserror::Error;

/// Failures of the runtime wiring.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Snapshot storage failed.
    #[error("Snapshot store: {0}")]
    Store(#[from] StoreError),

    /// The worker supervisor failed.
    #[error("Supervisor: {0}")]
    Supervisor(#[from] SupervisorError),

    /// A top-up was not confirmed.
    #[error("Top-up: {0}")]
    TopUp(#[from] TopUpError),
}
