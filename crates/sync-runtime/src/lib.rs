//! # Sync Runtime
//!
//! Executable wiring of the ledger sync client. Everything shared is built
//! once into an explicit [`SyncContext`] and handed to the [`SyncRuntime`];
//! there are no process-wide singletons.
//!
//! ## Flow
//!
//! ```text
//! SyncConfig ──▶ SyncContext::build
//!                  ├── WorkerSupervisor ── contexts ── SyncTask per kind
//!                  │        │                              │
//!                  │        │◀────── WorkerEvent ──────────┘
//!                  │        ▼
//!                  ├── bind_store ──▶ LedgerState ◀──▶ SnapshotStore
//!                  └── TopUpConfirmation ──▶ CyclesMinter
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! sync-runtime/
//! ├── adapters/     # SimulatedLedger, SnapshotBackend
//! ├── container/    # SyncConfig, SyncContext
//! ├── wiring/       # LedgerState, bind_store
//! ├── runtime.rs    # SyncRuntime
//! ├── errors.rs     # RuntimeError
//! └── main.rs       # ledger-sync binary
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod container;
pub mod errors;
pub mod runtime;
pub mod wiring;

// Re-exports
pub use adapters::{
    CertifiedReply, SimulatedLedger, SimulatedLedgerConfig, SnapshotBackend, TRANSFER_FEE_E8S,
};
pub use container::{SyncConfig, SyncContext, TaskIntervals};
pub use errors::RuntimeError;
pub use runtime::{StoreSummary, SyncRuntime};
pub use wiring::{bind_store, LedgerState, StopRequests, StoreUpdate};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
