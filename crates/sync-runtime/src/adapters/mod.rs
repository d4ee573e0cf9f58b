//! # Adapters
//!
//! - simulated_ledger: ledger, minter and registration service in-process
//! - snapshot_backend: file or memory storage for snapshots

pub mod simulated_ledger;
pub mod snapshot_backend;

pub use simulated_ledger::{CertifiedReply, SimulatedLedger, SimulatedLedgerConfig, TRANSFER_FEE_E8S};
pub use snapshot_backend::SnapshotBackend;
