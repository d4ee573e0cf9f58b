//! # Event Wiring
//!
//! Connects the worker supervisor's demultiplexed events to the reconciled
//! store.
//!
//! ```text
//! contexts ──events──▶ WorkerSupervisor ──per kind──▶ bind_store ──▶ LedgerState
//! ```

pub mod store_binding;

pub use store_binding::{bind_store, LedgerState, StopRequests, StoreUpdate};
