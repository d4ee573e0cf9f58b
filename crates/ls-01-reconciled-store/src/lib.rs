//! # LS-01 Reconciled Store
//!
//! Client-side cache that merges deliveries from the verified and unverified
//! read channels without ever letting trustworthy data regress.
//!
//! **Subsystem ID:** 1
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Merge Rules
//!
//! | Operation | Effect |
//! |-----------|--------|
//! | `set` | Unconditional replace of a single value |
//! | `apply` | Guarded replace: unverified never buries a newer verified write |
//! | `prepend` | Newest batch ahead of existing items; newest wins by id |
//! | `append` | Older batch after existing items; nothing removed |
//! | `clean_up` | Remove the given ids |
//! | `reconcile_verified` | Verified batch wins; unverified items it disproves are removed |
//! | `reset` | Clear all state |
//!
//! ## Module Structure
//!
//! ```text
//! ls-01-reconciled-store/
//! ├── domain/          # StoredValue, ListEntry, Identified, snapshot layout, errors
//! ├── algorithms/      # Pure list merge rules
//! ├── application/     # ValueStore, ListStore, SnapshotStore
//! ├── ports/           # KeyValueStore (outbound) + in-memory mock
//! └── adapters/        # JSON file backend
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::JsonFileKeyValueStore;
pub use algorithms::MergeStats;
pub use application::{ListStore, ReconciledList, SnapshotStore, ValueStore};
pub use domain::{
    now_ms, ApplyOutcome, Identified, ListEntry, SnapshotKey, SnapshotRecord, StoreError,
    StoredValue,
};
pub use ports::{InMemoryKeyValueStore, KeyValueStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
