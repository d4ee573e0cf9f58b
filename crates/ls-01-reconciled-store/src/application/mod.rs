//! # Application Layer
//!
//! The stores the rest of the client reads and writes.

pub mod list_store;
pub mod snapshot_store;
pub mod value_store;

pub use list_store::{ListStore, ReconciledList};
pub use snapshot_store::SnapshotStore;
pub use value_store::ValueStore;
