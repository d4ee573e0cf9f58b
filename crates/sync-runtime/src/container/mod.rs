//! # Sync Container
//!
//! Configuration and the explicit [`SyncContext`] registry, built once at
//! startup and handed to the runtime.

pub mod config;
pub mod context;

pub use config::{SyncConfig, TaskIntervals};
pub use context::SyncContext;
