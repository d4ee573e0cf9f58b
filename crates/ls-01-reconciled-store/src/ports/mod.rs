//! # Ports Module
//!
//! Outbound port for snapshot persistence.

pub mod outbound;

pub use outbound::{InMemoryKeyValueStore, KeyValueStore};
