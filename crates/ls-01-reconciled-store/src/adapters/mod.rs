//! # Adapters
//!
//! Persistence backends for the snapshot port.

pub mod json_file;

pub use json_file::JsonFileKeyValueStore;
