//! # Snapshot Backend
//!
//! Picks the snapshot storage at startup: a JSON file when a path is
//! configured, memory otherwise.

use ls_01_reconciled_store::{
    InMemoryKeyValueStore, JsonFileKeyValueStore, KeyValueStore, StoreError,
};
use std::path::PathBuf;

/// Storage behind the runtime's snapshots.
pub enum SnapshotBackend {
    /// Lost on exit.
    Memory(InMemoryKeyValueStore),
    /// Persisted to a JSON file.
    File(JsonFileKeyValueStore),
}

impl SnapshotBackend {
    /// Open the file at `path`, or fall back to memory.
    pub fn open(path: Option<PathBuf>) -> Result<Self, StoreError> {
        match path {
            Some(path) => Ok(Self::File(JsonFileKeyValueStore::open(path)?)),
            None => Ok(Self::Memory(InMemoryKeyValueStore::new())),
        }
    }

    /// Whether state survives a restart.
    #[must_use]
    pub fn is_durable(&self) -> bool {
        matches!(self, Self::File(_))
    }
}

impl KeyValueStore for SnapshotBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self {
            Self::Memory(store) => store.get(key),
            Self::File(store) => store.get(key),
        }
    }

    fn put(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.put(key, value),
            Self::File(store) => store.put(key, value),
        }
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.delete(key),
            Self::File(store) => store.delete(key),
        }
    }

    fn prefix_scan(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError> {
        match self {
            Self::Memory(store) => store.prefix_scan(prefix),
            Self::File(store) => store.prefix_scan(prefix),
        }
    }
}
