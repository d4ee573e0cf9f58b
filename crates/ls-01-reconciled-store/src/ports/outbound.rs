//! # Outbound Ports (Driven Ports)
//!
//! The persistence contract the snapshot layer needs from the host.
//!
//! Production: `JsonFileKeyValueStore` (adapters/json_file.rs)
//! Testing: `InMemoryKeyValueStore` (below)

use crate::domain::StoreError;
use std::collections::BTreeMap;

/// Abstract keyed get/set storage.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Put a single key-value pair.
    fn put(&mut self, key: &str, value: String) -> Result<(), StoreError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&mut self, key: &str) -> Result<(), StoreError>;

    /// All pairs whose key starts with `prefix`, in key order.
    fn prefix_scan(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// In-memory key-value store for unit tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKeyValueStore {
    data: BTreeMap<String, String>,
    /// Should writes fail?
    pub should_fail: bool,
}

impl InMemoryKeyValueStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.should_fail {
            return Err(StoreError::Io {
                message: "simulated failure".to_string(),
            });
        }
        Ok(())
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.check()?;
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.check()?;
        self.data.remove(key);
        Ok(())
    }

    fn prefix_scan(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError> {
        Ok(self
            .data
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
