//! # Snapshot Store
//!
//! Typed persistence of store entries over a [`KeyValueStore`].

use crate::application::{ListStore, ValueStore};
use crate::domain::{Identified, SnapshotKey, SnapshotRecord, StoreError};
use crate::ports::KeyValueStore;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{EntityId, TaskKind, TrustedValue};
use tracing::{debug, warn};

/// Snapshot persistence, shared between the store binding and startup.
pub struct SnapshotStore<S> {
    backend: Mutex<S>,
}

impl<S: KeyValueStore> SnapshotStore<S> {
    /// Wrap a backend.
    pub fn new(backend: S) -> Self {
        Self {
            backend: Mutex::new(backend),
        }
    }

    /// Persist one record.
    pub fn save<T: Serialize>(
        &self,
        key: &SnapshotKey,
        record: &SnapshotRecord<T>,
    ) -> Result<(), StoreError> {
        let raw = serde_json::to_string(record)?;
        self.backend.lock().put(&key.to_string(), raw)
    }

    /// Load one record.
    pub fn load<T: DeserializeOwned>(
        &self,
        key: &SnapshotKey,
    ) -> Result<Option<SnapshotRecord<T>>, StoreError> {
        match self.backend.lock().get(&key.to_string())? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Delete one record.
    pub fn remove(&self, key: &SnapshotKey) -> Result<(), StoreError> {
        self.backend.lock().delete(&key.to_string())
    }

    /// Every record of `kind`. Undecodable records are skipped with a warning.
    pub fn load_kind<T: DeserializeOwned>(
        &self,
        kind: TaskKind,
    ) -> Result<Vec<(EntityId, SnapshotRecord<T>)>, StoreError> {
        let pairs = self.backend.lock().prefix_scan(&SnapshotKey::prefix(kind))?;
        let mut records = Vec::with_capacity(pairs.len());
        for (raw_key, raw) in pairs {
            let decoded = SnapshotKey::parse(&raw_key)
                .and_then(|key| Ok((key.entity, serde_json::from_str(&raw)?)));
            match decoded {
                Ok(record) => records.push(record),
                Err(e) => warn!(key = %raw_key, error = %e, "[ls-01] Skipping unreadable snapshot"),
            }
        }
        Ok(records)
    }

    /// Seed `store` with every persisted value of `kind`. Returns how many
    /// entries were hydrated.
    pub fn hydrate_values<T: DeserializeOwned>(
        &self,
        kind: TaskKind,
        store: &ValueStore<T>,
    ) -> Result<usize, StoreError> {
        let mut hydrated = 0;
        for (entity, record) in self.load_kind::<T>(kind)? {
            let updated_at_ms = record.updated_at_ms;
            if store.hydrate(entity, record.into_trusted(), updated_at_ms) {
                hydrated += 1;
            }
        }
        debug!(kind = %kind, hydrated, "[ls-01] Values hydrated");
        Ok(hydrated)
    }

    /// Persist every entry of `store` under `kind`.
    pub fn persist_values<T: Serialize + Clone>(
        &self,
        kind: TaskKind,
        store: &ValueStore<T>,
    ) -> Result<usize, StoreError> {
        let entries = store.snapshot();
        let count = entries.len();
        for (entity, entry) in entries {
            let record = SnapshotRecord::from_trusted(entry.value, entry.updated_at_ms);
            self.save(&SnapshotKey::new(kind, entity), &record)?;
        }
        Ok(count)
    }

    /// Seed `store` with every persisted list of `kind`.
    pub fn hydrate_lists<T: Identified + DeserializeOwned>(
        &self,
        kind: TaskKind,
        store: &ListStore<T>,
    ) -> Result<usize, StoreError> {
        let mut hydrated = 0;
        for (entity, record) in self.load_kind::<Vec<TrustedValue<T>>>(kind)? {
            if store.hydrate(entity, record.data) {
                hydrated += 1;
            }
        }
        debug!(kind = %kind, hydrated, "[ls-01] Lists hydrated");
        Ok(hydrated)
    }

    /// Persist every list of `store` under `kind`. A list is recorded as
    /// verified only when all its items are.
    pub fn persist_lists<T: Identified + Serialize + Clone>(
        &self,
        kind: TaskKind,
        store: &ListStore<T>,
        updated_at_ms: u64,
    ) -> Result<usize, StoreError> {
        let ids = store.ids();
        let count = ids.len();
        for entity in ids {
            let items = store.get(&entity);
            let record = SnapshotRecord {
                verified: items.iter().all(|item| item.verified),
                data: items,
                updated_at_ms,
            };
            self.save(&SnapshotKey::new(kind, entity), &record)?;
        }
        Ok(count)
    }
}
