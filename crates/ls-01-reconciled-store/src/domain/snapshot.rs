//! # Snapshot Layout
//!
//! Persisted form of a store entry, so the last known value can be shown
//! before the first live tick completes.
//!
//! Key: `<resourceKind>:<entityId>`
//! Value: `{ "data": .., "verified": bool, "updatedAtMs": u64 }`

use crate::domain::StoreError;
use serde::{Deserialize, Serialize};
use shared_types::{EntityId, TaskKind, TrustedValue};
use std::fmt;

/// Key of a persisted snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    /// Resource kind.
    pub kind: TaskKind,
    /// Entity within the resource kind.
    pub entity: EntityId,
}

impl SnapshotKey {
    /// Create a key.
    #[must_use]
    pub fn new(kind: TaskKind, entity: EntityId) -> Self {
        Self { kind, entity }
    }

    /// Key prefix shared by all entities of `kind`.
    #[must_use]
    pub fn prefix(kind: TaskKind) -> String {
        format!("{}:", kind.as_str())
    }

    /// Parse `<resourceKind>:<entityId>`. The entity id may itself contain `:`.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let (kind, entity) = raw
            .split_once(':')
            .ok_or_else(|| StoreError::InvalidKey(raw.to_string()))?;
        let kind = kind
            .parse::<TaskKind>()
            .map_err(|_| StoreError::InvalidKey(raw.to_string()))?;
        if entity.is_empty() {
            return Err(StoreError::InvalidKey(raw.to_string()));
        }
        Ok(Self::new(kind, EntityId::new(entity)))
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.entity)
    }
}

/// Persisted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRecord<T> {
    /// The payload.
    pub data: T,
    /// Trust level of the payload.
    pub verified: bool,
    /// Time of the write that produced it.
    pub updated_at_ms: u64,
}

impl<T> SnapshotRecord<T> {
    /// Build a record from a trusted value.
    pub fn from_trusted(value: TrustedValue<T>, updated_at_ms: u64) -> Self {
        Self {
            data: value.value,
            verified: value.verified,
            updated_at_ms,
        }
    }

    /// Split back into a trusted value.
    pub fn into_trusted(self) -> TrustedValue<T> {
        TrustedValue::new(self.data, self.verified)
    }
}
