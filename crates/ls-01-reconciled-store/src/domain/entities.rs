//! # Store Entities
//!
//! What the store keeps per entity, and the identity rule for list items.

use serde::{Deserialize, Serialize};
use shared_types::{Transaction, TransactionId, TrustedValue};
use std::fmt::Debug;
use std::hash::Hash;

/// A list item with a stable identity. The id is the dedup key.
pub trait Identified {
    /// Identity type.
    type Id: Clone + Eq + Hash + Debug + Send + Sync;

    /// The dedup key of this item.
    fn id(&self) -> Self::Id;
}

impl Identified for Transaction {
    type Id = TransactionId;

    fn id(&self) -> TransactionId {
        self.id
    }
}

/// A single-value resource as held by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue<T> {
    /// The value and its trust level.
    pub value: TrustedValue<T>,
    /// Request id of the newest verified write, if any.
    pub last_verified_request: Option<u64>,
    /// Wall-clock time of the last write, milliseconds since the epoch.
    pub updated_at_ms: u64,
    /// `true` while the value comes from a persisted snapshot.
    pub hydrated: bool,
}

/// One item of a reconciled list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry<T> {
    /// The item and its trust level.
    pub item: TrustedValue<T>,
    /// Request that introduced the item; `None` for hydrated or paginated items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<u64>,
}

impl<T: Identified> ListEntry<T> {
    /// Dedup key of the entry.
    pub fn id(&self) -> T::Id {
        self.item.value.id()
    }

    /// Whether the item came from the verified channel.
    pub fn is_verified(&self) -> bool {
        self.item.verified
    }
}

/// Result of a guarded write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The write replaced (or created) the entry.
    Applied,
    /// An unverified write not newer than the last verified one.
    RejectedUnverified {
        /// Request id of the last verified write.
        last_verified: u64,
    },
    /// A verified write older than the last verified one.
    RejectedStaleVerified {
        /// Request id of the last verified write.
        last_verified: u64,
    },
}

impl ApplyOutcome {
    /// Whether the write changed the store.
    #[must_use]
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Current wall-clock time in milliseconds.
pub fn now_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}
