//! # Value Store
//!
//! Keyed cache of single-value resources (balances, cycles, monitoring
//! status, domain registrations).
//!
//! `set` is an unconditional replace. `apply` is the guarded write used by
//! sync tasks: it carries the tick's request id and refuses to let an older
//! or unverified write bury a newer verified one, across ticks as well as
//! within one.

use crate::domain::{now_ms, ApplyOutcome, StoredValue};
use parking_lot::RwLock;
use shared_types::{EntityId, TrustedValue};
use std::collections::HashMap;
use tokio::sync::watch;
use tracing::debug;

/// Keyed cache of trust-tagged single values.
pub struct ValueStore<T> {
    entries: RwLock<HashMap<EntityId, StoredValue<T>>>,
    revision: watch::Sender<u64>,
}

impl<T> Default for ValueStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ValueStore<T> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            entries: RwLock::new(HashMap::new()),
            revision,
        }
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    /// Unconditionally replace the value of `id`.
    ///
    /// Clears the verified guard: the next guarded write starts fresh.
    pub fn set(&self, id: EntityId, value: TrustedValue<T>) {
        self.entries.write().insert(
            id,
            StoredValue {
                value,
                last_verified_request: None,
                updated_at_ms: now_ms(),
                hydrated: false,
            },
        );
        self.bump();
    }

    /// Guarded write of a value produced by request `request_id`.
    ///
    /// - an unverified write is rejected unless its request is newer than the
    ///   last verified write;
    /// - a verified write is rejected if its request is older than the last
    ///   verified write.
    pub fn apply(&self, id: EntityId, value: TrustedValue<T>, request_id: u64) -> ApplyOutcome {
        let mut entries = self.entries.write();
        let last_verified = entries.get(&id).and_then(|e| e.last_verified_request);

        match last_verified {
            Some(last) if !value.verified && request_id <= last => {
                debug!(entity = %id, request_id, last_verified = last, "[ls-01] Unverified write rejected");
                return ApplyOutcome::RejectedUnverified {
                    last_verified: last,
                };
            }
            Some(last) if value.verified && request_id < last => {
                debug!(entity = %id, request_id, last_verified = last, "[ls-01] Stale verified write rejected");
                return ApplyOutcome::RejectedStaleVerified {
                    last_verified: last,
                };
            }
            _ => {}
        }

        let last_verified_request = if value.verified {
            Some(request_id)
        } else {
            last_verified
        };
        entries.insert(
            id,
            StoredValue {
                value,
                last_verified_request,
                updated_at_ms: now_ms(),
                hydrated: false,
            },
        );
        drop(entries);
        self.bump();
        ApplyOutcome::Applied
    }

    /// Seed `id` from a persisted snapshot. Never overwrites a live value.
    pub fn hydrate(&self, id: EntityId, value: TrustedValue<T>, updated_at_ms: u64) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(&id) {
            return false;
        }
        entries.insert(
            id,
            StoredValue {
                value,
                last_verified_request: None,
                updated_at_ms,
                hydrated: true,
            },
        );
        drop(entries);
        self.bump();
        true
    }

    /// Remove `id`. Returns whether it was present.
    pub fn remove(&self, id: &EntityId) -> bool {
        let removed = self.entries.write().remove(id).is_some();
        if removed {
            self.bump();
        }
        removed
    }

    /// Clear all state (sign-out).
    pub fn reset(&self) {
        self.entries.write().clear();
        self.bump();
    }

    /// Number of entities held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Observe changes. The value is a revision counter bumped on every write.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Current revision.
    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }
}

impl<T: Clone> ValueStore<T> {
    /// Current value of `id`.
    #[must_use]
    pub fn get(&self, id: &EntityId) -> Option<TrustedValue<T>> {
        self.entries.read().get(id).map(|e| e.value.clone())
    }

    /// Full entry of `id`, including bookkeeping.
    #[must_use]
    pub fn entry(&self, id: &EntityId) -> Option<StoredValue<T>> {
        self.entries.read().get(id).cloned()
    }

    /// Copy of every entry.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(EntityId, StoredValue<T>)> {
        self.entries
            .read()
            .iter()
            .map(|(id, e)| (id.clone(), e.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> EntityId {
        EntityId::new(s)
    }

    #[test]
    fn test_set_is_unconditional() {
        let store = ValueStore::new();
        store.set(id("a"), TrustedValue::verified(1u64));
        store.set(id("a"), TrustedValue::unverified(2u64));
        assert_eq!(store.get(&id("a")), Some(TrustedValue::unverified(2)));
    }

    #[test]
    fn test_unverified_then_verified_same_request() {
        let store = ValueStore::new();
        assert!(store.apply(id("a"), TrustedValue::unverified(1u64), 1).is_applied());
        assert!(store.apply(id("a"), TrustedValue::verified(2u64), 1).is_applied());
        assert_eq!(store.get(&id("a")), Some(TrustedValue::verified(2)));
    }

    #[test]
    fn test_late_unverified_same_request_rejected() {
        let store = ValueStore::new();
        store.apply(id("a"), TrustedValue::verified(2u64), 1);
        let outcome = store.apply(id("a"), TrustedValue::unverified(1u64), 1);
        assert_eq!(outcome, ApplyOutcome::RejectedUnverified { last_verified: 1 });
        assert_eq!(store.get(&id("a")), Some(TrustedValue::verified(2)));
    }

    #[test]
    fn test_cross_tick_unverified_from_older_tick_rejected() {
        // Tick 5's verified result lands, then tick 4's slow unverified one.
        let store = ValueStore::new();
        store.apply(id("a"), TrustedValue::verified(50u64), 5);
        let outcome = store.apply(id("a"), TrustedValue::unverified(40u64), 4);
        assert!(!outcome.is_applied());
        assert_eq!(store.get(&id("a")), Some(TrustedValue::verified(50)));
    }

    #[test]
    fn test_newer_tick_unverified_is_applied() {
        let store = ValueStore::new();
        store.apply(id("a"), TrustedValue::verified(50u64), 5);
        assert!(store.apply(id("a"), TrustedValue::unverified(60u64), 6).is_applied());

        // Guard still remembers request 5.
        let entry = store.entry(&id("a")).unwrap();
        assert_eq!(entry.last_verified_request, Some(5));
        assert!(!store.apply(id("a"), TrustedValue::unverified(55u64), 5).is_applied());
    }

    #[test]
    fn test_older_verified_rejected() {
        let store = ValueStore::new();
        store.apply(id("a"), TrustedValue::verified(2u64), 7);
        let outcome = store.apply(id("a"), TrustedValue::verified(1u64), 6);
        assert_eq!(outcome, ApplyOutcome::RejectedStaleVerified { last_verified: 7 });
    }

    #[test]
    fn test_hydrate_never_overwrites_live_value() {
        let store = ValueStore::new();
        store.apply(id("a"), TrustedValue::unverified(1u64), 1);
        assert!(!store.hydrate(id("a"), TrustedValue::verified(9u64), 0));
        assert_eq!(store.get(&id("a")), Some(TrustedValue::unverified(1)));

        assert!(store.hydrate(id("b"), TrustedValue::verified(9u64), 0));
        assert!(store.entry(&id("b")).unwrap().hydrated);
        // A live unverified write replaces a hydrated verified value.
        assert!(store.apply(id("b"), TrustedValue::unverified(3u64), 1).is_applied());
        assert!(!store.entry(&id("b")).unwrap().hydrated);
    }

    #[test]
    fn test_reset_and_remove() {
        let store = ValueStore::new();
        store.set(id("a"), TrustedValue::verified(1u64));
        store.set(id("b"), TrustedValue::verified(2u64));
        assert!(store.remove(&id("a")));
        assert!(!store.remove(&id("a")));
        store.reset();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_see_revisions() {
        let store = ValueStore::new();
        let mut rx = store.subscribe();
        store.set(id("a"), TrustedValue::verified(1u64));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 1);
        assert_eq!(store.revision(), 1);
    }
}
