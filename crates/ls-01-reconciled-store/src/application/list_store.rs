//! # List Store
//!
//! Transaction-like resources: per entity, an ordered list of items keyed by
//! item id, newest first.

use crate::algorithms::{self, MergeStats};
use crate::domain::{Identified, ListEntry};
use parking_lot::RwLock;
use shared_types::{EntityId, TrustedValue};
use std::collections::HashMap;
use tokio::sync::watch;
use tracing::{debug, info};

/// One reconciled list. Not synchronised; see [`ListStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledList<T> {
    entries: Vec<ListEntry<T>>,
}

impl<T> Default for ReconciledList<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

fn tag<T>(items: Vec<TrustedValue<T>>, origin: Option<u64>) -> Vec<ListEntry<T>> {
    items
        .into_iter()
        .map(|item| ListEntry { item, origin })
        .collect()
}

impl<T: Identified> ReconciledList<T> {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `newest` ahead of the current items; newest wins by id.
    /// `origin` is the request that produced the batch.
    pub fn prepend(&mut self, newest: Vec<TrustedValue<T>>, origin: Option<u64>) -> MergeStats {
        algorithms::prepend(&mut self.entries, tag(newest, origin))
    }

    /// Add `older` after the current items without removing anything.
    pub fn append(&mut self, older: Vec<TrustedValue<T>>) -> MergeStats {
        algorithms::append(&mut self.entries, tag(older, None))
    }

    /// Remove the items with the given ids.
    pub fn clean_up(&mut self, ids: &[T::Id]) -> Vec<T::Id> {
        algorithms::clean_up(&mut self.entries, ids)
    }

    /// Prepend the verified batch of `request_id` and drop the unverified
    /// items of that or an earlier request it proves forged.
    pub fn reconcile_verified(&mut self, request_id: u64, verified: Vec<T>) -> Vec<T::Id> {
        let verified = verified.into_iter().map(TrustedValue::verified).collect();
        algorithms::reconcile_verified(&mut self.entries, request_id, tag(verified, Some(request_id)))
    }

    /// Remove everything.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Entries, newest first.
    #[must_use]
    pub fn entries(&self) -> &[ListEntry<T>] {
        &self.entries
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Identified + Clone> ReconciledList<T> {
    /// Items with their trust level, newest first.
    #[must_use]
    pub fn items(&self) -> Vec<TrustedValue<T>> {
        self.entries.iter().map(|e| e.item.clone()).collect()
    }
}

/// Keyed collection of reconciled lists with change notification.
pub struct ListStore<T> {
    lists: RwLock<HashMap<EntityId, ReconciledList<T>>>,
    revision: watch::Sender<u64>,
}

impl<T: Identified> Default for ListStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Identified> ListStore<T> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            lists: RwLock::new(HashMap::new()),
            revision,
        }
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    fn with_list<R>(&self, id: EntityId, f: impl FnOnce(&mut ReconciledList<T>) -> R) -> R {
        let result = f(self.lists.write().entry(id).or_default());
        self.bump();
        result
    }

    /// See [`ReconciledList::prepend`].
    pub fn prepend(&self, id: EntityId, newest: Vec<TrustedValue<T>>, origin: Option<u64>) -> MergeStats {
        let stats = self.with_list(id.clone(), |list| list.prepend(newest, origin));
        debug!(entity = %id, inserted = stats.inserted, replaced = stats.replaced, skipped = stats.skipped, "[ls-01] Prepended");
        stats
    }

    /// See [`ReconciledList::append`].
    pub fn append(&self, id: EntityId, older: Vec<TrustedValue<T>>) -> MergeStats {
        self.with_list(id, |list| list.append(older))
    }

    /// See [`ReconciledList::clean_up`].
    pub fn clean_up(&self, id: &EntityId, ids: &[T::Id]) -> Vec<T::Id> {
        let removed = match self.lists.write().get_mut(id) {
            Some(list) => list.clean_up(ids),
            None => return Vec::new(),
        };
        if !removed.is_empty() {
            self.bump();
        }
        removed
    }

    /// See [`ReconciledList::reconcile_verified`].
    pub fn reconcile_verified(&self, id: EntityId, request_id: u64, verified: Vec<T>) -> Vec<T::Id> {
        let removed = self.with_list(id.clone(), |list| list.reconcile_verified(request_id, verified));
        if !removed.is_empty() {
            info!(entity = %id, request_id, forged = ?removed, "[ls-01] Removed items disproved by verified read");
        }
        removed
    }

    /// Seed a list from a persisted snapshot. Never touches a live list.
    pub fn hydrate(&self, id: EntityId, items: Vec<TrustedValue<T>>) -> bool {
        let mut lists = self.lists.write();
        if lists.contains_key(&id) {
            return false;
        }
        let mut list = ReconciledList::new();
        list.append(items);
        lists.insert(id, list);
        drop(lists);
        self.bump();
        true
    }

    /// Drop one entity's list.
    pub fn remove(&self, id: &EntityId) -> bool {
        let removed = self.lists.write().remove(id).is_some();
        if removed {
            self.bump();
        }
        removed
    }

    /// Clear all state.
    pub fn reset(&self) {
        self.lists.write().clear();
        self.bump();
    }

    /// Entity ids with a list.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.lists.read().keys().cloned().collect()
    }

    /// Observe changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

impl<T: Identified + Clone> ListStore<T> {
    /// Items of `id`, newest first.
    #[must_use]
    pub fn get(&self, id: &EntityId) -> Vec<TrustedValue<T>> {
        self.lists
            .read()
            .get(id)
            .map(ReconciledList::items)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{AccountId, Transaction, TransactionId};

    fn tx(id: u64) -> Transaction {
        Transaction {
            id: TransactionId(id),
            from: AccountId::new("a"),
            to: AccountId::new("b"),
            amount_e8s: id * 100,
            fee_e8s: 10_000,
            memo: 0,
            timestamp_ms: 1_700_000_000_000 + id,
        }
    }

    fn tx_ids(items: &[TrustedValue<Transaction>]) -> Vec<u64> {
        items.iter().map(|t| t.value.id.0).collect()
    }

    #[test]
    fn test_transactions_newest_first() {
        let store = ListStore::new();
        let acct = EntityId::new("acct");
        store.prepend(acct.clone(), vec![TrustedValue::verified(tx(2)), TrustedValue::verified(tx(1))], Some(1));
        store.prepend(acct.clone(), vec![TrustedValue::unverified(tx(3))], Some(2));
        assert_eq!(tx_ids(&store.get(&acct)), vec![3, 2, 1]);
    }

    #[test]
    fn test_pagination_appends() {
        let store = ListStore::new();
        let acct = EntityId::new("acct");
        store.prepend(acct.clone(), vec![TrustedValue::verified(tx(10))], Some(1));
        store.append(acct.clone(), vec![TrustedValue::verified(tx(9)), TrustedValue::verified(tx(10))]);
        assert_eq!(tx_ids(&store.get(&acct)), vec![10, 9]);
    }

    #[test]
    fn test_forged_transaction_cleaned_up() {
        let store = ListStore::new();
        let acct = EntityId::new("acct");
        store.prepend(acct.clone(), vec![TrustedValue::unverified(tx(99)), TrustedValue::unverified(tx(5))], Some(4));
        let removed = store.reconcile_verified(acct.clone(), 4, vec![tx(5)]);
        assert_eq!(removed, vec![TransactionId(99)]);
        let items = store.get(&acct);
        assert_eq!(tx_ids(&items), vec![5]);
        assert!(items[0].verified);
    }

    #[test]
    fn test_forged_transaction_cleaned_up_after_failed_verified_read() {
        let store = ListStore::new();
        let acct = EntityId::new("acct");
        store.prepend(acct.clone(), vec![TrustedValue::unverified(tx(7))], Some(1));

        // Request 1 never got a verified page; request 2 covers the same range.
        let removed = store.reconcile_verified(acct.clone(), 2, vec![tx(5)]);

        assert_eq!(removed, vec![TransactionId(7)]);
        let items = store.get(&acct);
        assert_eq!(tx_ids(&items), vec![5]);
        assert!(items[0].verified);
    }

    #[test]
    fn test_clean_up_unknown_entity() {
        let store: ListStore<Transaction> = ListStore::new();
        assert!(store.clean_up(&EntityId::new("nobody"), &[TransactionId(1)]).is_empty());
    }

    #[test]
    fn test_hydrate_only_empty() {
        let store = ListStore::new();
        let acct = EntityId::new("acct");
        assert!(store.hydrate(acct.clone(), vec![TrustedValue::verified(tx(1))]));
        assert!(!store.hydrate(acct.clone(), vec![TrustedValue::verified(tx(2))]));
        assert_eq!(tx_ids(&store.get(&acct)), vec![1]);
        store.reset();
        assert!(store.ids().is_empty());
    }
}
