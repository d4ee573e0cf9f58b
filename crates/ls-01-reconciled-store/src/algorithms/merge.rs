//! # List Merge Rules
//!
//! Pure functions over an ordered list of [`ListEntry`] values.
//!
//! ## Invariants
//!
//! - The item id is the dedup key; no operation produces duplicate ids.
//! - Items an operation does not touch keep their relative order.
//! - An unverified item never replaces a verified one with the same id.
//!   The verified item takes the position the newcomer would have had.

use crate::domain::{Identified, ListEntry};
use std::collections::{HashMap, HashSet};

/// What a merge did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Items whose id was new to the list.
    pub inserted: usize,
    /// Existing items replaced by a newcomer with the same id.
    pub replaced: usize,
    /// Newcomers ignored (duplicate id, or unverified against verified).
    pub skipped: usize,
}

/// Merge `newest` ahead of `entries`. Newest wins by id.
pub fn prepend<T: Identified>(entries: &mut Vec<ListEntry<T>>, newest: Vec<ListEntry<T>>) -> MergeStats {
    let mut stats = MergeStats::default();
    let mut slots: Vec<Option<ListEntry<T>>> =
        std::mem::take(entries).into_iter().map(Some).collect();
    let index: HashMap<T::Id, usize> = slots
        .iter()
        .enumerate()
        .filter_map(|(pos, slot)| slot.as_ref().map(|entry| (entry.id(), pos)))
        .collect();

    let mut seen = HashSet::with_capacity(newest.len());
    let mut head = Vec::with_capacity(newest.len() + slots.len());
    for incoming in newest {
        let id = incoming.id();
        if !seen.insert(id.clone()) {
            stats.skipped += 1;
            continue;
        }
        match index.get(&id).and_then(|&pos| slots[pos].take()) {
            Some(current) if current.is_verified() && !incoming.is_verified() => {
                stats.skipped += 1;
                head.push(current);
            }
            Some(_) => {
                stats.replaced += 1;
                head.push(incoming);
            }
            None => {
                stats.inserted += 1;
                head.push(incoming);
            }
        }
    }

    head.extend(slots.into_iter().flatten());
    *entries = head;
    stats
}

/// Add `older` after `entries`. Nothing existing is removed or moved.
pub fn append<T: Identified>(entries: &mut Vec<ListEntry<T>>, older: Vec<ListEntry<T>>) -> MergeStats {
    let mut stats = MergeStats::default();
    let mut ids: HashSet<T::Id> = entries.iter().map(ListEntry::id).collect();
    for incoming in older {
        if ids.insert(incoming.id()) {
            stats.inserted += 1;
            entries.push(incoming);
        } else {
            stats.skipped += 1;
        }
    }
    stats
}

/// Remove every entry whose id is in `ids`. Returns the ids actually removed,
/// in list order.
pub fn clean_up<T: Identified>(entries: &mut Vec<ListEntry<T>>, ids: &[T::Id]) -> Vec<T::Id> {
    let targets: HashSet<&T::Id> = ids.iter().collect();
    let mut removed = Vec::new();
    entries.retain(|entry| {
        let id = entry.id();
        if targets.contains(&id) {
            removed.push(id);
            false
        } else {
            true
        }
    });
    removed
}

/// Prepend a verified batch for `request_id`, then drop unverified items that
/// this or an earlier request introduced but the verified batch does not
/// contain. Items of a later request are left for its own verified read.
///
/// Returns the ids removed as forged.
pub fn reconcile_verified<T: Identified>(
    entries: &mut Vec<ListEntry<T>>,
    request_id: u64,
    verified: Vec<ListEntry<T>>,
) -> Vec<T::Id> {
    let confirmed: HashSet<T::Id> = verified.iter().map(ListEntry::id).collect();
    prepend(entries, verified);

    let forged: Vec<T::Id> = entries
        .iter()
        .filter(|entry| {
            !entry.is_verified()
                && entry.origin.is_some_and(|origin| origin <= request_id)
                && !confirmed.contains(&entry.id())
        })
        .map(ListEntry::id)
        .collect();
    clean_up(entries, &forged)
}
