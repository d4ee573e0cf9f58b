//! # Algorithms Module
//!
//! Merge rules for reconciled lists.

pub mod merge;

pub use merge::{append, clean_up, prepend, reconcile_verified, MergeStats};
