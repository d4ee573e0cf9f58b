//! # Verified Gate
//!
//! Ordering rule for the branches of one fetch: once the verified branch
//! has delivered (value or error), later unverified deliveries are dropped.
//! Scoped to a single fetch; every fetch gets a fresh gate.

use shared_types::ReadChannel;

/// Per-fetch admission state.
#[derive(Debug, Clone, Default)]
pub struct VerifiedGate {
    verified_delivered: bool,
    dropped: usize,
}

impl VerifiedGate {
    /// A fresh, open gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether a delivery from `channel` reaches the caller.
    pub fn admit(&mut self, channel: ReadChannel) -> bool {
        if self.verified_delivered && !channel.is_verified() {
            self.dropped += 1;
            return false;
        }
        self.verified_delivered |= channel.is_verified();
        true
    }

    /// Whether a verified delivery happened.
    #[must_use]
    pub fn verified_delivered(&self) -> bool {
        self.verified_delivered
    }

    /// Unverified deliveries dropped so far.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}
