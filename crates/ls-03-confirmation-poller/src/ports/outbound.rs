//! # Outbound Ports
//!
//! The second system a confirmation waits on.

use async_trait::async_trait;
use shared_types::{CanisterId, CyclesBalance, RemoteError};
use std::sync::atomic::{AtomicU32, Ordering};

/// Cycles minting service that must notice a ledger transfer before the
/// cycles are credited.
#[async_trait]
pub trait CyclesMinter: Send + Sync {
    /// Notify the minter about the transfer in `block_index`. Answers
    /// [`RemoteError::Processing`] while the transfer is still in flight.
    async fn notify_top_up(
        &self,
        canister: &CanisterId,
        block_index: u64,
    ) -> Result<CyclesBalance, RemoteError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock minter answering "processing" a fixed number of times.
#[derive(Debug)]
pub struct MockCyclesMinter {
    pending_replies: u32,
    credited: CyclesBalance,
    calls: AtomicU32,
    /// Reject every notification.
    pub should_fail: bool,
}

impl MockCyclesMinter {
    /// Minter that acknowledges after `pending_replies` "processing" answers.
    #[must_use]
    pub fn new(pending_replies: u32, credited_cycles: u64) -> Self {
        Self {
            pending_replies,
            credited: CyclesBalance::new(credited_cycles),
            calls: AtomicU32::new(0),
            should_fail: false,
        }
    }

    /// Minter that rejects every notification.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new(0, 0)
        }
    }

    /// Notifications received so far.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CyclesMinter for MockCyclesMinter {
    async fn notify_top_up(
        &self,
        _canister: &CanisterId,
        block_index: u64,
    ) -> Result<CyclesBalance, RemoteError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(RemoteError::Rejected(format!(
                "block {block_index} is not a top-up transfer"
            )));
        }
        if call < self.pending_replies {
            return Err(RemoteError::Processing);
        }
        Ok(self.credited)
    }
}
