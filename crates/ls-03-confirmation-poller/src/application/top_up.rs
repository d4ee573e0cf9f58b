//! # Top-Up Confirmation
//!
//! Notify-after-transfer flow: the caller has already sent ICP to the
//! minter's account; this waits until the minter notices the ledger block
//! and credits the cycles. Nothing is submitted here.

use crate::application::ConfirmationPoller;
use crate::domain::{ConfirmationOutcome, ProbeStatus, TopUpError};
use crate::ports::CyclesMinter;
use shared_types::{CanisterId, CyclesBalance};
use std::sync::Arc;
use tracing::info;

/// Confirms top-ups against a [`CyclesMinter`].
pub struct TopUpConfirmation<M: CyclesMinter + ?Sized> {
    minter: Arc<M>,
    poller: ConfirmationPoller,
}

impl<M: CyclesMinter + ?Sized> TopUpConfirmation<M> {
    /// Create the flow.
    pub fn new(minter: Arc<M>, poller: ConfirmationPoller) -> Self {
        Self { minter, poller }
    }

    /// Wait until the transfer in `block_index` is credited to `canister`.
    pub async fn confirm(
        &self,
        canister: &CanisterId,
        block_index: u64,
    ) -> Result<CyclesBalance, TopUpError> {
        let minter = &self.minter;
        let outcome = self
            .poller
            .confirm(|| async move {
                ProbeStatus::from_remote(minter.notify_top_up(canister, block_index).await)
            })
            .await;

        match outcome {
            ConfirmationOutcome::Success(cycles) => {
                info!(
                    canister = %canister,
                    block_index,
                    cycles = cycles.cycles,
                    "[ls-03] Top-up credited"
                );
                Ok(cycles)
            }
            ConfirmationOutcome::Timeout { attempts } => Err(TopUpError::Timeout {
                block_index,
                attempts,
            }),
            ConfirmationOutcome::Fatal(source) => Err(TopUpError::Rejected {
                block_index,
                source,
            }),
        }
    }
}
