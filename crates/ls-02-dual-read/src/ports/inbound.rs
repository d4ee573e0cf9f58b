//! # Inbound Ports
//!
//! Callbacks a fetch drives, in admission order.

use crate::domain::ReadFailure;
use async_trait::async_trait;
use shared_types::TrustedValue;
use tracing::warn;

/// Receives the admitted deliveries of a fetch.
///
/// A fetch never fails synchronously: every outcome arrives here.
#[async_trait]
pub trait DeliverySink<T: Send + 'static>: Send + Sync {
    /// A branch delivered a value.
    async fn on_value(&self, value: TrustedValue<T>);

    /// A branch failed. Called for both channels.
    async fn on_error(&self, failure: &ReadFailure) {
        warn!(channel = %failure.channel, error = %failure.error, "[ls-02] Read branch failed");
    }

    /// The verified branch failed. Called after `on_error`, for the verified
    /// channel only.
    async fn on_verified_error(&self, _failure: &ReadFailure) {}
}
