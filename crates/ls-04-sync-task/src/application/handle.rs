//! # Tick Handle
//!
//! Given to the work of one tick. Every delivery re-checks that the task is
//! still running the generation the tick started under; results of a tick
//! that outlived a stop or restart are dropped here.

use crate::domain::{TaskState, TickStamp};
use crate::ports::TaskSink;
use shared_types::{Generation, SyncError, TaskKind, TrustedValue};
use std::sync::Arc;
use sync_telemetry::{SYNC_DELIVERIES, SYNC_STALE_RESULTS};
use tracing::debug;

/// Delivery handle of one tick. Cheap to clone; clones outliving the tick
/// stay subject to the generation check.
pub struct TickHandle<O> {
    stamp: TickStamp,
    state: Arc<TaskState>,
    sink: Arc<dyn TaskSink<O>>,
}

impl<O> Clone for TickHandle<O> {
    fn clone(&self) -> Self {
        Self {
            stamp: self.stamp,
            state: Arc::clone(&self.state),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<O: Send + 'static> TickHandle<O> {
    pub(crate) fn new(stamp: TickStamp, state: Arc<TaskState>, sink: Arc<dyn TaskSink<O>>) -> Self {
        Self { stamp, state, sink }
    }

    /// Identity of this tick.
    #[must_use]
    pub fn stamp(&self) -> TickStamp {
        self.stamp
    }

    /// Task family.
    #[must_use]
    pub fn kind(&self) -> TaskKind {
        self.stamp.kind
    }

    /// Generation captured at tick start.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.stamp.generation
    }

    /// Request id of this tick.
    #[must_use]
    pub fn request_id(&self) -> u64 {
        self.stamp.request_id
    }

    /// Whether results of this tick are still wanted.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.state.is_current(self.stamp.generation)
    }

    /// Deliver a value. Returns `false` when it was dropped as stale.
    pub async fn deliver(&self, value: TrustedValue<O>) -> bool {
        if !self.check_current() {
            return false;
        }
        let channel = if value.verified { "verified" } else { "unverified" };
        SYNC_DELIVERIES
            .with_label_values(&[self.stamp.kind.as_str(), channel])
            .inc();
        self.sink.deliver(self.stamp, value).await;
        true
    }

    /// Surface a non-terminal failure of one read branch. Returns `false`
    /// when it was dropped as stale.
    pub async fn report(&self, error: SyncError) -> bool {
        if !self.check_current() {
            return false;
        }
        self.sink.fail(self.stamp, error, false).await;
        true
    }

    fn check_current(&self) -> bool {
        if self.is_current() {
            return true;
        }
        SYNC_STALE_RESULTS
            .with_label_values(&[self.stamp.kind.as_str()])
            .inc();
        debug!(
            kind = %self.stamp.kind,
            generation = %self.stamp.generation,
            current = %self.state.generation(),
            request_id = self.stamp.request_id,
            "[ls-04] Stale result discarded"
        );
        false
    }

    pub(crate) async fn fail_terminal(&self, error: SyncError) {
        self.sink.fail(self.stamp, error, true).await;
    }
}
