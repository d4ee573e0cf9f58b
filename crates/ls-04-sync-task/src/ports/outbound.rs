//! # Outbound Ports
//!
//! What a task runs each tick, and where current results go.

use crate::application::TickHandle;
use crate::domain::TickStamp;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{SyncError, TrustedValue};
use std::future::Future;
use std::marker::PhantomData;

/// The repeated unit of work. Values go out through `tick`; the returned
/// error decides whether the tick counts as failed.
#[async_trait]
pub trait TaskWork<O>: Send + Sync {
    /// Run one tick.
    async fn run(&self, tick: &TickHandle<O>) -> Result<(), SyncError>;
}

/// Receiver of results that passed the generation check.
#[async_trait]
pub trait TaskSink<O>: Send + Sync {
    /// A value produced by a current tick.
    async fn deliver(&self, stamp: TickStamp, value: TrustedValue<O>);

    /// A failure; `terminal` when the task stopped because of it.
    async fn fail(&self, stamp: TickStamp, error: SyncError, terminal: bool);
}

/// Adapts an async closure taking the handle by value into [`TaskWork`].
pub struct FnWork<F, O> {
    f: F,
    _marker: PhantomData<fn(O)>,
}

impl<F, O> FnWork<F, O> {
    /// Wrap `f`.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut, O> TaskWork<O> for FnWork<F, O>
where
    F: Fn(TickHandle<O>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), SyncError>> + Send,
    O: Send + Sync + 'static,
{
    async fn run(&self, tick: &TickHandle<O>) -> Result<(), SyncError> {
        (self.f)(tick.clone()).await
    }
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Sink that records everything it receives.
#[derive(Debug)]
pub struct RecordingTaskSink<O> {
    values: Mutex<Vec<(TickStamp, TrustedValue<O>)>>,
    failures: Mutex<Vec<(TickStamp, SyncError, bool)>>,
}

impl<O> Default for RecordingTaskSink<O> {
    fn default() -> Self {
        Self {
            values: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
        }
    }
}

impl<O: Clone> RecordingTaskSink<O> {
    /// Empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivered values, oldest first.
    #[must_use]
    pub fn values(&self) -> Vec<(TickStamp, TrustedValue<O>)> {
        self.values.lock().clone()
    }

    /// Reported failures, oldest first.
    #[must_use]
    pub fn failures(&self) -> Vec<(TickStamp, SyncError, bool)> {
        self.failures.lock().clone()
    }
}

#[async_trait]
impl<O: Clone + Send + Sync + 'static> TaskSink<O> for RecordingTaskSink<O> {
    async fn deliver(&self, stamp: TickStamp, value: TrustedValue<O>) {
        self.values.lock().push((stamp, value));
    }

    async fn fail(&self, stamp: TickStamp, error: SyncError, terminal: bool) {
        self.failures.lock().push((stamp, error, terminal));
    }
}
