//! # Outbound Ports
//!
//! The read a fetch issues on each channel.

use async_trait::async_trait;
use shared_types::{ReadChannel, RemoteError};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// One logical read, issued once per selected channel.
#[async_trait]
pub trait ReadProbe<T>: Send + Sync {
    /// Perform the read on `channel`.
    async fn read(&self, channel: ReadChannel) -> Result<T, RemoteError>;
}

/// Adapts an async closure into a [`ReadProbe`].
pub struct FnProbe<F, T> {
    f: F,
    _marker: PhantomData<fn() -> T>,
}

impl<F, T> FnProbe<F, T> {
    /// Wrap `f`.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut, T> ReadProbe<T> for FnProbe<F, T>
where
    F: Fn(ReadChannel) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, RemoteError>> + Send,
    T: Send,
{
    async fn read(&self, channel: ReadChannel) -> Result<T, RemoteError> {
        (self.f)(channel).await
    }
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Scripted reply of one channel.
#[derive(Debug, Clone)]
pub struct ScriptedReply<T> {
    /// Simulated latency.
    pub delay: Duration,
    /// What the channel answers.
    pub result: Result<T, RemoteError>,
}

/// Mock probe answering each channel after a fixed delay.
#[derive(Debug)]
pub struct ScriptedProbe<T> {
    unverified: ScriptedReply<T>,
    verified: ScriptedReply<T>,
    unverified_calls: AtomicUsize,
    verified_calls: AtomicUsize,
}

impl<T: Clone> ScriptedProbe<T> {
    /// Create a probe from the two scripted replies.
    pub fn new(unverified: ScriptedReply<T>, verified: ScriptedReply<T>) -> Self {
        Self {
            unverified,
            verified,
            unverified_calls: AtomicUsize::new(0),
            verified_calls: AtomicUsize::new(0),
        }
    }

    /// Both channels succeed, after the given delays in milliseconds.
    pub fn values(unverified: (u64, T), verified: (u64, T)) -> Self {
        Self::new(
            ScriptedReply {
                delay: Duration::from_millis(unverified.0),
                result: Ok(unverified.1),
            },
            ScriptedReply {
                delay: Duration::from_millis(verified.0),
                result: Ok(verified.1),
            },
        )
    }

    /// Calls received on `channel`.
    pub fn calls(&self, channel: ReadChannel) -> usize {
        match channel {
            ReadChannel::Unverified => self.unverified_calls.load(Ordering::Relaxed),
            ReadChannel::Verified => self.verified_calls.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> ReadProbe<T> for ScriptedProbe<T> {
    async fn read(&self, channel: ReadChannel) -> Result<T, RemoteError> {
        let reply = match channel {
            ReadChannel::Unverified => {
                self.unverified_calls.fetch_add(1, Ordering::Relaxed);
                &self.unverified
            }
            ReadChannel::Verified => {
                self.verified_calls.fetch_add(1, Ordering::Relaxed);
                &self.verified
            }
        };
        tokio::time::sleep(reply.delay).await;
        reply.result.clone()
    }
}
