//! # Context Link
//!
//! Outbound path from background contexts to the supervisor.
//!
//! All contexts share one bounded channel. Each context publishes through its
//! own [`ContextPublisher`], which stamps a per-context sequence number. The
//! sequence is taken and the message enqueued under one lock, so arrival order
//! at the [`Subscription`] is FIFO per context. There is no ordering across
//! contexts.

use crate::messages::WorkerEvent;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};
use uuid::Uuid;

/// Identifier of a background execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub usize);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

/// An event stamped with its origin.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Unique message id.
    pub message_id: Uuid,
    /// Context that sent the event.
    pub context: ContextId,
    /// Per-context sequence number, starting at 1.
    pub sequence: u64,
    /// The event.
    pub event: WorkerEvent,
}

/// Publishing side of a context link.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event. Returns `false` when the supervisor is gone.
    async fn publish(&self, event: WorkerEvent) -> bool;

    /// Total events published by this publisher.
    fn events_published(&self) -> u64;
}

/// Creates per-context publishers over one shared channel.
#[derive(Clone)]
pub struct EventHub {
    sender: mpsc::Sender<Envelope>,
    capacity: usize,
}

/// Create a hub and the subscription draining it.
#[must_use]
pub fn event_channel(capacity: usize) -> (EventHub, Subscription) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (
        EventHub { sender, capacity },
        Subscription {
            receiver,
            last_sequence: HashMap::new(),
        },
    )
}

impl EventHub {
    /// Create a hub with [`DEFAULT_CHANNEL_CAPACITY`].
    #[must_use]
    pub fn with_default_capacity() -> (Self, Subscription) {
        event_channel(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Publisher for one context.
    #[must_use]
    pub fn publisher(&self, context: ContextId) -> ContextPublisher {
        ContextPublisher {
            context,
            sender: self.sender.clone(),
            sequence: Arc::new(Mutex::new(0)),
            published: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Publisher bound to one context. Clones share the sequence counter.
#[derive(Clone)]
pub struct ContextPublisher {
    context: ContextId,
    sender: mpsc::Sender<Envelope>,
    sequence: Arc<Mutex<u64>>,
    published: Arc<AtomicU64>,
}

impl ContextPublisher {
    /// The context this publisher belongs to.
    #[must_use]
    pub fn context(&self) -> ContextId {
        self.context
    }
}

#[async_trait]
impl EventPublisher for ContextPublisher {
    async fn publish(&self, event: WorkerEvent) -> bool {
        // Waits for capacity; backpressure reaches the ticking task.
        let permit = match self.sender.reserve().await {
            Ok(permit) => permit,
            Err(_) => {
                warn!(context = %self.context, kind = %event.kind(), "[bus] Event dropped (supervisor gone)");
                return false;
            }
        };

        let mut sequence = self.sequence.lock();
        *sequence += 1;
        permit.send(Envelope {
            message_id: Uuid::new_v4(),
            context: self.context,
            sequence: *sequence,
            event,
        });
        drop(sequence);

        self.published.fetch_add(1, Ordering::Relaxed);
        true
    }

    fn events_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

/// Receiving side of the link, owned by the supervisor.
pub struct Subscription {
    receiver: mpsc::Receiver<Envelope>,
    last_sequence: HashMap<ContextId, u64>,
}

impl Subscription {
    /// Receive the next envelope. `None` once every publisher is dropped.
    pub async fn recv(&mut self) -> Option<Envelope> {
        let envelope = self.receiver.recv().await?;
        let last = self.last_sequence.entry(envelope.context).or_insert(0);
        if envelope.sequence <= *last {
            warn!(
                context = %envelope.context,
                sequence = envelope.sequence,
                last = *last,
                "[bus] Out-of-order envelope"
            );
        } else {
            *last = envelope.sequence;
        }
        debug!(
            context = %envelope.context,
            sequence = envelope.sequence,
            kind = %envelope.event.kind(),
            "[bus] Envelope received"
        );
        Some(envelope)
    }

    /// Convert into a stream. Sequence tracking is not performed on the stream.
    #[must_use]
    pub fn into_stream(self) -> ReceiverStream<Envelope> {
        ReceiverStream::new(self.receiver)
    }
}
