//! # Shared Bus - Worker Message Protocol
//!
//! Message passing between the foreground supervisor and the isolated
//! background contexts that run sync tasks.
//!
//! ```text
//! ┌──────────────┐   WorkerCommand (per context mpsc)   ┌──────────────┐
//! │  Supervisor  │ ───────────────────────────────────▶ │  Context N   │
//! │              │ ◀─────────────────────────────────── │  (SyncTasks) │
//! └──────────────┘   Envelope<WorkerEvent> (shared)     └──────────────┘
//! ```
//!
//! ## Rules
//!
//! - Contexts share no memory with the foreground; only messages cross.
//! - Both directions are closed sum types, matched exhaustively.
//! - Delivery is FIFO per context; nothing is promised across contexts.
//! - The JSON wire form ignores unknown task kinds.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod codec;
pub mod link;
pub mod messages;

pub use codec::{decode_command, decode_event, encode_command, encode_event, CodecError, WireEnvelope};
pub use link::{event_channel, ContextId, ContextPublisher, Envelope, EventHub, EventPublisher, Subscription};
pub use messages::{
    BalanceParams, BalanceUpdate, CustomDomainParams, CyclesParams, CyclesUpdate, Delivery,
    MonitoringParams, SyncData, TaskParams, TaskSpec, TransactionsParams, TransactionsUpdate,
    WorkerCommand, WorkerEvent,
};

/// Current protocol version of the wire form.
pub const PROTOCOL_VERSION: u16 = 1;

/// Maximum messages buffered per channel before backpressure.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
