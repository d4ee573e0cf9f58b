//! # LS-04 Sync Task
//!
//! Named, intervalled, cancellable units of repeated background work
//! ("refresh balance", "refresh cycles", "poll registration state").
//!
//! **Subsystem ID:** 4
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Lifecycle
//!
//! ```text
//!            start (gen += 1)
//!   Idle ─────────────────────▶ Running ◀──┐
//!                                 │        │ start (gen += 1)
//!                   stop / halt   ▼        │
//!                              Stopped ────┘
//! ```
//!
//! Cancellation is cooperative. A tick captures the generation it started
//! under; its results are delivered only while the task is still `Running`
//! that generation.
//!
//! ## Module Structure
//!
//! ```text
//! ls-04-sync-task/
//! ├── domain/          # TaskState, RunningGuard, TickStamp, TickOutcome
//! ├── ports/           # TaskWork, TaskSink (+ FnWork, RecordingTaskSink)
//! ├── application/     # SyncTask, TickHandle
//! └── config.rs        # FailurePolicy
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use application::{SyncTask, TickHandle};
pub use config::FailurePolicy;
pub use domain::{TaskState, TickOutcome, TickStamp};
pub use ports::{FnWork, RecordingTaskSink, TaskSink, TaskWork};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
