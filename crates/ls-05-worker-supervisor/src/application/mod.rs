//! # Application Module
//!
//! - context: one background context and the tasks it owns
//! - supervisor: spawns contexts, routes commands, demultiplexes events

pub mod context;
pub mod supervisor;

pub use context::{ContextMessage, ContextSink, WorkerContext};
pub use supervisor::WorkerSupervisor;
