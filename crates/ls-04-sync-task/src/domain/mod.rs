//! # Domain Module

pub mod state;
pub mod tick;

pub use state::{RunningGuard, TaskState};
pub use tick::{TickOutcome, TickStamp};
