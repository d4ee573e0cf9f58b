//! # Ports Module

pub mod outbound;

pub use outbound::{CyclesMinter, MockCyclesMinter};
