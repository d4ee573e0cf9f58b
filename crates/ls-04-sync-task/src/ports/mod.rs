//! # Ports Module

pub mod outbound;

pub use outbound::{FnWork, RecordingTaskSink, TaskSink, TaskWork};
