//! # Domain Module

pub mod errors;
pub mod outcome;

pub use errors::TopUpError;
pub use outcome::{ConfirmationAttempt, ConfirmationOutcome, ProbeStatus};
