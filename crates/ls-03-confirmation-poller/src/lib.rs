//! # LS-03 Confirmation Poller
//!
//! Bounded-retry waiting for a second system to acknowledge an operation
//! that was submitted earlier, e.g. a cycles minter noticing a ledger
//! transfer.
//!
//! **Subsystem ID:** 3
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Contract
//!
//! | Probe reports | Poller does |
//! |---------------|-------------|
//! | `Success(v)` | returns `Success(v)` |
//! | `Fatal(e)` | returns `Fatal(e)` |
//! | `Retryable` | sleeps `interval_ms` and retries, or returns `Timeout` once `max_attempts` calls were made |
//!
//! Worst-case wall clock is `(max_attempts - 1) * interval_ms`.
//!
//! ## Module Structure
//!
//! ```text
//! ls-03-confirmation-poller/
//! ├── domain/          # ProbeStatus, ConfirmationOutcome, ConfirmationAttempt, TopUpError
//! ├── ports/           # CyclesMinter + MockCyclesMinter
//! ├── application/     # ConfirmationPoller, TopUpConfirmation
//! └── config.rs        # PollerConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use application::{ConfirmationPoller, TopUpConfirmation};
pub use config::PollerConfig;
pub use domain::{ConfirmationAttempt, ConfirmationOutcome, ProbeStatus, TopUpError};
pub use ports::{CyclesMinter, MockCyclesMinter};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
