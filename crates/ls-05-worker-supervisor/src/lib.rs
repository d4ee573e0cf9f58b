//! # LS-05 Worker Supervisor
//!
//! Runs the sync tasks inside isolated background contexts and routes their
//! results back to the handlers registered per task kind.
//!
//! **Subsystem ID:** 5
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Protocol
//!
//! | Direction | Message | Carries |
//! |-----------|---------|---------|
//! | supervisor to context | `WorkerCommand` | kind, op, typed params + interval |
//! | context to supervisor | `WorkerEvent` | kind, generation, trusted value or error |
//!
//! A context owns one persistent `SyncTask` per kind routed to it. `Start`
//! on a running task is a no-op; `Restart` swaps the parameters and bumps
//! the generation. Commands for kinds this build does not know are ignored.
//!
//! ## Isolation
//!
//! | Mode | Context runs on |
//! |------|-----------------|
//! | `thread` | its own OS thread with a current-thread runtime |
//! | `task` | a task of the caller's runtime |
//!
//! ## Module Structure
//!
//! ```text
//! ls-05-worker-supervisor/
//! ├── domain/          # SupervisorError, RegistrationError
//! ├── ports/           # EventHandler (in), LedgerReader (out, + mock)
//! ├── tasks/           # TaskWork per kind
//! ├── application/     # WorkerContext, WorkerSupervisor
//! └── config.rs        # SupervisorConfig, Isolation
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tasks;

// Re-exports
pub use application::{ContextMessage, ContextSink, WorkerContext, WorkerSupervisor};
pub use config::{Isolation, SupervisorConfig};
pub use domain::{RegistrationError, SupervisorError};
pub use ports::{EventHandler, LedgerReader, MockLedgerReader};
pub use tasks::{
    build_work, BalanceWork, CustomDomainWork, CyclesWork, MonitoringWork, TransactionsWork,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
