//! # LS-02 Dual Read
//!
//! One logical read, issued on the fast unverified channel and the slow
//! verified channel at once.
//!
//! **Subsystem ID:** 2
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Verified-Sticky Rule
//!
//! Within one fetch, once the verified branch has delivered (value or
//! error), a later unverified delivery is dropped without calling the sink.
//!
//! | Arrival order | Sink calls |
//! |---------------|------------|
//! | unverified, verified | 2 (unverified then verified) |
//! | verified, unverified | 1 (verified only) |
//!
//! ## Module Structure
//!
//! ```text
//! ls-02-dual-read/
//! ├── domain/          # ReadStrategy, Resolution, Delivered, FetchReport
//! ├── algorithms/      # VerifiedGate
//! ├── ports/           # DeliverySink (inbound), ReadProbe + mocks (outbound)
//! ├── application/     # DualReadExecutor, Fetch
//! └── config.rs        # DualReadConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use algorithms::VerifiedGate;
pub use application::{DeliveryStream, DualReadExecutor, Fetch};
pub use config::DualReadConfig;
pub use domain::{Delivered, FetchReport, ReadFailure, ReadStrategy, Resolution};
pub use ports::{DeliverySink, FnProbe, ReadProbe, ScriptedProbe, ScriptedReply};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
