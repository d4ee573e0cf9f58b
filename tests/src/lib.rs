//! # Ledger Sync Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/
//! │   ├── flows.rs      # dual read, store, task and poller working together
//! │   └── e2e_sync.rs   # full runtime against the simulated ledger
//! └── benches/
//!     └── store_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p ls-tests
//!
//! # By category
//! cargo test -p ls-tests integration::flows
//! cargo test -p ls-tests integration::e2e_sync
//!
//! # Benchmarks
//! cargo bench -p ls-tests
//! ```

pub mod integration;
