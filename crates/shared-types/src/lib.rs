//! # Shared Types Crate
//!
//! This crate contains every type that crosses a subsystem or execution
//! context boundary in the ledger sync client.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: ids, ledger entities and task descriptors are
//!   defined once and reused by the store, the executors and the workers.
//! - **Trust is data**: every value read from the remote ledger travels as a
//!   [`TrustedValue`] so the channel it came from is never lost.
//! - **Wire shapes stop at the boundary**: [`RemoteResult`] mirrors the
//!   `{"Ok": ..}` / `{"Err": ..}` shape of remote replies and is converted
//!   into internal types exactly once.

pub mod entities;
pub mod errors;
pub mod remote;
pub mod task;
pub mod trust;

pub use entities::*;
pub use errors::*;
pub use remote::RemoteResult;
pub use task::*;
pub use trust::{ReadChannel, TrustedValue};
