//! # Domain Module
//!
//! Core domain types for the reconciled store.

pub mod entities;
pub mod errors;
pub mod snapshot;

pub use entities::*;
pub use errors::*;
pub use snapshot::*;
