//! # Domain Module
//!
//! Read policies and delivery types.

pub mod delivery;
pub mod policy;

pub use delivery::*;
pub use policy::*;
