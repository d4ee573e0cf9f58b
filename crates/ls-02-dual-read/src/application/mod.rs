//! # Application Layer

pub mod executor;

pub use executor::{DeliveryStream, DualReadExecutor, Fetch};
