//! # Algorithms Module

pub mod gate;

pub use gate::VerifiedGate;
