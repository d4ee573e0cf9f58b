//! # Ports Module
//!
//! - inbound: event handlers registered with the supervisor
//! - outbound: the ledger the tasks read

pub mod inbound;
pub mod outbound;

pub use inbound::EventHandler;
pub use outbound::{LedgerReader, MockLedgerReader};
