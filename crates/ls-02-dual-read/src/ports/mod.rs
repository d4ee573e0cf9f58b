//! # Ports Module
//!
//! - inbound: delivery sink driven by a fetch
//! - outbound: the probe a fetch issues per channel

pub mod inbound;
pub mod outbound;

pub use inbound::DeliverySink;
pub use outbound::{FnProbe, ReadProbe, ScriptedProbe, ScriptedReply};
