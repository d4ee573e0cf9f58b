//! # Inbound Ports
//!
//! Callbacks the supervisor drives with demultiplexed context events.

use shared_bus::Envelope;

/// Receives the events of the task kinds it was registered for.
///
/// Called on the supervisor's demultiplexing task; must not block.
pub trait EventHandler: Send + Sync {
    /// Handle one event.
    fn handle(&self, envelope: &Envelope);
}

impl<F> EventHandler for F
where
    F: Fn(&Envelope) + Send + Sync,
{
    fn handle(&self, envelope: &Envelope) {
        self(envelope)
    }
}
