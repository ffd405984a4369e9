//! Run event sink port.
//!
//! This port abstracts event delivery, so a run can report progress without
//! coupling to a transport (channels, a terminal renderer, a web socket).

use tokio::sync::mpsc;

use crate::events::RunEvent;

/// Port for receiving run events.
pub trait RunEventSink: Send + Sync {
    /// Deliver one event. Implementations must not block.
    fn emit(&self, event: RunEvent);
}

/// A sink that discards every event.
#[derive(Debug, Clone, Default)]
pub struct NoopRunSink;

impl NoopRunSink {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl RunEventSink for NoopRunSink {
    fn emit(&self, _event: RunEvent) {}
}

/// Forwards events into an unbounded channel, preserving order.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<RunEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RunEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl RunEventSink for ChannelSink {
    fn emit(&self, event: RunEvent) {
        // A dropped receiver means nobody is listening any more.
        let _ = self.tx.send(event);
    }
}
