//! Outbound notifications for anything beyond the session's own listener
//! (UI buses, reconnect supervisors and the like).

use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    /// A whole discovery session ended without finding the server.
    ConnectFailed,
}

/// Fire-and-forget publisher. Implementations must not block.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: DiscoveryEvent);
}

/// Publishes events to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn publish(&self, event: DiscoveryEvent) {
        match event {
            DiscoveryEvent::ConnectFailed => warn!("could not connect to a server on this network"),
        }
    }
}
