// oncall-broker/src/sink/channel.rs
// ============================================================================
// Module: Oncall Channel Sink
// Description: Channel-based live-log publisher.
// Purpose: Feed the `GET /events` SSE stream from a Tokio mpsc channel.
// Dependencies: oncall-core, tokio, tracing
// ============================================================================

//! ## Overview
//! [`ChannelSink`] publishes events by sending them into a
//! `tokio::sync::mpsc` channel that the SSE handler drains. A full or closed
//! channel (no subscribers currently connected) drops the event rather than
//! blocking the incident engine.

// ============================================================================
// SECTION: Imports
// ============================================================================

use oncall_core::LiveLogEvent;
use oncall_core::LiveLogPublisher;
use tokio::sync::mpsc::Sender;
use tracing::warn;

// ============================================================================
// SECTION: Channel Sink
// ============================================================================

/// Channel-based live-log publisher.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    /// Sender used to push events to subscribers.
    sender: Sender<LiveLogEvent>,
}

impl ChannelSink {
    /// Creates a channel sink over `sender`.
    #[must_use]
    pub const fn new(sender: Sender<LiveLogEvent>) -> Self {
        Self { sender }
    }
}

impl LiveLogPublisher for ChannelSink {
    fn publish(&self, event: &LiveLogEvent) {
        if let Err(err) = self.sender.try_send(event.clone()) {
            warn!(
                incident_id = %event.incident_id,
                error = %err,
                "dropped live-log event: channel full or no subscribers"
            );
        }
    }
}
