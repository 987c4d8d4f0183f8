// oncall-broker/src/sink/callback.rs
// ============================================================================
// Module: Oncall Callback Sink
// Description: Callback-based live-log publisher for tests.
// Purpose: Invoke a user-provided function with each published event.
// Dependencies: oncall-core, std
// ============================================================================

//! ## Overview
//! [`CallbackSink`] publishes events by invoking a user-supplied function,
//! used by scenario tests to assert on the exact sequence of events an
//! incident emits without standing up a real channel or writer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use oncall_core::LiveLogEvent;
use oncall_core::LiveLogPublisher;

// ============================================================================
// SECTION: Callback Sink
// ============================================================================

/// Callback handler signature used by the sink.
type CallbackHandler = dyn Fn(&LiveLogEvent) + Send + Sync;

/// Callback-based live-log publisher.
#[derive(Clone)]
pub struct CallbackSink {
    /// Handler invoked with each published event.
    handler: Arc<CallbackHandler>,
}

impl CallbackSink {
    /// Creates a callback sink from a handler function.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&LiveLogEvent) + Send + Sync + 'static,
    {
        Self { handler: Arc::new(handler) }
    }
}

impl LiveLogPublisher for CallbackSink {
    fn publish(&self, event: &LiveLogEvent) {
        (self.handler)(event);
    }
}
