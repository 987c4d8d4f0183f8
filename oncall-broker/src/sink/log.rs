// oncall-broker/src/sink/log.rs
// ============================================================================
// Module: Oncall Log Sink
// Description: Newline-delimited-JSON live-log publisher.
// Purpose: Write each live-log event to any `Write` sink (stdout, a file).
// Dependencies: serde_json, tracing, std
// ============================================================================

//! ## Overview
//! [`LogSink`] writes each event as one JSON line. It does not deliver events
//! anywhere external; it exists for operators tailing a log file and for
//! `oncall-cli`'s `audit tail`-adjacent commands that need a durable text
//! trail alongside the in-memory SSE stream.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;

use oncall_core::LiveLogEvent;
use oncall_core::LiveLogPublisher;
use tracing::warn;

// ============================================================================
// SECTION: Log Sink
// ============================================================================

/// Newline-delimited-JSON live-log publisher.
pub struct LogSink<W: Write + Send> {
    /// Output writer for log records.
    writer: Mutex<W>,
}

impl<W: Write + Send> LogSink<W> {
    /// Creates a log sink writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer: Mutex::new(writer) }
    }
}

impl<W: Write + Send> LiveLogPublisher for LogSink<W> {
    fn publish(&self, event: &LiveLogEvent) {
        let Ok(mut guard) = self.writer.lock() else {
            warn!("log sink mutex poisoned, dropping live-log event");
            return;
        };
        if let Err(err) = serde_json::to_writer(&mut *guard, event) {
            warn!(error = %err, "failed to serialize live-log event");
            return;
        }
        if let Err(err) = guard.write_all(b"\n") {
            warn!(error = %err, "failed to write live-log event newline");
        }
    }
}
