// oncall-broker/src/sink/mod.rs
// ============================================================================
// Module: Oncall Broker Sinks
// Description: LiveLogPublisher implementations for operator-facing delivery.
// Purpose: Deliver LiveLogEvents to the SSE stream, structured logs, and tests.
// Dependencies: oncall-core, tokio, tracing
// ============================================================================

//! ## Overview
//! Live-log publishers deliver [`oncall_core::LiveLogEvent`]s to
//! operator-facing subscribers per the engine's `LiveLogPublisher` contract
//! (§6). Delivery is at-most-once: `LiveLogPublisher::publish` has no
//! `Result`, so every implementation here swallows its own delivery failure
//! into a `tracing::warn!` rather than propagating one — the durable audit
//! log is the record of truth; this stream exists only for live visibility.

// ============================================================================
// SECTION: Implementations
// ============================================================================

pub mod callback;
pub mod channel;
pub mod log;

pub use callback::CallbackSink;
pub use channel::ChannelSink;
pub use log::LogSink;
