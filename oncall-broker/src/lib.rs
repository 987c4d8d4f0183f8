// oncall-broker/src/lib.rs
// ============================================================================
// Module: Oncall Broker Library
// Description: Webhook ingress sources and live-log publishers.
// Purpose: Turn raw webhook bodies into Alerts and deliver LiveLogEvents.
// Dependencies: oncall-core, tokio, tracing
// ============================================================================

//! ## Overview
//! Oncall Broker provides the two I/O edges of the ingress/observability
//! path that sit outside the deterministic engine in `oncall-core`: webhook
//! [`source`]s that parse a vendor payload into an [`oncall_core::Alert`],
//! and [`sink`] implementations of `oncall_core::LiveLogPublisher` that
//! carry a running incident's events to operators.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod sink;
pub mod source;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use sink::CallbackSink;
pub use sink::ChannelSink;
pub use sink::LogSink;
pub use source::CloudwatchSource;
pub use source::InlineSource;
pub use source::PagerdutySource;
pub use source::Source;
pub use source::SourceError;
