// oncall-broker/src/source/mod.rs
// ============================================================================
// Module: Oncall Broker Sources
// Description: Source trait and reference implementations for webhook ingest.
// Purpose: Turn a raw request body into an `Alert`.
// Dependencies: oncall-core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Sources parse the raw body of an inbound webhook request into an
//! [`oncall_core::Alert`]. Implementations must fail closed on a payload
//! shape they don't recognize rather than guessing at missing fields.

// ============================================================================
// SECTION: Imports
// ============================================================================

use oncall_core::Alert;
use thiserror::Error;

// ============================================================================
// SECTION: Source Errors
// ============================================================================

/// Errors emitted while parsing a webhook payload into an [`Alert`].
#[derive(Debug, Error)]
pub enum SourceError {
    /// Body was not valid JSON.
    #[error("malformed json payload: {0}")]
    Malformed(String),
    /// A field required by this source's payload shape was absent.
    #[error("missing required field: {0}")]
    MissingField(String),
    /// A field was present but not of the expected type or value.
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        /// Name of the offending field.
        field: String,
        /// Reason the value was rejected.
        reason: String,
    },
}

// ============================================================================
// SECTION: Source Trait
// ============================================================================

/// Parses a webhook request body into an [`Alert`].
pub trait Source: Send + Sync {
    /// Parses `body` into an alert.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when `body` does not match this source's
    /// expected payload shape.
    fn parse(&self, body: &[u8]) -> Result<Alert, SourceError>;
}

// ============================================================================
// SECTION: Implementations
// ============================================================================

pub mod cloudwatch;
pub mod inline;
pub mod pagerduty;

pub use cloudwatch::CloudwatchSource;
pub use inline::InlineSource;
pub use pagerduty::PagerdutySource;
