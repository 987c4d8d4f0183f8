// oncall-broker/src/source/inline.rs
// ============================================================================
// Module: Oncall Inline Source
// Description: Direct-JSON alert source for manual ingestion and tests.
// Purpose: Deserialize an already-shaped `Alert` body verbatim.
// Dependencies: oncall-core, serde_json
// ============================================================================

//! ## Overview
//! [`InlineSource`] deserializes a body that already matches [`Alert`]'s own
//! JSON shape, with no field translation. It backs the operator CLI's manual
//! alert injection path and scenario tests that want full control over every
//! alert field rather than exercising a vendor payload translation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use oncall_core::Alert;

use crate::source::Source;
use crate::source::SourceError;

// ============================================================================
// SECTION: Inline Source
// ============================================================================

/// Alert source that deserializes its body directly as an [`Alert`].
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineSource;

impl InlineSource {
    /// Creates a new inline source.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Source for InlineSource {
    fn parse(&self, body: &[u8]) -> Result<Alert, SourceError> {
        serde_json::from_slice(body).map_err(|err| SourceError::Malformed(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    //! Test-only lint relaxations for panic-based assertions.
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic_in_result_fn,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use oncall_core::AlertSource as AlertOrigin;
    use oncall_core::Severity;

    use super::InlineSource;
    use crate::source::Source;

    #[test]
    fn parses_a_well_formed_alert_body() {
        let body = serde_json::json!({
            "id": "manual-1",
            "source": "manual",
            "severity": "high",
            "title": "manual paging test",
            "description": "operator-triggered drill",
            "service": "payments",
            "timestamp": "2026-01-01T00:00:00Z",
            "raw": {}
        });
        let alert = InlineSource::new().parse(body.to_string().as_bytes()).expect("parses");
        assert_eq!(alert.source, AlertOrigin::Manual);
        assert_eq!(alert.severity, Severity::High);
        assert_eq!(alert.service, "payments");
    }

    #[test]
    fn rejects_a_body_missing_required_fields() {
        let body = serde_json::json!({ "id": "manual-2" });
        let result = InlineSource::new().parse(body.to_string().as_bytes());
        assert!(result.is_err());
    }
}
