// oncall-broker/src/source/pagerduty.rs
// ============================================================================
// Module: Oncall PagerDuty Source
// Description: Parses a PagerDuty webhook v3 payload into an `Alert`.
// Purpose: Back `POST /webhook/pagerduty`.
// Dependencies: oncall-core, serde_json, time
// ============================================================================

//! ## Overview
//! PagerDuty's webhook v3 payload wraps the triggering incident under
//! `event.data`. Urgency, not severity, is PagerDuty's own field name for
//! this concept and only takes the values `high`/`low`; this source maps
//! `high` to [`Severity::High`] and anything else to [`Severity::Medium`],
//! since PagerDuty's own escalation policies already absorbed the
//! low/medium distinction before the alert reached this engine.

// ============================================================================
// SECTION: Imports
// ============================================================================

use oncall_core::Alert;
use oncall_core::AlertId;
use oncall_core::AlertSource as AlertOrigin;
use oncall_core::Severity;
use oncall_core::Timestamp;
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::source::Source;
use crate::source::SourceError;

// ============================================================================
// SECTION: PagerDuty Source
// ============================================================================

/// Alert source for PagerDuty webhook v3 payloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct PagerdutySource;

impl PagerdutySource {
    /// Creates a new PagerDuty source.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Source for PagerdutySource {
    fn parse(&self, body: &[u8]) -> Result<Alert, SourceError> {
        let root: Value =
            serde_json::from_slice(body).map_err(|err| SourceError::Malformed(err.to_string()))?;
        let data = root
            .get("event")
            .and_then(|event| event.get("data"))
            .ok_or_else(|| SourceError::MissingField("event.data".to_string()))?;

        let id = data
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| SourceError::MissingField("event.data.id".to_string()))?;
        let title = data
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("untitled pagerduty incident");
        let service = data
            .get("service")
            .and_then(|service| service.get("summary"))
            .and_then(Value::as_str)
            .unwrap_or("unknown-service");
        let status = data.get("status").and_then(Value::as_str).unwrap_or("triggered");
        let severity = match data.get("urgency").and_then(Value::as_str) {
            Some("high") => Severity::High,
            _ => Severity::Medium,
        };

        let timestamp = root
            .get("event")
            .and_then(|event| event.get("occurred_at"))
            .and_then(Value::as_str)
            .map(|occurred_at| {
                OffsetDateTime::parse(occurred_at, &Rfc3339).map(Timestamp::from_offset).map_err(|err| {
                    SourceError::InvalidField {
                        field: "event.occurred_at".to_string(),
                        reason: err.to_string(),
                    }
                })
            })
            .transpose()?
            .unwrap_or_else(Timestamp::now);

        Ok(Alert {
            id: AlertId::new(id),
            source: AlertOrigin::Pagerduty,
            severity,
            title: title.to_string(),
            description: format!("pagerduty incident status: {status}"),
            service: service.to_string(),
            timestamp,
            raw: root,
        })
    }
}
