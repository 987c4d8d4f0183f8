// oncall-broker/src/source/cloudwatch.rs
// ============================================================================
// Module: Oncall CloudWatch Source
// Description: Parses an SNS-wrapped CloudWatch alarm payload into an `Alert`.
// Purpose: Back `POST /webhook/cloudwatch`.
// Dependencies: oncall-core, serde_json, time
// ============================================================================

//! ## Overview
//! CloudWatch alarms reach this engine through an SNS subscription, so the
//! request body is an SNS `Notification` envelope whose `Message` field is
//! itself a JSON string (not a nested object) containing the alarm state
//! change. This source unwraps both layers in one pass.

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
// SECTION: CloudWatch Source
// ============================================================================

/// Alert source for SNS-wrapped CloudWatch alarm payloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct CloudwatchSource;

impl CloudwatchSource {
    /// Creates a new CloudWatch source.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Source for CloudwatchSource {
    fn parse(&self, body: &[u8]) -> Result<Alert, SourceError> {
        let envelope: Value =
            serde_json::from_slice(body).map_err(|err| SourceError::Malformed(err.to_string()))?;
        let message = envelope
            .get("Message")
            .and_then(Value::as_str)
            .ok_or_else(|| SourceError::MissingField("Message".to_string()))?;
        let alarm: Value =
            serde_json::from_str(message).map_err(|err| SourceError::Malformed(err.to_string()))?;

        let alarm_name = alarm
            .get("AlarmName")
            .and_then(Value::as_str)
            .ok_or_else(|| SourceError::MissingField("AlarmName".to_string()))?;
        let description = alarm.get("AlarmDescription").and_then(Value::as_str).unwrap_or("no description provided");
        let reason = alarm.get("NewStateReason").and_then(Value::as_str).unwrap_or("state change reason not reported");
        let severity = match alarm.get("NewStateValue").and_then(Value::as_str) {
            Some("ALARM") => Severity::High,
            Some("INSUFFICIENT_DATA") => Severity::Medium,
            _ => Severity::Low,
        };
        let service = service_dimension(&alarm).unwrap_or_else(|| "unknown-service".to_string());

        let id = envelope
            .get("MessageId")
            .and_then(Value::as_str)
            .unwrap_or(alarm_name);

        let timestamp = alarm
            .get("StateChangeTime")
            .and_then(Value::as_str)
            .map(|state_change_time| {
                OffsetDateTime::parse(state_change_time, &Rfc3339).map(Timestamp::from_offset).map_err(|err| {
                    SourceError::InvalidField {
                        field: "StateChangeTime".to_string(),
                        reason: err.to_string(),
                    }
                })
            })
            .transpose()?
            .unwrap_or_else(Timestamp::now);

        Ok(Alert {
            id: AlertId::new(id),
            source: AlertOrigin::Cloudwatch,
            severity,
            title: alarm_name.to_string(),
            description: format!("{description}: {reason}"),
            service,
            timestamp,
            raw: envelope,
        })
    }
}

/// Extracts the service name from the alarm's metric dimensions, preferring
/// a dimension named `ServiceName` and falling back to the trigger's
/// namespace when no such dimension is present.
fn service_dimension(alarm: &Value) -> Option<String> {
    let trigger = alarm.get("Trigger")?;
    let dimensions = trigger.get("Dimensions").and_then(Value::as_array);
    if let Some(dimensions) = dimensions {
        for dimension in dimensions {
            if dimension.get("name").and_then(Value::as_str) == Some("ServiceName") {
                return dimension.get("value").and_then(Value::as_str).map(str::to_string);
            }
        }
    }
    trigger.get("Namespace").and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    //! Test-only lint relaxations for panic-based assertions.
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only panic-based assertions are permitted.")]

    use oncall_core::Severity;

    use super::CloudwatchSource;
    use crate::source::Source;

    fn envelope(new_state: &str) -> String {
        let message = serde_json::json!({
            "AlarmName": "high-cpu-payments",
            "AlarmDescription": "CPU over 90% for 5 minutes",
            "NewStateValue": new_state,
            "NewStateReason": "Threshold Crossed",
            "StateChangeTime": "2026-01-01T12:00:00Z",
            "Trigger": {
                "MetricName": "CPUUtilization",
                "Namespace": "AWS/ECS",
                "Dimensions": [{ "name": "ServiceName", "value": "payments-service" }]
            }
        });
        serde_json::json!({
            "Type": "Notification",
            "MessageId": "sns-msg-1",
            "Message": message.to_string(),
        })
        .to_string()
    }

    #[test]
    fn alarm_state_maps_to_high_severity() {
        let alert = CloudwatchSource::new().parse(envelope("ALARM").as_bytes()).expect("parses");
        assert_eq!(alert.severity, Severity::High);
        assert_eq!(alert.service, "payments-service");
        assert_eq!(alert.title, "high-cpu-payments");
    }

    #[test]
    fn ok_state_maps_to_low_severity() {
        let alert = CloudwatchSource::new().parse(envelope("OK").as_bytes()).expect("parses");
        assert_eq!(alert.severity, Severity::Low);
    }

    #[test]
    fn missing_message_field_is_rejected() {
        let body = serde_json::json!({ "Type": "Notification" });
        let result = CloudwatchSource::new().parse(body.to_string().as_bytes());
        assert!(result.is_err());
    }
}
