// oncall-core/src/core/alert.rs
// ============================================================================
// Module: Oncall Alert Model
// Description: Ingress-side alert payload and its fingerprinting rule.
// Purpose: Define the immutable external event that seeds an incident.
// Dependencies: crate::core::hashing, crate::core::identifiers, serde, serde_json
// ============================================================================

//! ## Overview
//! An [`Alert`] is the immutable, externally-assigned event that arrives over
//! the webhook ingress. It is never mutated after ingest; repeated arrivals of
//! the same external `id`, or of a different `id` with the same
//! [`Fingerprint`], are folded into an existing incident rather than creating
//! a new one. See [`fingerprint`] for the exact dedup key derivation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::hash_canonical_json;
use crate::core::identifiers::AlertId;
use crate::core::identifiers::Fingerprint;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Alert Source and Severity
// ============================================================================

/// Origin system that produced an [`Alert`].
///
/// # Invariants
/// - Variants are stable for serialization and webhook-route dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSource {
    /// Arrived via `POST /webhook/pagerduty`.
    Pagerduty,
    /// Arrived via `POST /webhook/cloudwatch` (SNS-wrapped CloudWatch alarm).
    Cloudwatch,
    /// Entered through the operator CLI or API rather than a webhook.
    Manual,
}

/// Severity as reported by the origin system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Lowest severity; informational.
    Low,
    /// Degraded but non-urgent.
    Medium,
    /// Urgent, service-impacting.
    High,
    /// Highest severity; outage-level.
    Critical,
}

// ============================================================================
// SECTION: Alert
// ============================================================================

/// Externally-originated incident notification payload.
///
/// # Invariants
/// - `id` uniquely identifies an external event within its `source`.
/// - Immutable once constructed; later arrivals of the same signal produce a
///   new `Alert` appended to an incident's alert history rather than mutating
///   this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Externally-assigned identifier, opaque to this engine.
    pub id: AlertId,
    /// Origin system.
    pub source: AlertSource,
    /// Severity as reported by the origin system.
    pub severity: Severity,
    /// Short human-readable title.
    pub title: String,
    /// Longer human-readable description.
    pub description: String,
    /// Free-form string identifying the owning service.
    pub service: String,
    /// Time the alert was observed by the origin system.
    pub timestamp: Timestamp,
    /// Opaque, semi-structured payload as received from the origin system.
    pub raw: Value,
}

impl Alert {
    /// Computes the deterministic dedup key for this alert.
    ///
    /// # Errors
    ///
    /// Returns an error only if `raw` cannot be canonicalized, which would
    /// indicate a non-JSON-serializable value and is not expected in practice
    /// since `raw` originates from `serde_json` deserialization.
    pub fn fingerprint(&self) -> Result<Fingerprint, crate::core::hashing::HashError> {
        fingerprint(self.source, &self.service, &self.signature())
    }

    /// Derives the dedup signature: the alert's title, stripped of the parts
    /// of a title that vary run-to-run (pod suffixes, timestamps embedded in
    /// free text are intentionally *not* stripped here — that normalization
    /// is a known open question, see `DESIGN.md`).
    fn signature(&self) -> String {
        format!("{}|{}", self.title, self.description)
    }
}

/// Computes the dedup fingerprint for `(source, service, signature)`.
///
/// The fingerprint intentionally excludes `id` and `timestamp`: two alerts
/// fired moments apart by different monitors for the same underlying problem
/// must collapse into one incident.
///
/// # Errors
///
/// Returns an error if canonical-JSON hashing fails.
pub fn fingerprint(
    source: AlertSource,
    service: &str,
    signature: &str,
) -> Result<Fingerprint, crate::core::hashing::HashError> {
    let key = serde_json::json!({
        "source": source,
        "service": service,
        "signature": signature,
    });
    let digest = hash_canonical_json(DEFAULT_HASH_ALGORITHM, &key)?;
    Ok(Fingerprint::new(digest.value))
}

#[cfg(test)]
mod tests {
    use super::Alert;
    use super::AlertSource;
    use super::Severity;
    use crate::core::identifiers::AlertId;
    use crate::core::time::Timestamp;

    fn sample(id: &str, title: &str) -> Alert {
        Alert {
            id: AlertId::new(id),
            source: AlertSource::Cloudwatch,
            severity: Severity::High,
            title: title.to_string(),
            description: "OOMKilled on payment-service pods".to_string(),
            service: "payment-service".to_string(),
            timestamp: Timestamp::now(),
            raw: serde_json::json!({}),
        }
    }

    #[test]
    fn same_signature_and_service_fingerprint_equal_regardless_of_id() {
        let a = sample("alert-1", "OOMKilled");
        let b = sample("alert-2", "OOMKilled");
        assert_eq!(
            a.fingerprint().expect("hash"),
            b.fingerprint().expect("hash")
        );
    }

    #[test]
    fn different_service_fingerprints_differ() {
        let a = sample("alert-1", "OOMKilled");
        let mut b = sample("alert-1", "OOMKilled");
        b.service = "checkout-service".to_string();
        assert_ne!(
            a.fingerprint().expect("hash"),
            b.fingerprint().expect("hash")
        );
    }
}
