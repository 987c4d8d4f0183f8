// oncall-core/src/runtime/dedup.rs
// ============================================================================
// Module: Oncall Incident Deduplication
// Description: Fingerprint-based collapsing of repeated alerts into one incident.
// Purpose: Implement the ingress dedup step (§4.7, §8 property 3).
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! An incoming [`Alert`] either starts a new [`Incident`] or is folded into an
//! existing open one whose `fingerprint` matches. A fingerprint match against
//! a *terminal* incident starts a fresh incident instead: a resolved incident
//! recurring is a new problem, not a continuation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::Alert;
use crate::core::HashError;
use crate::core::Incident;
use crate::core::IncidentId;
use crate::core::Timestamp;
use crate::interfaces::IncidentStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Result of running the dedup step for one ingested alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupOutcome {
    /// No open incident shares this fingerprint; a new incident was created.
    Created(IncidentId),
    /// An open incident shares this fingerprint; the alert was folded into it.
    Folded(IncidentId),
}

/// Errors raised while deduplicating an alert.
#[derive(Debug, thiserror::Error)]
pub enum DedupError {
    /// The alert's fingerprint could not be computed.
    #[error(transparent)]
    Hashing(#[from] HashError),
    /// The incident store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Deduplication
// ============================================================================

/// Runs the dedup step: looks up an open incident by fingerprint, folding the
/// alert into it when it last updated within `window_seconds`, or creates a
/// fresh incident otherwise (§4.1: alerts older than the deduplication window
/// start a new incident rather than folding indefinitely).
///
/// # Errors
///
/// Returns [`DedupError`] if fingerprinting or the store lookup/write fails.
pub async fn deduplicate(
    store: &dyn IncidentStore,
    alert: Alert,
    new_incident_id: IncidentId,
    now: Timestamp,
    window_seconds: u64,
) -> Result<DedupOutcome, DedupError> {
    let fingerprint = alert.fingerprint()?;

    if let Some(mut existing) = store.find_open_by_fingerprint(&fingerprint).await? {
        let age_seconds = existing.updated_at.seconds_until(now);
        if age_seconds >= 0 && age_seconds <= window_seconds as i64 {
            existing.alert_history.push(alert);
            existing.updated_at = now;
            store.save(&existing).await?;
            return Ok(DedupOutcome::Folded(existing.incident_id));
        }
    }

    let incident = Incident::new(new_incident_id.clone(), alert, fingerprint, now);
    store.save(&incident).await?;
    Ok(DedupOutcome::Created(new_incident_id))
}

#[cfg(test)]
mod tests {
    use super::DedupOutcome;
    use super::deduplicate;
    use crate::core::Alert;
    use crate::core::AlertId;
    use crate::core::AlertSource;
    use crate::core::IncidentId;
    use crate::core::Severity;
    use crate::core::Timestamp;
    use crate::runtime::store::InMemoryIncidentStore;

    fn sample_alert(id: &str) -> Alert {
        Alert {
            id: AlertId::new(id),
            source: AlertSource::Cloudwatch,
            severity: Severity::High,
            title: "OOMKilled".to_string(),
            description: "payment-service pods restarting".to_string(),
            service: "payment-service".to_string(),
            timestamp: Timestamp::now(),
            raw: serde_json::json!({}),
        }
    }

    const WINDOW_SECONDS: u64 = 300;

    #[tokio::test]
    async fn second_alert_with_same_fingerprint_folds_into_first() {
        let store = InMemoryIncidentStore::new();
        let now = Timestamp::now();

        let first = deduplicate(&store, sample_alert("a1"), IncidentId::new("inc-1"), now, WINDOW_SECONDS)
            .await
            .expect("dedup succeeds");
        assert!(matches!(first, DedupOutcome::Created(_)));

        let second = deduplicate(&store, sample_alert("a2"), IncidentId::new("inc-2"), now, WINDOW_SECONDS)
            .await
            .expect("dedup succeeds");
        let DedupOutcome::Folded(folded_id) = second else {
            panic!("expected second alert to fold into the first incident");
        };
        let DedupOutcome::Created(first_id) = first else {
            unreachable!()
        };
        assert_eq!(folded_id, first_id);
    }

    #[tokio::test]
    async fn alert_outside_window_spawns_fresh_incident_instead_of_folding() {
        let store = InMemoryIncidentStore::new();
        let first_seen = Timestamp::now();

        let first = deduplicate(
            &store,
            sample_alert("a1"),
            IncidentId::new("inc-1"),
            first_seen,
            WINDOW_SECONDS,
        )
        .await
        .expect("dedup succeeds");
        let DedupOutcome::Created(first_id) = first else {
            unreachable!()
        };

        let stale = Timestamp::from_offset(first_seen.as_offset() + time::Duration::seconds(WINDOW_SECONDS as i64 + 1));

        let second = deduplicate(
            &store,
            sample_alert("a2"),
            IncidentId::new("inc-2"),
            stale,
            WINDOW_SECONDS,
        )
        .await
        .expect("dedup succeeds");
        let DedupOutcome::Created(second_id) = second else {
            panic!("expected an alert outside the dedup window to spawn a fresh incident");
        };
        assert_ne!(first_id, second_id);
    }
}
