// oncall-adapters/src/pagerduty.rs
// ============================================================================
// Module: PagerDuty Dispatcher
// Description: Notifies PagerDuty of incident lifecycle transitions.
// Purpose: Implement IncidentManagementDispatcher against PagerDuty's REST
//          and Events APIs (§4.7).
// Dependencies: oncall-core, reqwest
// ============================================================================

//! ## Overview
//! [`PagerdutyDispatcher`] never plans a command against PagerDuty — it only
//! acknowledges, resolves, and escalates the upstream incident that an
//! `Alert` originated from, using `incident_id` as the PagerDuty incident id.
//! Finalization errors from this module must never revert an incident's
//! decided terminal state (§4.7); callers log and move on, so every method
//! here returns a plain [`DispatchError`] rather than anything retryable.

use async_trait::async_trait;
use oncall_core::DispatchError;
use oncall_core::IncidentId;
use oncall_core::IncidentManagementDispatcher;
use serde_json::json;

use crate::http::build_client;

const REST_BASE: &str = "https://api.pagerduty.com";
const EVENTS_URL: &str = "https://events.pagerduty.com/v2/enqueue";

/// `IncidentManagementDispatcher` backed by PagerDuty.
pub struct PagerdutyDispatcher {
    client: reqwest::Client,
    /// REST API token (`INCIDENT_MANAGEMENT_API_KEY`).
    api_key: String,
    /// Acting-as email required by PagerDuty's `From` header.
    user_email: String,
    /// Events API v2 routing key, reused to escalate via re-trigger when set.
    routing_key: Option<String>,
    /// REST API base, overridable for EU data residency and tests.
    rest_base: String,
    /// Events API v2 endpoint, overridable for EU data residency and tests.
    events_url: String,
}

impl PagerdutyDispatcher {
    /// Builds a dispatcher authenticated with `api_key`/`user_email`, pointed
    /// at the standard US PagerDuty hosts.
    ///
    /// # Errors
    ///
    /// Returns a `reqwest::Error` if the TLS backend fails to initialize.
    pub fn new(
        api_key: String,
        user_email: String,
        routing_key: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        Self::with_hosts(api_key, user_email, routing_key, REST_BASE.to_string(), EVENTS_URL.to_string())
    }

    /// Builds a dispatcher against explicit REST/Events hosts, for EU data
    /// residency (`api.eu.pagerduty.com`) or pointing at a test server.
    ///
    /// # Errors
    ///
    /// Returns a `reqwest::Error` if the TLS backend fails to initialize.
    pub fn with_hosts(
        api_key: String,
        user_email: String,
        routing_key: Option<String>,
        rest_base: String,
        events_url: String,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self { client: build_client()?, api_key, user_email, routing_key, rest_base, events_url })
    }

    /// Updates the incident's status field via the REST API.
    async fn set_status(&self, incident_id: &IncidentId, status: &str) -> Result<(), DispatchError> {
        let url = format!("{}/incidents/{}", self.rest_base, incident_id.as_str());
        let body = json!({ "incident": { "type": "incident_reference", "status": status } });
        let response = self
            .client
            .put(&url)
            .header("Authorization", format!("Token token={}", self.api_key))
            .header("From", &self.user_email)
            .header("Accept", "application/vnd.pagerduty+json;version=2")
            .json(&body)
            .send()
            .await
            .map_err(|err| DispatchError::Failed(err.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(DispatchError::Failed(format!("pagerduty returned {}", response.status())))
        }
    }
}

#[async_trait]
impl IncidentManagementDispatcher for PagerdutyDispatcher {
    async fn acknowledge(&self, incident_id: &IncidentId) -> Result<(), DispatchError> {
        self.set_status(incident_id, "acknowledged").await
    }

    async fn resolve(&self, incident_id: &IncidentId) -> Result<(), DispatchError> {
        self.set_status(incident_id, "resolved").await
    }

    async fn escalate(&self, incident_id: &IncidentId, reason: &str) -> Result<(), DispatchError> {
        // The REST API has no direct "escalate" verb; re-triggering the same
        // dedup key through the Events API v2 bumps the incident back to
        // triggered and carries the reason into a fresh alert, which is what
        // actually pages the next escalation tier.
        let Some(routing_key) = &self.routing_key else {
            return Err(DispatchError::Failed("no events routing key configured for escalation".to_string()));
        };
        let payload = json!({
            "routing_key": routing_key,
            "event_action": "trigger",
            "dedup_key": incident_id.as_str(),
            "payload": {
                "summary": format!("escalated: {reason}"),
                "severity": "critical",
                "source": "oncall-engine",
            }
        });
        let response = self
            .client
            .post(&self.events_url)
            .json(&payload)
            .send()
            .await
            .map_err(|err| DispatchError::Failed(err.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(DispatchError::Failed(format!("pagerduty events api returned {}", response.status())))
        }
    }
}
