// oncall-server/src/webhook.rs
// ============================================================================
// Module: Webhook Ingress
// Description: POST /webhook/{pagerduty,cloudwatch} route handlers.
// Purpose: Implement the §6 ingress response contract.
// Dependencies: axum, oncall-broker, oncall-core
// ============================================================================

//! ## Overview
//! Both routes share one pipeline: verify the HMAC signature (§6), parse the
//! vendor payload into an [`oncall_core::Alert`] via the matching
//! `oncall_broker::Source`, then enqueue it for the background ingest worker
//! (`crate::ingest`) rather than awaiting `IncidentEngine::handle_alert`
//! inline — the response contract is fire-and-forget, and a slow context
//! fan-out must not hold the HTTP connection open.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use bytes::Bytes;
use oncall_broker::Source;
use oncall_broker::SourceError;
use tracing::warn;

use crate::auth;
use crate::state::AppState;
use crate::state::IngestRequest;

// ============================================================================
// SECTION: Routes
// ============================================================================

/// `POST /webhook/pagerduty`.
pub async fn pagerduty(state: State<AppState>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let source = state.pagerduty_source.clone();
    ingest(state, headers, body, source.as_ref(), "pagerduty").await
}

/// `POST /webhook/cloudwatch`.
pub async fn cloudwatch(state: State<AppState>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let source = state.cloudwatch_source.clone();
    ingest(state, headers, body, source.as_ref(), "cloudwatch").await
}

/// Shared ingress pipeline: authenticate, parse, enqueue.
async fn ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
    source: &dyn Source,
    route: &'static str,
) -> (StatusCode, &'static str) {
    let secret = state.webhook_secret.as_deref();
    let signature = headers.get(auth::SIGNATURE_HEADER).and_then(|value| value.to_str().ok());
    if !auth::verify(secret, &body, signature) {
        warn!(route, "rejected webhook request: signature validation failed");
        return (StatusCode::UNAUTHORIZED, "signature validation failed");
    }
    auth::warn_if_unconfigured(secret, route);

    let alert = match source.parse(&body) {
        Ok(alert) => alert,
        Err(err) => {
            warn!(route, error = %err, "rejected webhook request: payload did not parse");
            return (
                StatusCode::BAD_REQUEST,
                match err {
                    SourceError::Malformed(_) => "malformed json payload",
                    SourceError::MissingField(_) => "missing required field",
                    SourceError::InvalidField { .. } => "invalid field value",
                },
            );
        }
    };

    match state.ingest.try_send(IngestRequest { alert }) {
        Ok(()) => (StatusCode::ACCEPTED, "accepted"),
        Err(_) => {
            warn!(route, "rejected webhook request: ingest queue is full");
            (StatusCode::TOO_MANY_REQUESTS, "ingest queue full, retry with backoff")
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
