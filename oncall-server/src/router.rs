// oncall-server/src/router.rs
// ============================================================================
// Module: HTTP Router
// Description: Wires every route to its handler over one AppState.
// Purpose: Single assembly point for the server's HTTP surface.
// Dependencies: axum
// ============================================================================

//! ## Overview
//! Route paths named directly by §6 (`/webhook/pagerduty`,
//! `/webhook/cloudwatch`, `/healthz`) sit alongside the ambient operator
//! surface (`/events`, `/incidents/...`, `/approvals/...`) that the
//! interfaces already define operations for.

use axum::Router;
use axum::routing::get;
use axum::routing::post;

use crate::approvals;
use crate::audit;
use crate::control;
use crate::events;
use crate::healthz;
use crate::incidents;
use crate::state::AppState;
use crate::webhook;

/// Builds the full router over `state`.
#[must_use]
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/webhook/pagerduty", post(webhook::pagerduty))
        .route("/webhook/cloudwatch", post(webhook::cloudwatch))
        .route("/healthz", get(healthz::healthz))
        .route("/events", get(events::stream))
        .route("/incidents/{incident_id}", get(incidents::get))
        .route("/incidents/{incident_id}/audit", get(audit::read_for_incident))
        .route("/incidents/{incident_id}/approvals/{approval_id}/decide", post(approvals::decide))
        .route("/approvals", get(approvals::list_pending))
        .route("/emergency-stop", get(control::get).post(control::set))
        .route("/circuit-breaker/reset", post(control::reset_circuit_breaker))
        .with_state(state)
}
