// oncall-server/src/healthz.rs
// ============================================================================
// Module: Health Check
// Description: GET /healthz route handler.
// Purpose: Implement the §6 liveness contract.
// Dependencies: axum
// ============================================================================

//! ## Overview
//! Liveness only: this route reports the process is up and serving, not
//! that the engine's dependencies (store, model endpoint, cluster) are
//! reachable. Readiness is out of scope of the functional description.

use axum::http::StatusCode;

/// `GET /healthz`.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
