// oncall-server/src/control.rs
// ============================================================================
// Module: Operator Control Routes
// Description: Emergency-stop toggle and circuit-breaker manual reset.
// Purpose: Expose the two process-wide safety controls §4.5/§4.6 describe
//          as operator-triggerable over HTTP, for the CLI and dashboard.
// Dependencies: axum, oncall-core
// ============================================================================

//! ## Overview
//! Neither route is named in §6's route list, but both back operations the
//! functional description calls out directly: "`emergency_stop=true`
//! unconditionally blocks all mutating work" (§4.5) needs an operator-facing
//! way to flip it without a full config reload, and "Manual reset is
//! permitted" (§4.6) needs a way to clear the breaker once the underlying
//! failure has been fixed out of band.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;

use crate::state::AppState;

// ============================================================================
// SECTION: Emergency Stop
// ============================================================================

/// Request body for `POST /emergency-stop`.
#[derive(Debug, Deserialize)]
pub struct EmergencyStopRequest {
    /// `true` to freeze all mutating work; `false` to clear the flag.
    pub stopped: bool,
}

/// Response body for `POST /emergency-stop` and `GET /emergency-stop`.
#[derive(Debug, Serialize)]
pub struct EmergencyStopResponse {
    /// The flag's value after the request was applied.
    pub stopped: bool,
}

/// `POST /emergency-stop` — flips `AutonomyConfig.emergency_stop` in place.
pub async fn set(State(state): State<AppState>, Json(request): Json<EmergencyStopRequest>) -> Json<EmergencyStopResponse> {
    state.engine.autonomy_config().set_emergency_stop(request.stopped);
    Json(EmergencyStopResponse { stopped: request.stopped })
}

/// `GET /emergency-stop` — reports the current flag value.
pub async fn get(State(state): State<AppState>) -> Json<EmergencyStopResponse> {
    let stopped = state.engine.autonomy_config().load().emergency_stop;
    Json(EmergencyStopResponse { stopped })
}

// ============================================================================
// SECTION: Circuit Breaker
// ============================================================================

/// `POST /circuit-breaker/reset` — manually closes the execution breaker.
pub async fn reset_circuit_breaker(State(state): State<AppState>) -> StatusCode {
    state.engine.reset_circuit_breaker();
    StatusCode::OK
}
