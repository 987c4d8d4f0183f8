// oncall-server/src/audit.rs
// ============================================================================
// Module: Audit Routes
// Description: Read the durable audit trail for one incident.
// Purpose: Give operators the "full audit log, not just the terminal state"
//          visibility §7 requires.
// Dependencies: axum, oncall-core
// ============================================================================

//! ## Overview
//! Ambient plumbing, not named in §6's route list: the interfaces already
//! define `AuditLog::read_for_incident`, and §7 states operators "always
//! receive the full audit log", so this route exposes that operation rather
//! than leaving it reachable only from the process that embeds the store.

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use oncall_core::AuditRecord;
use oncall_core::IncidentId;
use tracing::warn;

use crate::state::AppState;

/// `GET /incidents/:incident_id/audit`.
pub async fn read_for_incident(
    State(state): State<AppState>,
    Path(incident_id): Path<String>,
) -> Result<Json<Vec<AuditRecord>>, StatusCode> {
    let incident_id = IncidentId::new(incident_id);
    state.audit.read_for_incident(&incident_id).await.map(Json).map_err(|err| {
        warn!(%incident_id, error = %err, "failed to read audit trail");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
