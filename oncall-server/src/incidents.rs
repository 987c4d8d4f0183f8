// oncall-server/src/incidents.rs
// ============================================================================
// Module: Incident Routes
// Description: Read one incident's current state.
// Purpose: Let an operator dashboard poll incident status without SSE.
// Dependencies: axum, oncall-core
// ============================================================================

//! ## Overview
//! Ambient read-side plumbing backed directly by `IncidentStore::load`; not
//! named in §6's route list, but a dashboard needs a way to fetch an
//! incident's current snapshot on first load, before any live-log events for
//! it have arrived over `GET /events`.

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use oncall_core::Incident;
use oncall_core::IncidentId;
use tracing::warn;

use crate::state::AppState;

/// `GET /incidents/:incident_id`.
pub async fn get(State(state): State<AppState>, Path(incident_id): Path<String>) -> Result<Json<Incident>, StatusCode> {
    let incident_id = IncidentId::new(incident_id);
    match state.store.load(&incident_id).await {
        Ok(Some(incident)) => Ok(Json(incident)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(err) => {
            warn!(%incident_id, error = %err, "failed to load incident");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
