// oncall-server/src/approvals.rs
// ============================================================================
// Module: Approval Routes
// Description: List pending approvals and record operator decisions.
// Purpose: Expose the §6 approval queue operations over HTTP.
// Dependencies: axum, oncall-core
// ============================================================================

//! ## Overview
//! The approval queue's durable contract (§6) is "mutable only via
//! accept/reject"; these routes are the only HTTP-facing way to do that.
//! `GET /approvals` is read-only ambient plumbing for an operator dashboard —
//! not named in §6's route list, but directly backed by the
//! `ApprovalQueue::list_pending` operation the interfaces already define.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use oncall_core::ApprovalDecision;
use oncall_core::ApprovalId;
use oncall_core::ApprovalRequest;
use oncall_core::IncidentId;
use serde::Deserialize;
use tracing::warn;

use crate::state::AppState;

// ============================================================================
// SECTION: List
// ============================================================================

/// `GET /approvals` — every request still awaiting an operator decision.
pub async fn list_pending(State(state): State<AppState>) -> Result<Json<Vec<ApprovalRequest>>, StatusCode> {
    state.approvals.list_pending().await.map(Json).map_err(|err| {
        warn!(error = %err, "failed to list pending approvals");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

// ============================================================================
// SECTION: Decide
// ============================================================================

/// Request body for `POST /incidents/:incident_id/approvals/:approval_id/decide`.
#[derive(Debug, Deserialize)]
pub struct DecideRequest {
    /// The operator's decision; `pending` is rejected by the engine.
    pub decision: ApprovalDecision,
    /// Operator identity recorded against the decision.
    pub decided_by: String,
    /// Optional free-text rationale.
    pub comment: Option<String>,
}

/// `POST /incidents/:incident_id/approvals/:approval_id/decide`.
pub async fn decide(
    State(state): State<AppState>,
    Path((incident_id, approval_id)): Path<(String, String)>,
    Json(request): Json<DecideRequest>,
) -> StatusCode {
    let incident_id = IncidentId::new(incident_id);
    let approval_id = ApprovalId::new(approval_id);
    match state
        .engine
        .decide_approval(&incident_id, &approval_id, request.decision, &request.decided_by, request.comment)
        .await
    {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            warn!(%incident_id, %approval_id, error = %err, "approval decision failed");
            StatusCode::BAD_REQUEST
        }
    }
}
