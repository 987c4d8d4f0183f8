// oncall-server/src/ingest.rs
// ============================================================================
// Module: Ingest Worker
// Description: Background task draining the webhook ingest queue.
// Purpose: Decouple the webhook HTTP response from IncidentEngine processing.
// Dependencies: oncall-core, tokio
// ============================================================================

//! ## Overview
//! The webhook routes enqueue and return immediately (§6: "fire-and-forget
//! internally"); this worker is the other end, pulling one
//! [`crate::state::IngestRequest`] at a time and driving it through
//! `IncidentEngine::handle_alert`. A per-alert failure is logged and does not
//! stop the worker — a malformed or unlucky alert must not wedge the queue
//! for every incident behind it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use oncall_core::IncidentEngine;
use tokio::sync::mpsc::Receiver;
use tracing::error;
use tracing::info;

use crate::state::IngestRequest;

// ============================================================================
// SECTION: Worker Loop
// ============================================================================

/// Drains `receiver` until the sender side (held by every `AppState` clone)
/// is dropped, handling each alert against `engine` in turn.
pub async fn run(engine: Arc<IncidentEngine>, mut receiver: Receiver<IngestRequest>) {
    while let Some(request) = receiver.recv().await {
        let service = request.alert.service.clone();
        match engine.handle_alert(request.alert).await {
            Ok(incident_id) => info!(%incident_id, service, "alert routed to incident"),
            Err(err) => error!(error = %err, service, "failed to handle alert"),
        }
    }
}
