// oncall-server/src/state.rs
// ============================================================================
// Module: Server State
// Description: Shared, cloneable handles every HTTP route needs.
// Purpose: Carry the engine and its durable stores into axum route handlers.
// Dependencies: oncall-core, axum, tokio
// ============================================================================

//! ## Overview
//! `AppState` is deliberately thin: the engine owns incident orchestration,
//! and this state exists only to route HTTP requests to it plus expose the
//! read-side operations (`list_pending`, `read_for_incident`) the engine
//! itself does not need to call but an operator-facing API does.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use oncall_broker::CloudwatchSource;
use oncall_broker::PagerdutySource;
use oncall_core::ApprovalQueue;
use oncall_core::AuditLog;
use oncall_core::IncidentEngine;
use oncall_core::IncidentStore;
use oncall_core::LiveLogEvent;
use tokio::sync::broadcast;
use tokio::sync::mpsc;

// ============================================================================
// SECTION: App State
// ============================================================================

/// Shared state injected into every route handler via `axum::extract::State`.
#[derive(Clone)]
pub struct AppState {
    /// The orchestrator every webhook and approval decision is routed through.
    pub engine: Arc<IncidentEngine>,
    /// Durable incident storage, for the read-only `GET /incidents/:id` route.
    pub store: Arc<dyn IncidentStore>,
    /// Durable audit trail, for the read-only audit route.
    pub audit: Arc<dyn AuditLog>,
    /// Durable approval queue, for the approval list/decide routes.
    pub approvals: Arc<dyn ApprovalQueue>,
    /// PagerDuty webhook payload parser.
    pub pagerduty_source: Arc<PagerdutySource>,
    /// CloudWatch (SNS-wrapped) webhook payload parser.
    pub cloudwatch_source: Arc<CloudwatchSource>,
    /// HMAC secret gating webhook ingress, per §6.
    pub webhook_secret: Option<Arc<str>>,
    /// Bounded ingest queue; a full queue yields `429` to the webhook caller.
    pub ingest: mpsc::Sender<IngestRequest>,
    /// Broadcast side of the live-log stream; `GET /events` subscribes here.
    pub live_log: broadcast::Sender<LiveLogEvent>,
}

/// One alert accepted by a webhook route, queued for the ingest worker.
pub struct IngestRequest {
    /// The parsed alert awaiting `IncidentEngine::handle_alert`.
    pub alert: oncall_core::Alert,
}
