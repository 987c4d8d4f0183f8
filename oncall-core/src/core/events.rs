// oncall-core/src/core/events.rs
// ============================================================================
// Module: Oncall Live Log Events
// Description: Event envelope published to operators as an incident progresses.
// Purpose: Define the at-most-once live-log stream contract (§6).
// Dependencies: crate::core::{identifiers, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! Every state transition the Incident State Machine makes emits one
//! [`LiveLogEvent`] to the `LiveLogPublisher` (`crate::interfaces`). Delivery
//! is at-most-once: a publisher failure is logged and dropped rather than
//! retried, since the audit log (`crate::core::audit`) is the durable record
//! and the live log exists only for operator visibility (§6).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::ActionId;
use crate::core::identifiers::IncidentId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Event Kind
// ============================================================================

/// The event types named in §6's live-log contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// A new incident was created from an ingested alert.
    IncidentCreated {
        /// Source the alert arrived from.
        source: String,
        /// Service named by the alert.
        service: String,
    },
    /// Context gathering finished; records how many adapters responded.
    ContextGathered {
        /// Count of adapters that returned `ok=true`.
        succeeded: usize,
        /// Count of adapters that returned `ok=false` or timed out.
        failed: usize,
    },
    /// The Analysis Engine produced a resolution plan.
    PlanProduced {
        /// Number of actions in the plan.
        action_count: usize,
    },
    /// An action was expanded into a concrete, dispatchable command.
    ActionPlanned {
        /// The action this event describes.
        action_ref: ActionId,
    },
    /// The Executor dispatched a command to an adapter.
    ActionExecuting {
        /// The action being executed.
        action_ref: ActionId,
    },
    /// The Executor reached a terminal status for a command.
    ActionCompleted {
        /// The action that completed.
        action_ref: ActionId,
        /// Terminal status, serialized from `ExecutionStatus`.
        status: String,
    },
    /// An approval request was raised and is awaiting an operator decision.
    ApprovalRequested {
        /// The action awaiting approval.
        action_ref: ActionId,
    },
    /// An operator decided a pending approval request.
    ApprovalDecided {
        /// The action that was decided.
        action_ref: ActionId,
        /// `approved` or `rejected`.
        decision: String,
    },
    /// The incident reached a terminal state.
    IncidentResolved {
        /// Terminal outcome, serialized from `TerminalOutcome`.
        outcome: String,
    },
    /// Free-form diagnostic detail that does not warrant its own variant.
    Note {
        /// Human-readable message.
        message: String,
        /// Optional structured detail.
        detail: Value,
    },
}

// ============================================================================
// SECTION: Event Envelope
// ============================================================================

/// A single published live-log event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveLogEvent {
    /// Incident this event describes.
    pub incident_id: IncidentId,
    /// Time the event was emitted.
    pub emitted_at: Timestamp,
    /// The event payload.
    pub kind: EventKind,
}

impl LiveLogEvent {
    /// Builds an event envelope for `incident_id` at `emitted_at`.
    #[must_use]
    pub const fn new(incident_id: IncidentId, emitted_at: Timestamp, kind: EventKind) -> Self {
        Self {
            incident_id,
            emitted_at,
            kind,
        }
    }
}
