// oncall-core/src/core/incident.rs
// ============================================================================
// Module: Oncall Incident Model
// Description: The mutable, long-lived entity tracking one deduplicated problem.
// Purpose: Define incident state, context bundles, and the lifecycle state machine's data.
// Dependencies: crate::core::{alert, approval, execution, identifiers, plan, time}, serde
// ============================================================================

//! ## Overview
//! An [`Incident`] is created on ingest and mutated exclusively by the
//! Incident State Machine (`crate::runtime::engine`) in response to
//! sub-component events; every other component receives a read-only view and
//! returns deltas the state machine applies (§3 Ownership). This module
//! defines the entity and its lifecycle states; the transition rules
//! themselves live in `crate::runtime::engine`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::alert::Alert;
use crate::core::approval::ApprovalRequest;
use crate::core::execution::ExecutionRecord;
use crate::core::identifiers::AdapterName;
use crate::core::identifiers::Fingerprint;
use crate::core::identifiers::IncidentId;
use crate::core::plan::ResolutionPlan;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Context Bundle
// ============================================================================

/// Per-adapter result of a `fetch_context` call.
///
/// # Invariants
/// - Exactly one of `data` or `error` is meaningful: when `ok` is `false`,
///   `error` is populated and `data` is an empty object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextBundle {
    /// Name of the adapter that produced this bundle.
    pub adapter_name: AdapterName,
    /// Whether the fetch succeeded.
    pub ok: bool,
    /// Adapter-specific data, meaningful only when `ok`.
    pub data: Value,
    /// Error description, meaningful only when `!ok`.
    pub error: Option<String>,
    /// Wall-clock time the fetch took, in milliseconds.
    pub duration_ms: u64,
    /// Set when `data` was truncated against the adapter's output size cap.
    pub truncated: bool,
}

impl ContextBundle {
    /// Builds a successful bundle.
    #[must_use]
    pub fn ok(adapter_name: AdapterName, data: Value, duration_ms: u64, truncated: bool) -> Self {
        Self {
            adapter_name,
            ok: true,
            data,
            error: None,
            duration_ms,
            truncated,
        }
    }

    /// Builds a failed bundle (timeout, adapter error, or panic isolation).
    #[must_use]
    pub fn failed(adapter_name: AdapterName, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            adapter_name,
            ok: false,
            data: Value::Object(serde_json::Map::new()),
            error: Some(error.into()),
            duration_ms,
            truncated: false,
        }
    }
}

// ============================================================================
// SECTION: Lifecycle State
// ============================================================================

/// Incident lifecycle states (§4.7).
///
/// # Invariants
/// - `Resolved`, `Failed`, and `Abandoned` are terminal: once reached, the
///   incident becomes read-only except for retained audit history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentState {
    /// Alert accepted by ingress; dedup not yet evaluated.
    Received,
    /// Dedup key computed and checked against open incidents.
    Deduplicated,
    /// Context Aggregator fan-out in progress.
    ContextGathering,
    /// Analysis Engine request in flight.
    Analyzing,
    /// One or more commands are suspended pending operator approval.
    AwaitingApproval,
    /// Executor is running approved/auto commands.
    Executing,
    /// Verifier is checking post-conditions for completed commands.
    Verifying,
    /// Terminal: at least one verified successful execution, or the
    /// alerting subject is gone and an execution was attempted.
    Resolved,
    /// Terminal: no executable actions produced a verified success.
    Failed,
    /// Terminal: closed without remediation (`auto_recovered`, quiet-period timeout).
    Abandoned,
}

impl IncidentState {
    /// Returns true once the incident is read-only.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Failed | Self::Abandoned)
    }
}

/// Reason code attached to a terminal transition, for operator-facing display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalOutcome {
    /// At least one command executed and its verification passed.
    ResolvedExecuted,
    /// The alerting subject is gone and an execution was attempted.
    ResolvedSubjectGone,
    /// Analysis could not produce a plan (model timeout or unparseable response).
    AnalysisFailed,
    /// No executable actions survived planning (all forbidden, unresolved, or rejected).
    NoExecutableActions,
    /// Circuit breaker open for the remainder of the incident.
    CircuitOpen,
    /// Incident-level deadline elapsed.
    Timeout,
    /// An empty plan and no independent recovery signal; closed without action.
    AutoRecovered,
    /// Operator explicitly aborted the incident.
    OperatorAbort,
}

// ============================================================================
// SECTION: Incident
// ============================================================================

/// The internal, long-lived tracked object representing the handling of one
/// deduplicated problem.
///
/// # Invariants
/// - `fingerprint` is stable for the incident's lifetime; later alerts with a
///   matching fingerprint append to `alert_history` rather than mutating it.
/// - `context`, `plan`, and `executions` are append/replace-whole only; no
///   component but the state machine mutates them directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Internally-assigned, stable identifier.
    pub incident_id: IncidentId,
    /// The alert that created this incident.
    pub alert: Alert,
    /// Later alerts collapsed into this incident by dedup (§4.7).
    pub alert_history: Vec<Alert>,
    /// Deterministic dedup key derived from the originating alert.
    pub fingerprint: Fingerprint,
    /// Current lifecycle state.
    pub state: IncidentState,
    /// Time the incident was created.
    pub created_at: Timestamp,
    /// Time the incident was last mutated.
    pub updated_at: Timestamp,
    /// Per-adapter context gathered for this incident, keyed by adapter name.
    pub context: BTreeMap<String, ContextBundle>,
    /// The parsed remediation plan, once the Analysis Engine has produced one.
    pub plan: Option<ResolutionPlan>,
    /// Ordered sequence of execution attempts.
    pub executions: Vec<ExecutionRecord>,
    /// Approval requests raised for this incident's commands.
    pub approvals: Vec<ApprovalRequest>,
    /// Set once the incident reaches a terminal state.
    pub terminal_outcome: Option<TerminalOutcome>,
}

impl Incident {
    /// Creates a freshly-ingested incident in the `Received` state.
    #[must_use]
    pub fn new(incident_id: IncidentId, alert: Alert, fingerprint: Fingerprint, now: Timestamp) -> Self {
        Self {
            incident_id,
            alert,
            alert_history: Vec::new(),
            fingerprint,
            state: IncidentState::Received,
            created_at: now,
            updated_at: now,
            context: BTreeMap::new(),
            plan: None,
            executions: Vec::new(),
            approvals: Vec::new(),
            terminal_outcome: None,
        }
    }

    /// Returns true if at least one execution record satisfies the
    /// resolution invariant on its own (§8 property 1).
    #[must_use]
    pub fn has_verified_success(&self) -> bool {
        self.executions.iter().any(ExecutionRecord::is_verified_success)
    }

    /// Returns true if at least one command was actually dispatched to an
    /// adapter, used by the `resolved`-via-subject-gone rule (§4.7). A
    /// `Skipped`/`Rejected` record never reached an adapter (policy-forbidden,
    /// preview-only, or circuit-open) and so is not "an execution attempted"
    /// for this rule's purposes — §8's S3 scenario (a forbidden command and
    /// nothing else) must still resolve to `failed`, never a subject-gone
    /// `resolved`, even if the alerting subject happens to be gone too.
    #[must_use]
    pub fn has_attempted_execution(&self) -> bool {
        use crate::core::execution::ExecutionStatus;
        self.executions.iter().any(|e| {
            matches!(
                e.status,
                ExecutionStatus::Executing | ExecutionStatus::Succeeded | ExecutionStatus::Failed | ExecutionStatus::RolledBack
            )
        })
    }
}
