// oncall-core/src/core/approval.rs
// ============================================================================
// Module: Oncall Approval Queue Model
// Description: Human-in-the-loop approval requests emitted by the Autonomy Gate.
// Purpose: Define the mutable-by-decision-only record backing the approval queue.
// Dependencies: crate::core::identifiers, crate::core::plan, crate::core::time, serde
// ============================================================================

//! ## Overview
//! When the Autonomy Gate routes a command to approval mode it emits one
//! [`ApprovalRequest`] and suspends that command. The request is mutable only
//! through [`ApprovalDecision`] transitions (accept/reject); while
//! `emergency_stop` is set, pending requests are frozen and must not be
//! decided either way.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ActionId;
use crate::core::identifiers::ApprovalId;
use crate::core::identifiers::CommandId;
use crate::core::identifiers::IncidentId;
use crate::core::plan::CommandSpec;
use crate::core::plan::RiskLevel;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Approval Decision
// ============================================================================

/// Decision state of an `ApprovalRequest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    /// Awaiting an operator decision.
    Pending,
    /// Operator approved the command; the Executor may proceed.
    Approved,
    /// Operator rejected the command; it will not run.
    Rejected,
}

// ============================================================================
// SECTION: Approval Request
// ============================================================================

/// A command suspended pending operator approval.
///
/// # Invariants
/// - `decision` starts `Pending` and transitions exactly once to `Approved`
///   or `Rejected`.
/// - `decided_by`/`decided_at` are set together, only when `decision != Pending`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Stable identifier for this request.
    pub id: ApprovalId,
    /// Incident this request belongs to.
    pub incident_id: IncidentId,
    /// The action this command was expanded from.
    pub action_ref: ActionId,
    /// The specific expanded command this request covers. An action that
    /// fanned out into several candidate commands (an ambiguous placeholder,
    /// §4.4) produces one `ApprovalRequest` per command, distinguished by
    /// this id rather than by `action_ref` alone.
    pub command_id: CommandId,
    /// Fully-expanded command, stringified for operator review.
    pub command_preview: String,
    /// Risk level carried over from the command's classification.
    pub risk_level: RiskLevel,
    /// Confidence carried over from the originating action.
    pub confidence: f64,
    /// Time the request was created.
    pub requested_at: Timestamp,
    /// Current decision state.
    pub decision: ApprovalDecision,
    /// Operator identity that made the decision, once decided.
    pub decided_by: Option<String>,
    /// Time the decision was made, once decided.
    pub decided_at: Option<Timestamp>,
    /// Optional operator comment accompanying the decision.
    pub comment: Option<String>,
}

impl ApprovalRequest {
    /// Builds a new request from a command awaiting approval.
    #[must_use]
    pub fn new(
        id: ApprovalId,
        incident_id: IncidentId,
        action_ref: ActionId,
        command: &CommandSpec,
        confidence: f64,
        requested_at: Timestamp,
    ) -> Self {
        Self {
            id,
            incident_id,
            action_ref,
            command_id: command.command_id.clone(),
            command_preview: command_preview(command),
            risk_level: command.classified_risk,
            confidence,
            requested_at,
            decision: ApprovalDecision::Pending,
            decided_by: None,
            decided_at: None,
            comment: None,
        }
    }

    /// Applies an operator decision.
    ///
    /// # Errors
    ///
    /// Returns an error if the request has already been decided.
    pub fn decide(
        &mut self,
        decision: ApprovalDecision,
        decided_by: impl Into<String>,
        decided_at: Timestamp,
        comment: Option<String>,
    ) -> Result<(), ApprovalError> {
        if self.decision != ApprovalDecision::Pending {
            return Err(ApprovalError::AlreadyDecided);
        }
        if decision == ApprovalDecision::Pending {
            return Err(ApprovalError::InvalidDecision);
        }
        self.decision = decision;
        self.decided_by = Some(decided_by.into());
        self.decided_at = Some(decided_at);
        self.comment = comment;
        Ok(())
    }
}

/// Renders a command as an operator-facing preview string.
///
/// Falls back to the verb and target alone if the argument payload cannot be
/// serialized, which should not happen for the `serde_json::Value` produced
/// by the Planner.
fn command_preview(command: &CommandSpec) -> String {
    let args = serde_json::to_string(&command.args).unwrap_or_else(|_| "{}".to_string());
    format!(
        "{}.{}({args}){}",
        command.target_system,
        command.verb,
        if command.dry_run { " [dry-run]" } else { "" }
    )
}

/// Errors raised while deciding an `ApprovalRequest`.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    /// The request already carries a terminal decision.
    #[error("approval request already decided")]
    AlreadyDecided,
    /// Attempted to decide back to `Pending`, which is not a valid decision.
    #[error("pending is not a valid decision outcome")]
    InvalidDecision,
}
