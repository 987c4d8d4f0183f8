// oncall-core/src/core/execution.rs
// ============================================================================
// Module: Oncall Execution Record
// Description: Per-command execution and verification outcomes.
// Purpose: Capture what the Executor did, observed, and verified for one command.
// Dependencies: crate::core::identifiers, crate::core::plan, crate::core::time, serde
// ============================================================================

//! ## Overview
//! Every [`CommandSpec`](crate::core::plan::CommandSpec) the Executor runs
//! produces exactly one [`ExecutionRecord`]. Rollbacks produce a second,
//! linked record rather than mutating the first — `rollback_ref` points from
//! the rolled-back record to the record that undid it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::ActionId;
use crate::core::identifiers::ExecutionId;
use crate::core::plan::CommandSpec;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Execution Status
// ============================================================================

/// Lifecycle status of one `ExecutionRecord`.
///
/// # Invariants
/// - `Skipped` and `Rejected` never transition to any executing state.
/// - Only `Executing` may transition to `Succeeded`, `Failed`, or `RolledBack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Queued but not yet dispatched to the adapter.
    Pending,
    /// Dispatched to the adapter; awaiting completion.
    Executing,
    /// Adapter call and verification both succeeded.
    Succeeded,
    /// Adapter call failed, or verification failed and no rollback recovered it.
    Failed,
    /// Verification failed and a rollback action ran to completion.
    RolledBack,
    /// Not executed; see the accompanying reason in the record's audit trail.
    Skipped,
    /// Never executed because the command was classified forbidden.
    Rejected,
}

impl ExecutionStatus {
    /// Returns true for terminal statuses that will not transition further.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed | Self::RolledBack | Self::Skipped | Self::Rejected
        )
    }
}

/// Stable reason codes attached to `Skipped`/`Rejected`/`Failed` records.
///
/// # Invariants
/// - Values match the reason vocabulary in §7 and §8 of the engine design so
///   that audit-log consumers can branch on a closed set of strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Autonomy Gate routed the action to `plan` mode.
    PlanMode,
    /// `AutonomyConfig.dry_run_mode` forced preview-only.
    DryRun,
    /// `AutonomyConfig.emergency_stop` was set.
    EmergencyStop,
    /// The command matched a denylist pattern.
    PolicyForbidden,
    /// The circuit breaker was open.
    CircuitOpen,
    /// A model-emitted placeholder could not be resolved against context.
    UnresolvedTarget,
    /// No adapter is registered for the command's `target_system`.
    AdapterNotRegistered,
    /// A placeholder resolved to more than one candidate and the action's
    /// risk level was too high to fan out across all of them.
    AmbiguousTarget,
    /// YOLO mode's confidence threshold rejected the action.
    ConfidenceBelowThreshold,
    /// An operator explicitly rejected a pending approval request.
    ApprovalRejected,
    /// The adapter's deadline elapsed before completion.
    Timeout,
}

// ============================================================================
// SECTION: Verification Result
// ============================================================================

/// Outcome of the post-execution verification predicate for one command.
///
/// # Invariants
/// - `passed=false` always counts toward the circuit breaker's failure tally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Human-readable description of what was checked.
    pub predicate: String,
    /// Observed state gathered while checking the predicate.
    pub observed: Value,
    /// Whether the predicate held.
    pub passed: bool,
    /// Wall-clock time spent polling for the predicate, in milliseconds.
    pub latency_ms: u64,
}

// ============================================================================
// SECTION: Execution Record
// ============================================================================

/// One attempted (or deliberately skipped) command execution.
///
/// # Invariants
/// - `finished_at >= started_at` whenever both are set.
/// - `status == Skipped || status == Rejected` implies `finished_at.is_none()`
///   is false only in the sense that skip is recorded instantaneously: both
///   timestamps are set equal at the moment of the skip decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Stable identifier for this record.
    pub execution_id: ExecutionId,
    /// The `ResolutionAction` this record was expanded from.
    pub action_ref: ActionId,
    /// The command that was (or would have been) executed.
    pub command: CommandSpec,
    /// Time the Executor took ownership of this command.
    pub started_at: Timestamp,
    /// Time the Executor reached a terminal status for this command.
    pub finished_at: Option<Timestamp>,
    /// Current lifecycle status.
    pub status: ExecutionStatus,
    /// Reason code, set whenever `status` is `Skipped`, `Rejected`, or `Failed`.
    pub reason: Option<SkipReason>,
    /// Captured standard output from the adapter, if any.
    pub stdout: String,
    /// Captured standard error from the adapter, if any.
    pub stderr: String,
    /// Post-condition check result, present once verification has run.
    pub verification: Option<VerificationResult>,
    /// Points to the `ExecutionRecord` that rolled this one back, if any.
    pub rollback_ref: Option<ExecutionId>,
}

impl ExecutionRecord {
    /// Returns true when this record satisfies the resolution invariant on
    /// its own: a successfully executed command with a passing verification.
    #[must_use]
    pub fn is_verified_success(&self) -> bool {
        self.status == ExecutionStatus::Succeeded
            && self.verification.as_ref().is_some_and(|v| v.passed)
    }
}

#[cfg(test)]
mod tests {
    use super::ExecutionStatus;

    #[test]
    fn terminal_statuses_are_exhaustive_for_non_executing() {
        assert!(!ExecutionStatus::Pending.is_terminal());
        assert!(!ExecutionStatus::Executing.is_terminal());
        assert!(ExecutionStatus::Succeeded.is_terminal());
        assert!(ExecutionStatus::Rejected.is_terminal());
    }
}
