// oncall-core/src/runtime/executor.rs
// ============================================================================
// Module: Oncall Executor
// Description: Drives one gated command through audit, dispatch, and the breaker.
// Purpose: Implement §4.6's per-command execution contract.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The Executor owns exactly one concern per command: append the pre-flight
//! audit record, dispatch to the named adapter (which performs its own
//! post-condition verification — see [`crate::interfaces::IntegrationAdapter`]),
//! append the terminal audit record, and feed the outcome to the
//! [`CircuitBreakerState`]. Commands that the Autonomy Gate routed to preview
//! or approval never reach this module; [`skip`] builds the equivalent
//! `Skipped`/`Rejected` record for those paths so every command still
//! produces exactly one [`ExecutionRecord`] (§4.6).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::ActionId;
use crate::core::Actor;
use crate::core::AuditOutcome;
use crate::core::AuditRecord;
use crate::core::CircuitBreakerState;
use crate::core::CommandSpec;
use crate::core::ExecutionId;
use crate::core::ExecutionRecord;
use crate::core::ExecutionStatus;
use crate::core::IncidentId;
use crate::core::SkipReason;
use crate::core::Timestamp;
use crate::interfaces::ActionParams;
use crate::interfaces::AdapterError;
use crate::interfaces::AuditLog;
use crate::interfaces::IntegrationAdapter;
use crate::interfaces::StoreError;

/// Errors raised while executing one command.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// The audit log rejected an append.
    #[error(transparent)]
    Audit(#[from] StoreError),
}

/// Builds the `Skipped`/`Rejected` record for a command the Autonomy Gate
/// routed away from execution, still appending the matching audit trail
/// (§4.6: every command produces exactly one record, executed or not).
///
/// # Errors
///
/// Returns [`ExecutorError`] if the audit append fails.
pub async fn skip(
    incident_id: &IncidentId,
    action_ref: ActionId,
    command: CommandSpec,
    reason: SkipReason,
    next_execution_id: impl FnOnce() -> ExecutionId,
    audit: &dyn AuditLog,
    now: Timestamp,
) -> Result<ExecutionRecord, ExecutorError> {
    let status = if command.forbidden {
        ExecutionStatus::Rejected
    } else {
        ExecutionStatus::Skipped
    };
    let outcome = if status == ExecutionStatus::Rejected {
        AuditOutcome::Rejected
    } else {
        AuditOutcome::Skipped
    };

    audit
        .append(&AuditRecord::terminal(
            incident_id.clone(),
            now,
            Actor::System,
            action_ref.clone(),
            command.clone(),
            outcome,
        ))
        .await?;

    Ok(ExecutionRecord {
        execution_id: next_execution_id(),
        action_ref,
        command,
        started_at: now,
        finished_at: Some(now),
        status,
        reason: Some(reason),
        stdout: String::new(),
        stderr: String::new(),
        verification: None,
        rollback_ref: None,
    })
}

/// Dispatches one approved command to its target adapter, appending audit
/// records before and after, and updating the circuit breaker from the
/// outcome (§4.6, §8 property 6).
///
/// `actor` is `Actor::System` for auto-executed commands and
/// `Actor::Operator` for approval-decided ones.
///
/// # Errors
///
/// Returns [`ExecutorError`] if the audit log fails; adapter failures are
/// captured in the returned [`ExecutionRecord`] instead of raised, since a
/// failed remediation is a normal, auditable outcome rather than a bug.
pub async fn execute(
    incident_id: &IncidentId,
    action_ref: ActionId,
    command: CommandSpec,
    adapters: &BTreeMap<String, Arc<dyn IntegrationAdapter>>,
    audit: &dyn AuditLog,
    actor: Actor,
    circuit: &mut CircuitBreakerState,
    next_execution_id: impl FnOnce() -> ExecutionId,
    now: Timestamp,
) -> Result<ExecutionRecord, ExecutorError> {
    audit
        .append(&AuditRecord::in_flight(
            incident_id.clone(),
            now,
            actor.clone(),
            action_ref.clone(),
            command.clone(),
        ))
        .await?;

    let execution_id = next_execution_id();
    let adapter = adapters.get(command.target_system.as_str()).cloned();

    let record = match adapter {
        None => ExecutionRecord {
            execution_id,
            action_ref: action_ref.clone(),
            command: command.clone(),
            started_at: now,
            finished_at: Some(now),
            status: ExecutionStatus::Failed,
            reason: Some(SkipReason::AdapterNotRegistered),
            stdout: String::new(),
            stderr: format!("no adapter registered for {}", command.target_system),
            verification: None,
            rollback_ref: None,
        },
        Some(adapter) => {
            let params = ActionParams {
                args: command.args.clone(),
                dry_run: command.dry_run,
                deadline_ms: 30_000,
            };
            match adapter
                .execute_action(command.verb.clone().into(), &params)
                .await
            {
                Ok(mut record) => {
                    record.execution_id = execution_id;
                    record.action_ref = action_ref.clone();
                    record
                }
                Err(err) => ExecutionRecord {
                    execution_id,
                    action_ref: action_ref.clone(),
                    command: command.clone(),
                    started_at: now,
                    finished_at: Some(now),
                    status: ExecutionStatus::Failed,
                    reason: execution_reason(&err),
                    stdout: String::new(),
                    stderr: err.to_string(),
                    verification: None,
                    rollback_ref: None,
                },
            }
        }
    };

    let outcome = match record.status {
        ExecutionStatus::Succeeded if record.is_verified_success() => {
            circuit.record_success(now);
            AuditOutcome::Succeeded
        }
        ExecutionStatus::Succeeded => {
            circuit.record_failure(now);
            AuditOutcome::Failed
        }
        ExecutionStatus::RolledBack => {
            circuit.record_failure(now);
            AuditOutcome::Failed
        }
        _ => {
            circuit.record_failure(now);
            AuditOutcome::Failed
        }
    };

    audit
        .append(&AuditRecord::terminal(
            incident_id.clone(),
            now,
            actor,
            action_ref,
            command,
            outcome,
        ))
        .await?;

    Ok(record)
}

/// Maps an `AdapterError` to the `SkipReason` vocabulary used for failed,
/// non-bubbled execution outcomes.
const fn execution_reason(err: &AdapterError) -> Option<SkipReason> {
    match err {
        AdapterError::Transient(_) => Some(SkipReason::Timeout),
        AdapterError::Forbidden(_) => Some(SkipReason::PolicyForbidden),
        AdapterError::Unsupported(_) | AdapterError::Semantic(_) => None,
    }
}
