// oncall-core/src/core/audit.rs
// ============================================================================
// Module: Oncall Audit Record
// Description: Append-only durable log of every command decision and dispatch.
// Purpose: Define the record written to `AuditLog` (§6), distinct from the
//          best-effort live log in `crate::core::events`.
// Dependencies: crate::core::{identifiers, plan, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! Where [`crate::core::events::LiveLogEvent`] is best-effort operator
//! visibility, [`AuditRecord`] is the durable, append-only trail an
//! `AuditLog` implementation (`crate::interfaces`) must persist before the
//! corresponding action is considered complete (§6). Every command the
//! Autonomy Gate admits, rejects, or suspends produces exactly one record.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ActionId;
use crate::core::identifiers::IncidentId;
use crate::core::plan::CommandSpec;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Actor
// ============================================================================

/// Who or what caused this audit record to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actor {
    /// The engine acted autonomously under the current `AutonomyMode`.
    System,
    /// A named operator made an approval decision or issued a manual override.
    Operator {
        /// Operator identity, typically an email address (§6).
        identity: String,
    },
}

// ============================================================================
// SECTION: Audit Outcome
// ============================================================================

/// Terminal result recorded against a command, once known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The command ran and its verification passed.
    Succeeded,
    /// The command ran but failed, or its verification failed.
    Failed,
    /// The command was not run; see the accompanying `SkipReason`.
    Skipped,
    /// The command was never admitted because it was classified forbidden.
    Rejected,
}

// ============================================================================
// SECTION: Audit Record
// ============================================================================

/// One append-only entry in the durable audit trail.
///
/// # Invariants
/// - Records are never mutated or deleted once appended; a later decision
///   about the same command (e.g. an approval outcome) is a new record.
/// - `result` is `None` exactly while the command is still in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Incident this record belongs to.
    pub incident_id: IncidentId,
    /// Time this record was written.
    pub timestamp: Timestamp,
    /// Who or what caused the record.
    pub actor: Actor,
    /// The action this record concerns.
    pub action_ref: ActionId,
    /// The command as classified and expanded at the time of this record.
    pub command: CommandSpec,
    /// Final outcome, once known.
    pub result: Option<AuditOutcome>,
}

impl AuditRecord {
    /// Builds a record for a command whose outcome is not yet known.
    #[must_use]
    pub const fn in_flight(
        incident_id: IncidentId,
        timestamp: Timestamp,
        actor: Actor,
        action_ref: ActionId,
        command: CommandSpec,
    ) -> Self {
        Self {
            incident_id,
            timestamp,
            actor,
            action_ref,
            command,
            result: None,
        }
    }

    /// Builds a record that already carries a terminal outcome.
    #[must_use]
    pub const fn terminal(
        incident_id: IncidentId,
        timestamp: Timestamp,
        actor: Actor,
        action_ref: ActionId,
        command: CommandSpec,
        result: AuditOutcome,
    ) -> Self {
        Self {
            incident_id,
            timestamp,
            actor,
            action_ref,
            command,
            result: Some(result),
        }
    }
}
