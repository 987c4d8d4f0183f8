// oncall-core/src/core/mod.rs
// ============================================================================
// Module: Oncall Core Types
// Description: Canonical alert, incident, plan, and policy schema.
// Purpose: Provide stable, serializable types shared by every oncall crate.
// Dependencies: oncall-logic, serde
// ============================================================================

//! ## Overview
//! Oncall core types define the alert/incident data model, the resolution
//! plan and command schema produced by the Analysis Engine, the autonomy
//! policy consulted by the Autonomy Gate, and the durable and best-effort
//! logging records. These types are the canonical source of truth for every
//! derived API surface (HTTP webhook ingress, CLI, SQLite persistence).

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod alert;
pub mod approval;
pub mod audit;
pub mod autonomy;
pub mod circuit;
pub mod events;
pub mod execution;
pub mod hashing;
pub mod identifiers;
pub mod incident;
pub mod plan;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use alert::Alert;
pub use alert::AlertSource;
pub use alert::Severity;
pub use alert::fingerprint;
pub use approval::ApprovalDecision;
pub use approval::ApprovalError;
pub use approval::ApprovalRequest;
pub use audit::Actor;
pub use audit::AuditOutcome;
pub use audit::AuditRecord;
pub use autonomy::AutonomyConfig;
pub use autonomy::AutonomyConfigHandle;
pub use autonomy::AutonomyMode;
pub use circuit::CircuitBreakerState;
pub use circuit::CircuitState;
pub use circuit::FAILURE_THRESHOLD;
pub use circuit::HALF_OPEN_SUCCESS_THRESHOLD;
pub use circuit::OPEN_COOLDOWN_SECONDS;
pub use events::EventKind;
pub use events::LiveLogEvent;
pub use execution::ExecutionRecord;
pub use execution::ExecutionStatus;
pub use execution::SkipReason;
pub use execution::VerificationResult;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use identifiers::ActionId;
pub use identifiers::ActionType;
pub use identifiers::AdapterName;
pub use identifiers::AlertId;
pub use identifiers::ApprovalId;
pub use identifiers::CommandId;
pub use identifiers::ExecutionId;
pub use identifiers::Fingerprint;
pub use identifiers::IncidentId;
pub use incident::ContextBundle;
pub use incident::Incident;
pub use incident::IncidentState;
pub use incident::TerminalOutcome;
pub use plan::CommandSpec;
pub use plan::ResolutionAction;
pub use plan::ResolutionPlan;
pub use plan::RiskLevel;
pub use time::Timestamp;
