// oncall-core/src/core/plan.rs
// ============================================================================
// Module: Oncall Resolution Plan
// Description: Model-produced remediation plan and its expanded command specs.
// Purpose: Define the typed output of the Analysis Engine and Command Planner.
// Dependencies: crate::core::identifiers, serde, serde_json
// ============================================================================

//! ## Overview
//! A [`ResolutionPlan`] is what the Analysis Engine parses out of the model's
//! free-text response. Each [`ResolutionAction`] it contains is later expanded
//! by the Risk Classifier & Command Planner into zero or more [`CommandSpec`]
//! instances bound to a concrete adapter and verb.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::ActionId;
use crate::core::identifiers::ActionType;
use crate::core::identifiers::AdapterName;
use crate::core::identifiers::CommandId;

// ============================================================================
// SECTION: Risk Level
// ============================================================================

/// Risk classification applied to a `ResolutionAction` or expanded `CommandSpec`.
///
/// # Invariants
/// - Ordering reflects severity: `Low < Medium < High`. Risk re-tagging always
///   takes the maximum of the declared and recomputed level, never the minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Read-only verbs, notifications, status updates.
    Low,
    /// Scale, restart, rollout restart, label, annotate, non-limit patch.
    Medium,
    /// Delete, apply, create, exec, port-forward, system-namespace targets.
    High,
}

// ============================================================================
// SECTION: Resolution Action
// ============================================================================

/// One proposed remediation step inside a plan, as parsed from the model.
///
/// # Invariants
/// - `confidence` is clamped to `[0.0, 1.0]` by the parser before construction.
/// - `prerequisites` reference `action_type` tags appearing earlier in the
///   same plan; the Planner does not currently validate acyclicity beyond
///   that ordering constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionAction {
    /// Stable identifier assigned when the action is parsed.
    pub action_id: ActionId,
    /// Verb tag inferred from the model's remediation line (`restart_pod`, ...).
    pub action_type: ActionType,
    /// Arguments extracted from the model's command line, keyed by name.
    pub params: Value,
    /// Human-readable description carried from the model's response.
    pub description: String,
    /// Model-reported or heuristically assigned confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Risk level as declared at parse time, before command expansion.
    pub risk_level: RiskLevel,
    /// Expected wall-clock duration, if the model stated one.
    pub estimated_duration: Option<String>,
    /// Whether a rollback action accompanies this one.
    pub rollback_possible: bool,
    /// `action_type` tags of actions that must complete before this one.
    pub prerequisites: Vec<ActionType>,
    /// Concrete commands expanded from this action by the Planner.
    pub commands: Vec<CommandSpec>,
}

// ============================================================================
// SECTION: Command Spec
// ============================================================================

/// An expanded, concrete, adapter-targeted invocation derived from an action.
///
/// # Invariants
/// - `classified_risk` is recomputed at expansion time and is never lower
///   than the owning action's declared `risk_level`.
/// - `forbidden` commands are never passed to the Executor regardless of
///   `AutonomyConfig`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Stable identifier assigned at expansion time.
    pub command_id: CommandId,
    /// Adapter this command targets.
    pub target_system: AdapterName,
    /// Adapter-specific operation verb (`delete`, `scale`, `patch`, ...).
    pub verb: String,
    /// Structured arguments for the adapter's `execute_action`.
    pub args: Value,
    /// Whether this command should only simulate its effect.
    pub dry_run: bool,
    /// Set when the command matches a denylist pattern (§4.4 Forbidden rules).
    pub forbidden: bool,
    /// Risk recomputed from the expanded verb/args; the higher bound wins.
    pub classified_risk: RiskLevel,
}

// ============================================================================
// SECTION: Resolution Plan
// ============================================================================

/// The model-produced, parsed, typed plan for handling an incident.
///
/// # Invariants
/// - An empty `actions` list is valid and distinct from a parse failure: it
///   signals `analysis_empty`, never promoted to `resolved` without
///   independent confirmation that the alerting subject is gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResolutionPlan {
    /// Root cause narrative extracted from the model's response.
    pub root_cause: String,
    /// Impact assessment narrative extracted from the model's response.
    pub impact_assessment: String,
    /// Ordered remediation actions.
    pub actions: Vec<ResolutionAction>,
    /// Free-text monitoring recommendations.
    pub monitoring_recommendations: Vec<String>,
}

impl ResolutionPlan {
    /// Returns true when the plan carries no remediation actions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
