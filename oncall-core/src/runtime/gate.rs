// oncall-core/src/runtime/gate.rs
// ============================================================================
// Module: Oncall Autonomy Gate
// Description: Per-command routing to auto-execute, approval, or preview-only.
// Purpose: Implement §4.5's mode/risk/confidence policy as an evaluable tree.
// Dependencies: crate::core, oncall-logic
// ============================================================================

//! ## Overview
//! For every `CommandSpec` the Autonomy Gate consults [`AutonomyConfig`] and
//! the circuit breaker's [`CircuitState`] and returns exactly one
//! [`GateDecision`]. The auto-execute eligibility rule — an AND of
//! risk-tiered confidence ORs — is composed with [`oncall_logic::Requirement`]
//! since it is precisely the Boolean algebra that crate generalizes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use oncall_logic::Requirement;
use oncall_logic::convenience;
use oncall_logic::traits::PredicateEval;
use oncall_logic::traits::Row;

use crate::core::AutonomyConfig;
use crate::core::AutonomyMode;
use crate::core::CircuitState;
use crate::core::RiskLevel;
use crate::core::SkipReason;

// ============================================================================
// SECTION: Gate View and Predicates
// ============================================================================

/// The fields a gate predicate needs, borrowed from the command and config
/// under evaluation.
#[derive(Debug, Clone, Copy)]
pub struct GateView {
    /// Risk level of the command under evaluation.
    pub risk: RiskLevel,
    /// Confidence of the originating action, in `[0.0, 1.0]`.
    pub confidence: f64,
}

/// Leaf predicates for the auto-execute eligibility tree (§4.5).
#[derive(Debug, Clone, Copy, PartialEq)]
enum AutoExecutePredicate {
    /// True unless the command's risk is exactly the named level.
    RiskIsNot(RiskLevel),
    /// True when confidence meets or exceeds the floor.
    ConfidenceAtLeast(f64),
}

impl PredicateEval for AutoExecutePredicate {
    type Reader<'a> = GateView;

    fn eval_row(&self, reader: &Self::Reader<'_>, _row: Row) -> bool {
        match *self {
            Self::RiskIsNot(level) => reader.risk != level,
            Self::ConfidenceAtLeast(floor) => reader.confidence >= floor,
        }
    }
}

/// Builds the auto-execute eligibility tree: for each risk tier, either the
/// command isn't at that tier, or confidence clears that tier's floor.
fn auto_execute_requirement() -> Requirement<AutoExecutePredicate> {
    convenience::all(vec![
        convenience::any(vec![
            convenience::predicate(AutoExecutePredicate::RiskIsNot(RiskLevel::High)),
            convenience::predicate(AutoExecutePredicate::ConfidenceAtLeast(0.9)),
        ]),
        convenience::any(vec![
            convenience::predicate(AutoExecutePredicate::RiskIsNot(RiskLevel::Medium)),
            convenience::predicate(AutoExecutePredicate::ConfidenceAtLeast(0.8)),
        ]),
        convenience::any(vec![
            convenience::predicate(AutoExecutePredicate::RiskIsNot(RiskLevel::Low)),
            convenience::predicate(AutoExecutePredicate::ConfidenceAtLeast(0.7)),
        ]),
    ])
}

// ============================================================================
// SECTION: Gate Decision
// ============================================================================

/// The Autonomy Gate's routing decision for one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Dispatch immediately to the Executor.
    AutoExecute,
    /// Suspend pending an operator decision.
    RequireApproval,
    /// Record what would have run without dispatching it.
    PreviewOnly(SkipReason),
}

/// Decides how a command should be routed (§4.5).
///
/// `circuit` reflects the breaker's *effective* state (already advanced past
/// any cooldown) at decision time.
#[must_use]
pub fn decide(
    config: &AutonomyConfig,
    circuit: CircuitState,
    risk: RiskLevel,
    confidence: f64,
) -> GateDecision {
    if config.emergency_stop {
        return GateDecision::PreviewOnly(SkipReason::EmergencyStop);
    }
    if config.dry_run_mode {
        return GateDecision::PreviewOnly(SkipReason::DryRun);
    }
    if circuit == CircuitState::Open {
        return GateDecision::PreviewOnly(SkipReason::CircuitOpen);
    }

    match config.mode {
        AutonomyMode::Plan => GateDecision::PreviewOnly(SkipReason::PlanMode),
        AutonomyMode::Yolo => {
            let view = GateView { risk, confidence };
            if config.trust_all_yolo || auto_execute_requirement().eval(&view, 0) {
                GateDecision::AutoExecute
            } else {
                GateDecision::PreviewOnly(SkipReason::ConfidenceBelowThreshold)
            }
        }
        AutonomyMode::Approval => {
            if config.approval_required_for.contains(&risk) {
                GateDecision::RequireApproval
            } else {
                GateDecision::AutoExecute
            }
        }
    }
}
