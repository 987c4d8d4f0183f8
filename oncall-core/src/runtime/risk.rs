// oncall-core/src/runtime/risk.rs
// ============================================================================
// Module: Oncall Risk Classifier
// Description: Verb/namespace-based risk classification and the forbidden-command gate.
// Purpose: Implement §4.4's risk rules, independent of command expansion.
// Dependencies: crate::core, oncall-logic
// ============================================================================

//! ## Overview
//! Every expanded [`CommandSpec`] is classified by verb and target before the
//! Autonomy Gate ever sees it. Two independent checks apply: an ordered
//! severity classification (`classify_command`), and a forbidden-pattern
//! check (`is_forbidden`) built from [`oncall_logic::Requirement`] — a
//! forbidden command is never executed regardless of `AutonomyConfig`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use oncall_logic::Requirement;
use oncall_logic::convenience;
use oncall_logic::traits::Row;
use oncall_logic::traits::PredicateEval;

use crate::core::RiskLevel;

/// A read-only view of the fields a forbidden-pattern rule needs, borrowed
/// from a `CommandSpec` without requiring `oncall-logic` to depend on
/// `oncall-core`'s concrete types.
#[derive(Debug, Clone, Copy)]
pub struct CommandView<'a> {
    /// Adapter-specific operation verb.
    pub verb: &'a str,
    /// Kubernetes namespace targeted, if any.
    pub namespace: Option<&'a str>,
    /// Whether the resource selector is empty or a wildcard (`--all`, `*`).
    pub wildcard_selector: bool,
    /// Whether the targeted resource kind is cluster-scoped
    /// (namespace, node, persistent volume).
    pub cluster_scoped: bool,
}

// ============================================================================
// SECTION: Forbidden Rule Predicates
// ============================================================================

/// Leaf predicates composed into the forbidden-command requirement tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ForbiddenRule {
    /// Verb is exactly one of the permanently-forbidden delete targets.
    VerbIn(&'static [&'static str]),
    /// Resource selector is empty/wildcard on a cluster-scoped resource.
    WildcardOnClusterScoped,
}

impl PredicateEval for ForbiddenRule {
    type Reader<'a> = CommandView<'a>;

    fn eval_row(&self, reader: &Self::Reader<'_>, _row: Row) -> bool {
        match self {
            Self::VerbIn(verbs) => verbs.contains(&reader.verb),
            Self::WildcardOnClusterScoped => reader.cluster_scoped && reader.wildcard_selector,
        }
    }
}

/// Verbs that are always forbidden, independent of autonomy mode (§4.4):
/// delete of namespace, node, persistent volume, or persistent volume claim.
const PERMANENTLY_FORBIDDEN_VERBS: &[&str] = &[
    "delete_namespace",
    "delete_node",
    "delete_pv",
    "delete_pvc",
];

/// Builds the forbidden-command requirement tree.
#[must_use]
pub fn forbidden_requirement() -> Requirement<ForbiddenRule> {
    convenience::any(vec![
        convenience::predicate(ForbiddenRule::VerbIn(PERMANENTLY_FORBIDDEN_VERBS)),
        convenience::predicate(ForbiddenRule::WildcardOnClusterScoped),
    ])
}

/// Returns true when `view` matches a permanently-forbidden pattern.
#[must_use]
pub fn is_forbidden(view: &CommandView<'_>) -> bool {
    forbidden_requirement().eval(view, 0)
}

// ============================================================================
// SECTION: Severity Classification
// ============================================================================

/// Read-only read verbs, notifications, and status updates (§4.4 Low risk).
const LOW_RISK_VERBS: &[&str] = &["get", "describe", "logs", "top", "notify", "status"];

/// Scale/restart/label/annotate/non-limit-patch (§4.4 Medium risk).
const MEDIUM_RISK_VERBS: &[&str] = &[
    "scale",
    "restart_pod",
    "scale_deployment",
    "rollout_restart",
    "label",
    "annotate",
    "patch",
];

/// Delete/apply/create/exec/port-forward (§4.4 High risk).
const HIGH_RISK_VERBS: &[&str] = &[
    "delete",
    "apply",
    "apply_manifest",
    "create",
    "exec",
    "port_forward",
    "rollback_deployment",
    "set_image",
];

/// Classifies the risk of a command from its verb, namespace, and selector
/// (§4.4). An unrecognized verb is classified high risk rather than assumed
/// safe, failing closed.
#[must_use]
pub fn classify_command(view: &CommandView<'_>) -> RiskLevel {
    let targets_system_namespace = view.namespace.is_some_and(|ns| ns.starts_with("kube-"));
    let wildcard_scope = view.wildcard_selector;

    if targets_system_namespace || wildcard_scope || HIGH_RISK_VERBS.contains(&view.verb) {
        return RiskLevel::High;
    }
    if MEDIUM_RISK_VERBS.contains(&view.verb) || view.verb.starts_with("patch_") {
        return RiskLevel::Medium;
    }
    if LOW_RISK_VERBS.contains(&view.verb) {
        return RiskLevel::Low;
    }
    // Unrecognized verb: fail closed to the highest bound rather than assume safety.
    RiskLevel::High
}
