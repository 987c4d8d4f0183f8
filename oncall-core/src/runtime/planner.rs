// oncall-core/src/runtime/planner.rs
// ============================================================================
// Module: Oncall Command Planner
// Description: Expands parsed ResolutionActions into adapter-targeted CommandSpecs.
// Purpose: Implement §4.4's placeholder resolution and risk re-classification.
// Dependencies: crate::core, crate::runtime::risk
// ============================================================================

//! ## Overview
//! The Analysis Engine's parser produces [`ResolutionAction`]s with free-text
//! parameters (`deployment=<payment-service>` or a literal name); the Planner
//! resolves each action's `action_type` to a target adapter and concrete
//! verb, substitutes placeholders against gathered context, and re-classifies
//! risk from the expanded command rather than trusting the model's stated
//! `risk_level`. Risk re-tagging always takes the higher of the two (§4.4).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Value;

use crate::core::AdapterName;
use crate::core::CommandId;
use crate::core::CommandSpec;
use crate::core::ContextBundle;
use crate::core::ResolutionAction;
use crate::core::RiskLevel;
use crate::core::SkipReason;
use crate::runtime::risk::CommandView;
use crate::runtime::risk::classify_command;
use crate::runtime::risk::is_forbidden;

/// Verbs this planner routes to the Kubernetes adapter; any other recognized
/// verb is routed to the `pagerduty` adapter name instead (notify/status).
const KUBERNETES_VERBS: &[&str] = &[
    "restart_pod",
    "scale_deployment",
    "patch_memory_limit",
    "patch_cpu_limit",
    "rollback_deployment",
    "set_image",
    "apply_manifest",
    "delete_namespace",
    "delete_node",
    "delete_pv",
    "delete_pvc",
];

/// System-scoped verbs whose target is the whole namespace, node, or PV/PVC
/// rather than a workload inside one, used to decide cluster-scoping.
const CLUSTER_SCOPED_VERBS: &[&str] = &["delete_namespace", "delete_node", "delete_pv", "delete_pvc"];

/// Outcome of resolving one string-valued argument against gathered context.
enum FieldResolution {
    /// A literal value, or a placeholder that resolved to exactly one candidate.
    Single(Value),
    /// A placeholder matched more than one distinct candidate value.
    Ambiguous(Vec<Value>),
    /// A bracketed placeholder matched no candidate in any context bundle.
    Unresolved,
}

/// Resolves one `<placeholder>`-bracketed or literal argument value against
/// gathered context, returning every distinct candidate found rather than the
/// first (§4.4: ambiguous placeholders must be detected, not silently
/// collapsed to one guess).
fn resolve_field(value: &str, context: &BTreeMap<String, ContextBundle>) -> FieldResolution {
    let Some(hint) = value.strip_prefix('<').and_then(|v| v.strip_suffix('>')) else {
        return FieldResolution::Single(Value::String(value.to_string()));
    };
    for bundle in context.values() {
        if !bundle.ok {
            continue;
        }
        let mut candidates = candidates_for_hint(&bundle.data, hint);
        if candidates.is_empty() {
            continue;
        }
        candidates.sort();
        candidates.dedup();
        return match candidates.len() {
            1 => FieldResolution::Single(Value::String(candidates.into_iter().next().expect("len checked"))),
            _ => FieldResolution::Ambiguous(candidates.into_iter().map(Value::String).collect()),
        };
    }
    FieldResolution::Unresolved
}

/// Collects every top-level string field in adapter-reported context whose
/// key or value plausibly matches `hint` (e.g. `deployment-name` against a
/// `deployments: ["payment-service", "payment-service-canary"]` list, or a
/// direct field match).
fn candidates_for_hint(data: &Value, hint: &str) -> Vec<String> {
    let Some(object) = data.as_object() else {
        return Vec::new();
    };
    if let Some(Value::String(direct)) = object.get(hint) {
        return vec![direct.clone()];
    }
    let mut candidates = Vec::new();
    for (key, candidate) in object {
        if !key.contains("name") && !key.ends_with('s') {
            continue;
        }
        match candidate {
            Value::String(s) => candidates.push(s.clone()),
            Value::Array(items) => {
                for item in items {
                    if let Value::String(s) = item {
                        candidates.push(s.clone());
                    }
                }
            }
            _ => {}
        }
    }
    candidates
}

/// How an action's argument object resolved against context: either exactly
/// one unresolved placeholder blocked expansion entirely, or resolution
/// produced one or more complete argument variants (more than one only when
/// some field was ambiguous).
enum ArgsOutcome {
    Unresolved,
    Ready(Vec<Value>),
}

/// Resolves every string-valued argument in `args` against `context`,
/// expanding the cartesian product of any ambiguous fields into separate
/// argument variants.
fn resolve_args_multi(args: &Value, context: &BTreeMap<String, ContextBundle>) -> ArgsOutcome {
    let Some(object) = args.as_object() else {
        return ArgsOutcome::Ready(vec![args.clone()]);
    };
    let mut variants: Vec<Vec<(String, Value)>> = vec![Vec::new()];
    for (key, value) in object {
        let resolution = match value {
            Value::String(s) => resolve_field(s, context),
            other => FieldResolution::Single(other.clone()),
        };
        let options = match resolution {
            FieldResolution::Unresolved => return ArgsOutcome::Unresolved,
            FieldResolution::Single(v) => vec![v],
            FieldResolution::Ambiguous(vs) => vs,
        };
        let mut next_variants = Vec::with_capacity(variants.len() * options.len());
        for variant in &variants {
            for option in &options {
                let mut next = variant.clone();
                next.push((key.clone(), option.clone()));
                next_variants.push(next);
            }
        }
        variants = next_variants;
    }
    ArgsOutcome::Ready(
        variants
            .into_iter()
            .map(|pairs| Value::Object(pairs.into_iter().collect()))
            .collect(),
    )
}

/// Extracts the namespace and wildcard-selector fields a `CommandView` needs
/// from one resolved argument variant.
fn command_view_fields(args: &Value) -> (Option<String>, bool) {
    let namespace = args
        .as_object()
        .and_then(|o| o.get("namespace"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let wildcard_selector = args
        .as_object()
        .and_then(|o| o.get("selector"))
        .and_then(Value::as_str)
        .is_some_and(|s| s == "*" || s == "--all");
    (namespace, wildcard_selector)
}

/// Result of expanding one `ResolutionAction`.
pub enum ExpansionOutcome {
    /// One `CommandSpec` per resolved argument variant, in expansion order.
    /// More than one only when a placeholder resolved ambiguously against a
    /// low- or medium-risk action.
    Commands(Vec<CommandSpec>),
    /// The action could not be expanded into any command; see the attached
    /// reason for why.
    Skip(SkipReason),
}

/// Routes an action verb to its target adapter, the same way `expand_action`
/// does, for callers that need the routing without a full expansion (e.g. to
/// label a record for an action that could not be expanded at all).
#[must_use]
pub fn target_system_for(verb: &str) -> AdapterName {
    if KUBERNETES_VERBS.contains(&verb) {
        "kubernetes".into()
    } else {
        "pagerduty".into()
    }
}

/// Expands one `ResolutionAction` into zero or more `CommandSpec`s, resolving
/// placeholders against `context` and re-classifying risk from the expanded
/// command (§4.4). `next_command_id` assigns stable ids in expansion order.
///
/// A placeholder that resolves to more than one candidate fans out into one
/// `CommandSpec` per candidate when the action's risk is low or medium;
/// high-risk ambiguous actions are skipped instead, since auto-selecting
/// among several possible mutation targets is never safe to do silently
/// (§4.4). A placeholder that resolves to no candidate at all skips the
/// action as unresolved rather than guessing.
#[must_use]
pub fn expand_action(
    action: &ResolutionAction,
    context: &BTreeMap<String, ContextBundle>,
    dry_run: bool,
    mut next_command_id: impl FnMut() -> CommandId,
) -> ExpansionOutcome {
    let verb = action.action_type.as_str();
    let target_system: AdapterName = if KUBERNETES_VERBS.contains(&verb) {
        "kubernetes".into()
    } else {
        "pagerduty".into()
    };
    let cluster_scoped = CLUSTER_SCOPED_VERBS.contains(&verb);

    let args_variants = match resolve_args_multi(&action.params, context) {
        ArgsOutcome::Unresolved => return ExpansionOutcome::Skip(SkipReason::UnresolvedTarget),
        ArgsOutcome::Ready(variants) => variants,
    };

    if args_variants.len() > 1 {
        let (namespace, wildcard_selector) = command_view_fields(&args_variants[0]);
        let view = CommandView {
            verb,
            namespace: namespace.as_deref(),
            wildcard_selector,
            cluster_scoped,
        };
        let risk = crate::runtime::parser::higher_risk(action.risk_level, classify_command(&view));
        if risk == RiskLevel::High {
            return ExpansionOutcome::Skip(SkipReason::AmbiguousTarget);
        }
    }

    let commands = args_variants
        .into_iter()
        .map(|args| {
            let (namespace, wildcard_selector) = command_view_fields(&args);
            let view = CommandView {
                verb,
                namespace: namespace.as_deref(),
                wildcard_selector,
                cluster_scoped,
            };
            let recomputed_risk = classify_command(&view);
            let classified_risk = crate::runtime::parser::higher_risk(action.risk_level, recomputed_risk);
            let forbidden = is_forbidden(&view);
            CommandSpec {
                command_id: next_command_id(),
                target_system: target_system.clone(),
                verb: verb.to_string(),
                args,
                dry_run,
                forbidden,
                classified_risk,
            }
        })
        .collect();

    ExpansionOutcome::Commands(commands)
}
