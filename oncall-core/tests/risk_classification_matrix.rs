// oncall-core/tests/risk_classification_matrix.rs
// ============================================================================
// Module: Risk Classification Matrix
// Description: Table-driven coverage of every verb tier and the forbidden set.
// Purpose: Pin the risk classification boundary that the Autonomy Gate relies on.
// Dependencies: oncall-core
// ============================================================================

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

use oncall_core::core::RiskLevel;
use oncall_core::runtime::risk::CommandView;
use oncall_core::runtime::{classify_command, is_forbidden};

fn view<'a>(verb: &'a str, namespace: Option<&'a str>, wildcard: bool, cluster_scoped: bool) -> CommandView<'a> {
    CommandView {
        verb,
        namespace,
        wildcard_selector: wildcard,
        cluster_scoped,
    }
}

#[test]
fn low_risk_verbs_classify_low_when_unscoped() {
    for verb in ["get", "describe", "logs", "top", "notify", "status"] {
        assert_eq!(
            classify_command(&view(verb, None, false, false)),
            RiskLevel::Low,
            "{verb} should classify low"
        );
    }
}

#[test]
fn medium_risk_verbs_classify_medium_when_unscoped() {
    for verb in [
        "scale",
        "restart_pod",
        "scale_deployment",
        "rollout_restart",
        "label",
        "annotate",
        "patch",
        "patch_memory_limit",
        "patch_cpu_limit",
    ] {
        assert_eq!(
            classify_command(&view(verb, None, false, false)),
            RiskLevel::Medium,
            "{verb} should classify medium"
        );
    }
}

#[test]
fn high_risk_verbs_classify_high_regardless_of_scope() {
    for verb in [
        "delete",
        "apply",
        "apply_manifest",
        "create",
        "exec",
        "port_forward",
        "rollback_deployment",
        "set_image",
    ] {
        assert_eq!(
            classify_command(&view(verb, None, false, false)),
            RiskLevel::High,
            "{verb} should classify high"
        );
    }
}

#[test]
fn unrecognized_verb_fails_closed_to_high() {
    assert_eq!(classify_command(&view("frobnicate", None, false, false)), RiskLevel::High);
}

#[test]
fn wildcard_selector_on_cluster_scoped_resource_forces_high() {
    assert_eq!(classify_command(&view("get", None, true, true)), RiskLevel::High);
}

#[test]
fn kube_system_namespace_forces_high_for_any_verb() {
    assert_eq!(classify_command(&view("get", Some("kube-system"), false, false)), RiskLevel::High);
    assert_eq!(classify_command(&view("scale", Some("kube-public"), false, false)), RiskLevel::High);
}

#[test]
fn permanently_forbidden_verbs_are_forbidden_even_without_cluster_scope_flag() {
    for verb in ["delete_namespace", "delete_node", "delete_pv", "delete_pvc"] {
        assert!(is_forbidden(&view(verb, None, false, false)), "{verb} should be forbidden");
    }
}

#[test]
fn ordinary_delete_is_not_permanently_forbidden_unless_wildcard_on_cluster_scope() {
    assert!(!is_forbidden(&view("delete", None, false, false)));
    assert!(is_forbidden(&view("delete", None, true, true)));
}
