// oncall-config/src/policy.rs
// ============================================================================
// Module: Oncall Default Risk Matrix
// Description: The default advisory risk_matrix seeded into AutonomyConfig.
// Purpose: Enumerate which action_types are pre-approved per risk tier (§4.4).
// Dependencies: oncall-core, std::collections
// ============================================================================

//! ## Overview
//! `AutonomyConfig.risk_matrix` (§3) is advisory: the Risk Classifier always
//! recomputes a command's actual risk from its expanded verb/args, and the
//! matrix here never overrides the Forbidden rule set. It exists so an
//! operator reading `oncall-cli config validate` output can see, per risk
//! tier, which `action_type`s the deployment currently expects to see at
//! that tier — useful for catching a misconfigured adapter whose capability
//! set doesn't match what the matrix assumes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use oncall_core::ActionType;
use oncall_core::RiskLevel;

// ============================================================================
// SECTION: Default Matrix
// ============================================================================

/// Builds the default risk matrix used when no deployment-specific override
/// is supplied.
///
/// Mirrors the Kubernetes adapter's execute-action vocabulary (§4.1): the
/// read-only verbs never appear here since they never reach the Autonomy
/// Gate as mutating commands, and `apply_manifest`/the cluster-scoped delete
/// family are intentionally absent — the Risk Classifier forbids them
/// outright regardless of matrix membership (§4.4).
#[must_use]
pub fn default_risk_matrix() -> BTreeMap<RiskLevel, BTreeSet<ActionType>> {
    let mut matrix = BTreeMap::new();
    matrix.insert(
        RiskLevel::Medium,
        BTreeSet::from([
            ActionType::new("restart_pod"),
            ActionType::new("scale_deployment"),
            ActionType::new("patch_memory_limit"),
            ActionType::new("patch_cpu_limit"),
        ]),
    );
    matrix.insert(
        RiskLevel::High,
        BTreeSet::from([
            ActionType::new("rollback_deployment"),
            ActionType::new("set_image"),
        ]),
    );
    matrix
}

#[cfg(test)]
mod tests {
    use super::default_risk_matrix;
    use oncall_core::ActionType;
    use oncall_core::RiskLevel;

    #[test]
    fn medium_tier_contains_restart_and_scale() {
        let matrix = default_risk_matrix();
        let medium = &matrix[&RiskLevel::Medium];
        assert!(medium.contains(&ActionType::new("restart_pod")));
        assert!(medium.contains(&ActionType::new("scale_deployment")));
    }

    #[test]
    fn forbidden_verbs_never_appear_in_any_tier() {
        let matrix = default_risk_matrix();
        for set in matrix.values() {
            assert!(!set.contains(&ActionType::new("delete_namespace")));
            assert!(!set.contains(&ActionType::new("apply_manifest")));
        }
    }
}
