// oncall-config/src/schema.rs
// ============================================================================
// Module: Oncall Config Schema
// Description: Machine-readable description of the §6 environment surface.
// Purpose: Back `oncall-cli config validate --schema` with a stable artifact.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Unlike the teacher's TOML-file schema (one JSON Schema document validating
//! a whole config file), this engine's configuration is a flat set of
//! environment variables, so the "schema" here is a simple enumeration:
//! name, required-ness, and a one-line description per variable, suitable
//! for rendering as `--help` text or a machine-readable manifest.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Variable Descriptor
// ============================================================================

/// One environment variable's entry in `config_schema`.
struct VarDescriptor {
    /// Environment variable name.
    name: &'static str,
    /// Whether an adapter at runtime treats an unset value as fatal.
    required_by: &'static str,
    /// One-line description.
    description: &'static str,
}

/// The complete §6 variable table, in the order the spec lists them.
const VARS: &[VarDescriptor] = &[
    VarDescriptor {
        name: "MODEL_API_KEY",
        required_by: "analysis engine",
        description: "Credential for the analysis model.",
    },
    VarDescriptor {
        name: "MODEL_API_URL",
        required_by: "none (empty plans without it)",
        description: "Endpoint the Analysis Engine posts prompts to; the specific provider is out of scope.",
    },
    VarDescriptor {
        name: "AUTONOMY_MODE",
        required_by: "none (defaults to plan)",
        description: "Initial mode: yolo, approval, or plan.",
    },
    VarDescriptor {
        name: "CONFIDENCE_THRESHOLD",
        required_by: "none (defaults to 0.7)",
        description: "Float in [0.0, 1.0] used by the Autonomy Gate.",
    },
    VarDescriptor {
        name: "DESTRUCTIVE_OPERATIONS_ENABLED",
        required_by: "none (defaults to false)",
        description: "Gates all mutating adapter calls.",
    },
    VarDescriptor {
        name: "DRY_RUN_MODE",
        required_by: "none (defaults to false)",
        description: "Forces preview-only regardless of mode.",
    },
    VarDescriptor {
        name: "INCIDENT_DEDUP_WINDOW_SECONDS",
        required_by: "none (defaults to 300)",
        description: "Dedup window, in seconds.",
    },
    VarDescriptor {
        name: "KUBERNETES_KUBECONFIG_PATH",
        required_by: "kubernetes adapter",
        description: "Filesystem path consumed by the Kubernetes adapter.",
    },
    VarDescriptor {
        name: "KUBERNETES_CONTEXT",
        required_by: "none",
        description: "Optional kubeconfig context name.",
    },
    VarDescriptor {
        name: "INCIDENT_MANAGEMENT_API_KEY",
        required_by: "pagerduty dispatcher",
        description: "Credential for acknowledge/resolve on finalization.",
    },
    VarDescriptor {
        name: "INCIDENT_MANAGEMENT_USER_EMAIL",
        required_by: "pagerduty dispatcher",
        description: "Acting-as email for PagerDuty REST calls.",
    },
    VarDescriptor {
        name: "WEBHOOK_SECRET",
        required_by: "none",
        description: "HMAC secret for ingress signature validation; unset accepts unauthenticated requests with a warning.",
    },
    VarDescriptor {
        name: "LOG_LEVEL",
        required_by: "none (defaults to info)",
        description: "debug|info|warn|error.",
    },
];

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Renders the environment variable surface as a JSON array, suitable for
/// `oncall-cli config validate --schema`.
#[must_use]
pub fn config_schema() -> Value {
    let entries: Vec<Value> = VARS
        .iter()
        .map(|var| {
            json!({
                "name": var.name,
                "required_by": var.required_by,
                "description": var.description,
            })
        })
        .collect();
    Value::Array(entries)
}
