// oncall-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example environment file.
// Purpose: Deterministic starting point for operators wiring a new deployment.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example `.env` content for the engine's §6 configuration
//! surface. Kept in sync with `schema::config_schema` by listing the same
//! variables; unlike the schema this is meant to be copied and edited, not
//! parsed.

/// Returns a canonical example environment file.
#[must_use]
pub fn env_file_example() -> String {
    String::from(
        r#"# Analysis model credential and endpoint.
MODEL_API_KEY=
MODEL_API_URL=

# yolo | approval | plan
AUTONOMY_MODE=plan
CONFIDENCE_THRESHOLD=0.7

# Mutating adapter calls are no-ops until this is true.
DESTRUCTIVE_OPERATIONS_ENABLED=false
DRY_RUN_MODE=false

INCIDENT_DEDUP_WINDOW_SECONDS=300

KUBERNETES_KUBECONFIG_PATH=/etc/oncall/kubeconfig
KUBERNETES_CONTEXT=

INCIDENT_MANAGEMENT_API_KEY=
INCIDENT_MANAGEMENT_USER_EMAIL=

# HMAC secret for webhook ingress; unset accepts unauthenticated requests
# and logs a warning.
WEBHOOK_SECRET=

LOG_LEVEL=info
"#,
    )
}
