// oncall-config/src/config.rs
// ============================================================================
// Module: Oncall Engine Configuration
// Description: Environment-variable configuration loading and validation.
// Purpose: Provide strict, fail-closed parsing of the §6 configuration surface.
// Dependencies: oncall-core, std::env
// ============================================================================

//! ## Overview
//! Every configuration input named in the functional description's §6 table
//! is read from an environment variable here. Loading fails closed: an
//! out-of-range value is an error, never silently clamped past validation,
//! and a missing credential is surfaced to the caller rather than defaulted
//! to an empty string that would fail later at the adapter boundary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::env::VarError;

use oncall_core::AutonomyConfig;
use oncall_core::AutonomyMode;
use oncall_core::RiskLevel;
use thiserror::Error;

use crate::policy::default_risk_matrix;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Prefix every engine-owned environment variable carries, purely documentary
/// (the variables named in §6 do not share a common prefix; this constant
/// exists for the CLI's `--help` text and `config_docs_markdown`).
pub const CONFIG_ENV_PREFIX: &str = "ONCALL_";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable was set but could not be parsed.
    #[error("{var}: invalid value {value:?}: {reason}")]
    Invalid {
        /// Name of the offending variable.
        var: &'static str,
        /// The raw value that failed to parse.
        value: String,
        /// Human-readable reason.
        reason: String,
    },
}

impl ConfigError {
    /// Builds an [`ConfigError::Invalid`] for `var`.
    fn invalid(var: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// SECTION: Log Level
// ============================================================================

/// Process log verbosity, mirrored onto `tracing_subscriber::EnvFilter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Verbose, per-adapter-call detail.
    Debug,
    /// Default operating verbosity.
    Info,
    /// Only anomalies and degraded-mode notices.
    Warn,
    /// Only failures.
    Error,
}

impl LogLevel {
    /// Returns the `tracing`-compatible filter directive for this level.
    #[must_use]
    pub const fn as_filter_directive(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Parses the `LOG_LEVEL` environment variable's value.
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(ConfigError::invalid(
                "LOG_LEVEL",
                value,
                "expected one of debug|info|warn|error",
            )),
        }
    }
}

// ============================================================================
// SECTION: Engine Configuration
// ============================================================================

/// The full environment-derived configuration surface (§6), plus the ambient
/// operational settings (bind address, store path) the spec leaves to the
/// implementer.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// `MODEL_API_KEY` — credential for the analysis model.
    pub model_api_key: Option<String>,
    /// Ambient: `MODEL_API_URL` — endpoint the Analysis Engine posts prompts
    /// to. Not named by §6 since the specific provider is out of scope (§1);
    /// left unset, the engine runs with no model configured and every
    /// incident reaches an empty plan rather than failing to start.
    pub model_api_url: Option<String>,
    /// `AUTONOMY_MODE` — initial autonomy mode.
    pub autonomy_mode: AutonomyMode,
    /// `CONFIDENCE_THRESHOLD` — float in `[0.0, 1.0]`.
    pub confidence_threshold: f64,
    /// `DESTRUCTIVE_OPERATIONS_ENABLED` — gates all mutating adapter calls.
    pub destructive_operations_enabled: bool,
    /// `DRY_RUN_MODE` — forces preview-only regardless of mode.
    pub dry_run_mode: bool,
    /// `INCIDENT_DEDUP_WINDOW_SECONDS` — dedup window, in seconds.
    pub incident_dedup_window_seconds: u64,
    /// `KUBERNETES_KUBECONFIG_PATH` — filesystem path to the kubeconfig.
    pub kubernetes_kubeconfig_path: Option<String>,
    /// `KUBERNETES_CONTEXT` — optional kubeconfig context name.
    pub kubernetes_context: Option<String>,
    /// `INCIDENT_MANAGEMENT_API_KEY` — PagerDuty (or equivalent) API credential.
    pub incident_management_api_key: Option<String>,
    /// `INCIDENT_MANAGEMENT_USER_EMAIL` — acting-as email for PagerDuty calls.
    pub incident_management_user_email: Option<String>,
    /// `WEBHOOK_SECRET` — HMAC secret for ingress signature validation.
    pub webhook_secret: Option<String>,
    /// `LOG_LEVEL` — process log verbosity.
    pub log_level: LogLevel,
    /// Opt-in, documented in §4.5/§9: `yolo` trusts the model for any
    /// existing low-risk action regardless of confidence rather than
    /// enforcing the per-risk confidence floor.
    pub trust_all_yolo: bool,
    /// Ambient: HTTP bind address for the webhook ingress (not named in §6,
    /// which specifies routes but not transport binding; ungoverned by a
    /// Non-goal, so it is carried as an implementation default).
    pub bind_addr: String,
    /// Ambient: sqlite database path backing `oncall-store-sqlite`.
    pub sqlite_path: String,
}

impl EngineConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a set variable fails to parse or falls
    /// outside its documented range. Unset variables take their documented
    /// default rather than erroring, except where §6 implies a credential is
    /// required for the adapter that consumes it — that requirement is
    /// enforced by the adapter at construction time, not here, since a
    /// deployment that disables an adapter entirely need not supply its
    /// credential.
    pub fn from_env() -> Result<Self, ConfigError> {
        let autonomy_mode = match env_opt("AUTONOMY_MODE")? {
            Some(raw) => parse_autonomy_mode(&raw)?,
            None => AutonomyMode::Plan,
        };
        let confidence_threshold = match env_opt("CONFIDENCE_THRESHOLD")? {
            Some(raw) => parse_unit_interval("CONFIDENCE_THRESHOLD", &raw)?,
            None => 0.7,
        };
        let destructive_operations_enabled = parse_bool_default("DESTRUCTIVE_OPERATIONS_ENABLED", false)?;
        let dry_run_mode = parse_bool_default("DRY_RUN_MODE", false)?;
        let trust_all_yolo = parse_bool_default("TRUST_ALL_YOLO", false)?;
        let incident_dedup_window_seconds = match env_opt("INCIDENT_DEDUP_WINDOW_SECONDS")? {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                ConfigError::invalid("INCIDENT_DEDUP_WINDOW_SECONDS", &raw, "expected a non-negative integer")
            })?,
            None => 300,
        };
        let log_level = match env_opt("LOG_LEVEL")? {
            Some(raw) => LogLevel::parse(&raw)?,
            None => LogLevel::Info,
        };

        Ok(Self {
            model_api_key: env_opt("MODEL_API_KEY")?,
            model_api_url: env_opt("MODEL_API_URL")?,
            autonomy_mode,
            confidence_threshold,
            destructive_operations_enabled,
            dry_run_mode,
            incident_dedup_window_seconds,
            kubernetes_kubeconfig_path: env_opt("KUBERNETES_KUBECONFIG_PATH")?,
            kubernetes_context: env_opt("KUBERNETES_CONTEXT")?,
            incident_management_api_key: env_opt("INCIDENT_MANAGEMENT_API_KEY")?,
            incident_management_user_email: env_opt("INCIDENT_MANAGEMENT_USER_EMAIL")?,
            webhook_secret: env_opt("WEBHOOK_SECRET")?,
            log_level,
            trust_all_yolo,
            bind_addr: env_opt("ONCALL_BIND_ADDR")?.unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            sqlite_path: env_opt("ONCALL_SQLITE_PATH")?.unwrap_or_else(|| "oncall.db".to_string()),
        })
    }

    /// Builds the [`AutonomyConfig`] snapshot this configuration implies,
    /// seeded with the default risk matrix (§4.4) and the fixed
    /// `approval_required_for` set (medium, high) per §4.5's default.
    #[must_use]
    pub fn to_autonomy_config(&self) -> AutonomyConfig {
        AutonomyConfig {
            mode: self.autonomy_mode,
            confidence_threshold: self.confidence_threshold,
            risk_matrix: default_risk_matrix(),
            approval_required_for: BTreeSet::from([RiskLevel::Medium, RiskLevel::High]),
            destructive_operations_enabled: self.destructive_operations_enabled,
            dry_run_mode: self.dry_run_mode,
            emergency_stop: false,
            trust_all_yolo: self.trust_all_yolo,
        }
    }
}

// ============================================================================
// SECTION: Env Parsing Helpers
// ============================================================================

/// Reads an optional environment variable, treating "set but not unicode" as
/// an error rather than silently discarding it.
fn env_opt(name: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(ConfigError::invalid(name, "<non-unicode>", "must be valid UTF-8")),
    }
}

/// Parses a boolean environment variable, defaulting when unset.
fn parse_bool_default(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env_opt(name)? {
        None => Ok(default),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::invalid(name, raw, "expected a boolean (true/false)")),
        },
    }
}

/// Parses a float and validates it falls within `[0.0, 1.0]`.
fn parse_unit_interval(name: &'static str, raw: &str) -> Result<f64, ConfigError> {
    let value: f64 = raw
        .parse()
        .map_err(|_| ConfigError::invalid(name, raw, "expected a decimal number"))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::invalid(name, raw, "expected a value in [0.0, 1.0]"));
    }
    Ok(value)
}

/// Parses the `AUTONOMY_MODE` variable's value.
fn parse_autonomy_mode(raw: &str) -> Result<AutonomyMode, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "yolo" => Ok(AutonomyMode::Yolo),
        "approval" => Ok(AutonomyMode::Approval),
        "plan" => Ok(AutonomyMode::Plan),
        _ => Err(ConfigError::invalid("AUTONOMY_MODE", raw, "expected one of yolo|approval|plan")),
    }
}

#[cfg(test)]
mod tests {
    use super::ConfigError;
    use super::parse_autonomy_mode;
    use super::parse_bool_default;
    use super::parse_unit_interval;
    use oncall_core::AutonomyMode;

    #[test]
    fn parses_known_autonomy_modes() {
        assert_eq!(parse_autonomy_mode("yolo").unwrap(), AutonomyMode::Yolo);
        assert_eq!(parse_autonomy_mode("APPROVAL").unwrap(), AutonomyMode::Approval);
        assert!(parse_autonomy_mode("chaos").is_err());
    }

    #[test]
    fn confidence_threshold_rejects_out_of_range() {
        assert!(parse_unit_interval("CONFIDENCE_THRESHOLD", "1.5").is_err());
        assert!(matches!(
            parse_unit_interval("CONFIDENCE_THRESHOLD", "1.5"),
            Err(ConfigError::Invalid { .. })
        ));
        assert_eq!(parse_unit_interval("CONFIDENCE_THRESHOLD", "0.8").unwrap(), 0.8);
    }

    #[test]
    fn bool_default_applies_when_unset_and_parses_common_spellings() {
        assert!(!parse_bool_default("DOES_NOT_EXIST_XYZ", false).unwrap());
        assert!(parse_bool_default("DOES_NOT_EXIST_XYZ", true).unwrap());
    }
}
