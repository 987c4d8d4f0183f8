// oncall-core/src/core/autonomy.rs
// ============================================================================
// Module: Oncall Autonomy Config
// Description: Process-wide, hot-reloadable policy controlling the Autonomy Gate.
// Purpose: Centralize mode, thresholds, and the risk matrix read by every decision.
// Dependencies: crate::core::plan, serde, std::collections
// ============================================================================

//! ## Overview
//! [`AutonomyConfig`] is the single process-wide value the Autonomy Gate and
//! Command Planner consult on every decision (§5 "Shared-resource
//! discipline"). It is held behind [`AutonomyConfigHandle`], a read-copy-update
//! snapshot: readers clone an `Arc` at no lock-contention cost, and the one
//! writer (config reload, CLI `emergency-stop` toggle) swaps the pointer
//! atomically.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::RwLock;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ActionType;
use crate::core::plan::RiskLevel;

// ============================================================================
// SECTION: Autonomy Mode
// ============================================================================

/// Operator-set policy controlling whether commands run automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutonomyMode {
    /// Commands execute automatically, subject to per-risk confidence gates.
    Yolo,
    /// Commands above the configured risk floor require operator approval.
    Approval,
    /// No command executes; everything is previewed only.
    Plan,
}

// ============================================================================
// SECTION: Autonomy Config
// ============================================================================

/// Process-wide autonomy policy.
///
/// # Invariants
/// - `confidence_threshold` is clamped to `[0.0, 1.0]` by the config loader.
/// - `risk_matrix` entries are advisory to the Planner (§4.4); the Forbidden
///   rule set is never overridable through this structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutonomyConfig {
    /// Current autonomy mode.
    pub mode: AutonomyMode,
    /// Baseline confidence floor used by `yolo` mode when `trust_all_yolo=false`.
    pub confidence_threshold: f64,
    /// Action types approved for automatic handling, keyed by risk level.
    pub risk_matrix: BTreeMap<RiskLevel, BTreeSet<ActionType>>,
    /// Risk levels that require approval when `mode == approval`.
    pub approval_required_for: BTreeSet<RiskLevel>,
    /// Gates every mutating adapter call; `false` forces dry-run everywhere.
    pub destructive_operations_enabled: bool,
    /// Forces preview-only regardless of mode.
    pub dry_run_mode: bool,
    /// Unconditionally blocks all mutating work and freezes pending approvals.
    pub emergency_stop: bool,
    /// Opt-in per §9 Open Questions: `yolo` trusts the model regardless of
    /// confidence for low-risk actions rather than enforcing per-risk floors.
    pub trust_all_yolo: bool,
}

impl Default for AutonomyConfig {
    fn default() -> Self {
        Self {
            mode: AutonomyMode::Plan,
            confidence_threshold: 0.7,
            risk_matrix: BTreeMap::new(),
            approval_required_for: BTreeSet::from([RiskLevel::Medium, RiskLevel::High]),
            destructive_operations_enabled: false,
            dry_run_mode: false,
            emergency_stop: false,
            trust_all_yolo: false,
        }
    }
}

// ============================================================================
// SECTION: RCU Handle
// ============================================================================

/// Read-copy-update handle shared by every component that reads `AutonomyConfig`.
///
/// Cloning an `AutonomyConfigHandle` is cheap (`Arc` clone of the inner lock);
/// the lock is held only for the instant of a snapshot load or store, never
/// across a decision.
#[derive(Debug, Clone)]
pub struct AutonomyConfigHandle {
    inner: Arc<RwLock<Arc<AutonomyConfig>>>,
}

impl AutonomyConfigHandle {
    /// Creates a new handle seeded with `config`.
    #[must_use]
    pub fn new(config: AutonomyConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// Returns a cheap, point-in-time snapshot of the current config.
    ///
    /// # Panics
    ///
    /// Panics only if the inner lock is poisoned by a prior writer panic,
    /// which would indicate a bug elsewhere in the writer path.
    #[must_use]
    pub fn load(&self) -> Arc<AutonomyConfig> {
        #[allow(
            clippy::unwrap_used,
            reason = "a poisoned config lock means a writer panicked mid-update; there is no safe snapshot to fall back to"
        )]
        Arc::clone(&self.inner.read().unwrap())
    }

    /// Atomically replaces the config with a new value.
    ///
    /// # Panics
    ///
    /// Panics only if the inner lock is poisoned by a prior writer panic.
    pub fn store(&self, config: AutonomyConfig) {
        #[allow(
            clippy::unwrap_used,
            reason = "a poisoned config lock means a writer panicked mid-update; there is no safe way to continue serving stale config"
        )]
        let mut guard = self.inner.write().unwrap();
        *guard = Arc::new(config);
    }

    /// Flips `emergency_stop` without requiring a full config reload.
    ///
    /// # Panics
    ///
    /// Panics only if the inner lock is poisoned by a prior writer panic.
    pub fn set_emergency_stop(&self, stopped: bool) {
        #[allow(
            clippy::unwrap_used,
            reason = "a poisoned config lock means a writer panicked mid-update; there is no safe way to continue serving stale config"
        )]
        let mut guard = self.inner.write().unwrap();
        let mut next = (**guard).clone();
        next.emergency_stop = stopped;
        *guard = Arc::new(next);
    }
}
