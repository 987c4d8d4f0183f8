// oncall-core/src/core/circuit.rs
// ============================================================================
// Module: Oncall Circuit Breaker
// Description: Process-wide failure-tripped breaker guarding the Executor.
// Purpose: Force preview-only after repeated execution/verification failures.
// Dependencies: crate::core::time, serde
// ============================================================================

//! ## Overview
//! The breaker wraps every Executor invocation (§4.6). It is a pure state
//! machine: callers feed it `record_success`/`record_failure` and read
//! `state()` to decide whether the Autonomy Gate must force preview-only.
//! Thresholds are the spec defaults; `AutonomyConfig` does not currently
//! expose overrides for them (see `DESIGN.md`).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Consecutive failures required to open the breaker.
pub const FAILURE_THRESHOLD: u32 = 5;
/// Cooldown before an open breaker allows a half-open trial.
pub const OPEN_COOLDOWN_SECONDS: i64 = 5 * 60;
/// Consecutive half-open successes required to close the breaker.
pub const HALF_OPEN_SUCCESS_THRESHOLD: u32 = 2;

// ============================================================================
// SECTION: Circuit State
// ============================================================================

/// Phase of the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation; executions are permitted.
    Closed,
    /// Tripped; all mutating executions are forced to preview-only.
    Open,
    /// Cooldown elapsed; a bounded number of trial executions are permitted.
    HalfOpen,
}

// ============================================================================
// SECTION: Circuit Breaker State
// ============================================================================

/// Full breaker state, process-wide and mutated through a single writer.
///
/// # Invariants
/// - Opens after `FAILURE_THRESHOLD` consecutive failures.
/// - `closed -> open` at threshold; `open -> half_open` after
///   `OPEN_COOLDOWN_SECONDS`; `half_open -> closed` after
///   `HALF_OPEN_SUCCESS_THRESHOLD` consecutive successes.
/// - Any failure while half-open reopens the breaker immediately.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerState {
    /// Consecutive failures since the last success (or breaker open).
    pub consecutive_failures: u32,
    /// Consecutive half-open trial successes.
    pub half_open_successes: u32,
    /// Timestamp of the most recent failure, if any.
    pub last_failure_at: Option<Timestamp>,
    /// Current phase.
    pub state: CircuitState,
    /// Timestamp the breaker last transitioned into `Open`.
    pub opened_at: Option<Timestamp>,
}

impl Default for CircuitBreakerState {
    fn default() -> Self {
        Self {
            consecutive_failures: 0,
            half_open_successes: 0,
            last_failure_at: None,
            state: CircuitState::Closed,
            opened_at: None,
        }
    }
}

impl CircuitBreakerState {
    /// Returns the externally observable decision: may an execution proceed?
    ///
    /// `now` is consulted only to advance `Open -> HalfOpen` after cooldown;
    /// the returned phase is never mutated in place by this call.
    #[must_use]
    pub fn effective_state(&self, now: Timestamp) -> CircuitState {
        if self.state == CircuitState::Open
            && let Some(opened_at) = self.opened_at
            && opened_at.seconds_until(now) >= OPEN_COOLDOWN_SECONDS
        {
            return CircuitState::HalfOpen;
        }
        self.state
    }

    /// Advances the breaker past its cooldown if eligible.
    pub fn tick(&mut self, now: Timestamp) {
        if self.effective_state(now) == CircuitState::HalfOpen && self.state == CircuitState::Open
        {
            self.state = CircuitState::HalfOpen;
            self.half_open_successes = 0;
        }
    }

    /// Records a successful execution or passing verification.
    pub fn record_success(&mut self, now: Timestamp) {
        self.tick(now);
        match self.state {
            CircuitState::Closed => {
                self.consecutive_failures = 0;
            }
            CircuitState::HalfOpen => {
                self.half_open_successes += 1;
                if self.half_open_successes >= HALF_OPEN_SUCCESS_THRESHOLD {
                    self.state = CircuitState::Closed;
                    self.consecutive_failures = 0;
                    self.half_open_successes = 0;
                    self.opened_at = None;
                }
            }
            CircuitState::Open => {}
        }
    }

    /// Records a failed execution or a failing verification.
    pub fn record_failure(&mut self, now: Timestamp) {
        self.tick(now);
        self.last_failure_at = Some(now);
        match self.state {
            CircuitState::Closed => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= FAILURE_THRESHOLD {
                    self.state = CircuitState::Open;
                    self.opened_at = Some(now);
                }
            }
            CircuitState::HalfOpen => {
                self.state = CircuitState::Open;
                self.opened_at = Some(now);
                self.half_open_successes = 0;
            }
            CircuitState::Open => {}
        }
    }

    /// Manually resets the breaker to `Closed`, clearing all counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
