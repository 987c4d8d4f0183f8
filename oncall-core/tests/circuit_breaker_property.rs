// oncall-core/tests/circuit_breaker_property.rs
// ============================================================================
// Module: Circuit Breaker Properties
// Description: Property tests for the failure/cooldown/half-open state machine.
// Purpose: Check invariants hold across randomized success/failure sequences.
// Dependencies: oncall-core, proptest
// ============================================================================

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

use oncall_core::core::CircuitBreakerState;
use oncall_core::core::CircuitState;
use oncall_core::core::FAILURE_THRESHOLD;
use oncall_core::core::Timestamp;
use proptest::prelude::*;

fn at(seconds: i64) -> Timestamp {
    Timestamp::from_offset(time::OffsetDateTime::from_unix_timestamp(seconds).expect("valid unix timestamp"))
}

#[derive(Debug, Clone, Copy)]
enum Event {
    Success,
    Failure,
}

proptest! {
    #[test]
    fn never_opens_before_threshold_consecutive_closed_state_failures(
        events in prop::collection::vec(prop_oneof![Just(Event::Success), Just(Event::Failure)], 0..40),
    ) {
        // Timestamps span far less than OPEN_COOLDOWN_SECONDS, so once opened
        // the breaker cannot auto-heal within this test and every subsequent
        // event is a no-op; we only need the invariant to hold up to that point.
        let mut breaker = CircuitBreakerState::default();
        let mut consecutive = 0u32;
        for (i, event) in events.iter().enumerate() {
            if breaker.state == CircuitState::Open {
                break;
            }
            let now = at(i as i64);
            match event {
                Event::Success => {
                    consecutive = 0;
                    breaker.record_success(now);
                }
                Event::Failure => {
                    consecutive += 1;
                    breaker.record_failure(now);
                }
            }
            if breaker.state == CircuitState::Open {
                prop_assert!(consecutive >= FAILURE_THRESHOLD);
            } else {
                prop_assert!(consecutive < FAILURE_THRESHOLD);
            }
        }
    }

    #[test]
    fn closed_consecutive_failures_never_exceeds_threshold_without_opening(
        failure_run_length in 0u32..20,
    ) {
        let mut breaker = CircuitBreakerState::default();
        for i in 0..failure_run_length {
            breaker.record_failure(at(i64::from(i)));
            if i + 1 < FAILURE_THRESHOLD {
                prop_assert_eq!(breaker.state, CircuitState::Closed);
                prop_assert_eq!(breaker.consecutive_failures, i + 1);
            } else {
                prop_assert_eq!(breaker.state, CircuitState::Open);
            }
        }
    }
}

#[test]
fn reset_clears_every_counter() {
    let mut breaker = CircuitBreakerState::default();
    for i in 0..FAILURE_THRESHOLD {
        breaker.record_failure(at(i64::from(i)));
    }
    assert_eq!(breaker.state, CircuitState::Open);
    breaker.reset();
    assert_eq!(breaker.state, CircuitState::Closed);
    assert_eq!(breaker.consecutive_failures, 0);
    assert_eq!(breaker.half_open_successes, 0);
    assert!(breaker.opened_at.is_none());
}
