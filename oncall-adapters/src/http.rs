// oncall-adapters/src/http.rs
// ============================================================================
// Module: Adapter HTTP Client
// Description: Shared reqwest client construction for HTTP-backed adapters.
// Purpose: Keep timeout and size-cap behavior consistent across adapters.
// Dependencies: reqwest
// ============================================================================

//! ## Overview
//! Every HTTP-backed adapter in this crate shares one client-construction
//! path so that connect timeouts, overall deadlines, and response body caps
//! are applied uniformly rather than re-derived per adapter.

use std::time::Duration;

/// Hard cap on a single response body, matching the truncation behavior
/// `ContextBundle::truncated` is meant to signal.
pub const MAX_RESPONSE_BYTES: usize = 1_000_000;

/// Builds a `reqwest::Client` with a fixed connect timeout and no retry
/// behavior of its own; adapters never retry internally (§4.1), callers do.
///
/// # Errors
///
/// Returns a `reqwest::Error` if the TLS backend fails to initialize.
pub fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .user_agent(concat!("oncall-adapters/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Truncates `body` to `MAX_RESPONSE_BYTES`, returning whether truncation
/// occurred alongside the (possibly shortened) string.
#[must_use]
pub fn cap_body(mut body: String) -> (String, bool) {
    if body.len() <= MAX_RESPONSE_BYTES {
        return (body, false);
    }
    body.truncate(MAX_RESPONSE_BYTES);
    (body, true)
}
