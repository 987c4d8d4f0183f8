// oncall-server/src/auth.rs
// ============================================================================
// Module: Webhook Signature Authentication
// Description: HMAC-SHA256 validation of inbound webhook bodies.
// Purpose: Implement the §6 "webhook authentication" contract.
// Dependencies: hmac, sha2
// ============================================================================

//! ## Overview
//! When `WEBHOOK_SECRET` is configured, every webhook request must carry a
//! valid `X-Webhook-Signature` header: the lowercase-hex HMAC-SHA256 of the
//! raw request body, keyed by the shared secret. When no secret is
//! configured the request is accepted unauthenticated and a warning is
//! logged once per request, matching §6 verbatim.

// ============================================================================
// SECTION: Imports
// ============================================================================

use hmac::Hmac;
use hmac::Mac;
use sha2::Sha256;
use tracing::warn;

// ============================================================================
// SECTION: Header Name
// ============================================================================

/// Header carrying the hex-encoded HMAC-SHA256 signature of the raw body.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

// ============================================================================
// SECTION: Verification
// ============================================================================

/// Verifies `body` against `signature_header` under `secret`.
///
/// Returns `true` when the request should be accepted: either the signature
/// matches, or no secret is configured (in which case the caller has already
/// logged the unauthenticated-acceptance warning via [`warn_if_unconfigured`]).
#[must_use]
pub fn verify(secret: Option<&str>, body: &[u8], signature_header: Option<&str>) -> bool {
    let Some(secret) = secret else {
        return true;
    };
    let Some(signature_header) = signature_header else {
        return false;
    };
    let Ok(expected_bytes) = hex_decode(signature_header) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected_bytes).is_ok()
}

/// Logs the §6-mandated warning once per request when no webhook secret is
/// configured and the request is being accepted unauthenticated.
pub fn warn_if_unconfigured(secret: Option<&str>, route: &str) {
    if secret.is_none() {
        warn!(route, "accepting unauthenticated webhook request: WEBHOOK_SECRET is not set");
    }
}

/// Decodes a lowercase or uppercase hex string into bytes.
fn hex_decode(value: &str) -> Result<Vec<u8>, std::num::ParseIntError> {
    (0..value.len())
        .step_by(2)
        .map(|index| u8::from_str_radix(value.get(index..index + 2).unwrap_or("00"), 16))
        .collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
