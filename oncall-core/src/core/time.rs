// oncall-core/src/core/time.rs
// ============================================================================
// Module: Oncall Timestamps
// Description: Canonical RFC 3339 timestamp wrapper used across the engine.
// Purpose: Give every timestamped record a stable, serializable, orderable type.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! All timestamps recorded by the engine (alert arrival, execution start/end,
//! approval decisions) share this one wrapper around [`time::OffsetDateTime`]
//! so that ordering and serialization are consistent everywhere a
//! `started_at <= finished_at` or dedup-window comparison is made.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// A UTC point in time, serialized as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(#[serde(with = "time::serde::rfc3339")] OffsetDateTime);

impl Timestamp {
    /// Wraps an existing `OffsetDateTime`.
    #[must_use]
    pub const fn from_offset(value: OffsetDateTime) -> Self {
        Self(value)
    }

    /// Returns the current time.
    ///
    /// This is the one place the engine reads the system clock; callers in
    /// deterministic code paths (tests, replay) should construct a
    /// `Timestamp` explicitly instead.
    #[must_use]
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Returns the inner `OffsetDateTime`.
    #[must_use]
    pub const fn as_offset(&self) -> OffsetDateTime {
        self.0
    }

    /// Returns the number of whole seconds elapsed from `self` to `other`.
    ///
    /// Negative when `other` precedes `self`.
    #[must_use]
    pub fn seconds_until(&self, other: Self) -> i64 {
        (other.0 - self.0).whole_seconds()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.format(&Rfc3339).map_or_else(
            |_| write!(f, "<invalid-timestamp>"),
            |formatted| f.write_str(&formatted),
        )
    }
}

/// Error returned when a timestamp string fails RFC 3339 parsing.
#[derive(Debug, thiserror::Error)]
#[error("invalid rfc3339 timestamp: {0}")]
pub struct TimestampParseError(String);

impl TryFrom<String> for Timestamp {
    type Error = TimestampParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        OffsetDateTime::parse(&value, &Rfc3339)
            .map(Self)
            .map_err(|_| TimestampParseError(value))
    }
}

impl From<Timestamp> for String {
    fn from(value: Timestamp) -> Self {
        value.to_string()
    }
}
