// oncall-core/src/core/identifiers.rs
// ============================================================================
// Module: Oncall Identifiers
// Description: Canonical opaque identifiers for incidents, actions, and commands.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the string-based identifiers used throughout the
//! engine. Identifiers are opaque and serialize as strings; validation is
//! handled at the ingress or planner boundary rather than within these
//! wrappers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Macro
// ============================================================================

/// Generates a newtype string identifier with the standard accessor set.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

string_id!(
    /// Externally-assigned alert identifier (`Alert.id`).
    AlertId
);
string_id!(
    /// Internally-assigned, stable incident identifier.
    IncidentId
);
string_id!(
    /// Deterministic dedup key derived from an alert's source, service, and signature.
    Fingerprint
);
string_id!(
    /// Name of an enabled integration adapter (`kubernetes`, `pagerduty`, ...).
    AdapterName
);
string_id!(
    /// Identifier for one `ResolutionAction` within a plan.
    ActionId
);
string_id!(
    /// Identifier for one expanded `CommandSpec`.
    CommandId
);
string_id!(
    /// Identifier for one `ExecutionRecord`.
    ExecutionId
);
string_id!(
    /// Identifier for one `ApprovalRequest`.
    ApprovalId
);
string_id!(
    /// Free-form action-type tag (`restart_pod`, `scale_deployment`, ...).
    ActionType
);
