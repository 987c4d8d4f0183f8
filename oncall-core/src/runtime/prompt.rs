// oncall-core/src/runtime/prompt.rs
// ============================================================================
// Module: Oncall Prompt Builder
// Description: Renders the deterministic section template the parser expects.
// Purpose: Keep prompt construction and response parsing symmetric (§4.3).
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The Analysis Engine's prompt and [`crate::runtime::parser::parse_response`]
//! are two halves of one contract: this builder renders alert context in a
//! fixed, deterministic order (alert summary, then adapters sorted by name)
//! so the model's response structure can be relied upon, and so a golden
//! transcript test can exercise both halves independently.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::core::Alert;
use crate::core::ContextBundle;

/// Renders the prompt sent to the configured model for one incident.
#[must_use]
pub fn build_prompt(alert: &Alert, context: &BTreeMap<String, ContextBundle>) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "ALERT");
    let _ = writeln!(prompt, "service: {}", alert.service);
    let _ = writeln!(prompt, "severity: {:?}", alert.severity);
    let _ = writeln!(prompt, "title: {}", alert.title);
    let _ = writeln!(prompt, "description: {}", alert.description);
    prompt.push('\n');

    let _ = writeln!(prompt, "CONTEXT");
    for (name, bundle) in context {
        if bundle.ok {
            let _ = writeln!(prompt, "- {name}: {}", bundle.data);
        } else {
            let _ = writeln!(
                prompt,
                "- {name}: unavailable ({})",
                bundle.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    prompt.push('\n');

    prompt.push_str(
        "Respond with sections titled ROOT CAUSE, IMPACT ASSESSMENT, \
         REMEDIATION STEPS, and MONITORING RECOMMENDATIONS. List one \
         remediation command per line as verb(args) confidence=0.NN.\n",
    );
    prompt
}
