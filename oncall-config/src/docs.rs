// oncall-config/src/docs.rs
// ============================================================================
// Module: Oncall Config Docs Generator
// Description: Markdown generator for the §6 environment variable surface.
// Purpose: Keep operator-facing config docs in sync with `schema::config_schema`.
// Dependencies: crate::schema
// ============================================================================

//! ## Overview
//! Renders the same variable table `config_schema` exposes as a markdown
//! table, so `oncall-cli config docs` and any generated operator runbook stay
//! derived from one source of truth rather than hand-copied out of the spec.

use crate::schema::config_schema;

/// Renders the environment variable table as markdown.
#[must_use]
pub fn config_docs_markdown() -> String {
    let mut out = String::from("# Oncall Engine Configuration\n\n| Variable | Required by | Description |\n|---|---|---|\n");
    let Some(entries) = config_schema().as_array().cloned() else {
        return out;
    };
    for entry in entries {
        let name = entry["name"].as_str().unwrap_or_default();
        let required_by = entry["required_by"].as_str().unwrap_or_default();
        let description = entry["description"].as_str().unwrap_or_default();
        out.push_str(&format!("| `{name}` | {required_by} | {description} |\n"));
    }
    out
}
