// oncall-core/src/runtime/parser.rs
// ============================================================================
// Module: Oncall Analysis Response Parser
// Description: Pure-function parser turning a model's free-text reply into a plan.
// Purpose: Isolate the fragile model-response frontier behind one testable function.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Per §9's design note, prompt/response parsing is the fragile frontier: it
//! lives behind one pure function, [`parse_response`], so it is unit-testable
//! against golden transcripts without a model in the loop. Section markers
//! are matched case-insensitively and stripped of leading `#`/`##`. Lines
//! outside the remediation section are diagnostics and are never promoted to
//! executable actions (§4.3) — a prior implementation's conflation of the two
//! is the bug this parser exists to not reproduce.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::core::ActionId;
use crate::core::ActionType;
use crate::core::ResolutionAction;
use crate::core::ResolutionPlan;
use crate::core::RiskLevel;
use crate::runtime::risk::CommandView;
use crate::runtime::risk::classify_command;

// ============================================================================
// SECTION: Section Markers
// ============================================================================

/// The plan sections this parser recognizes, in the order most transcripts use them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    /// Narrative preceding any recognized marker; discarded.
    Preamble,
    /// `ROOT CAUSE`.
    RootCause,
    /// `IMPACT ASSESSMENT`.
    ImpactAssessment,
    /// `REMEDIATION STEPS` or `IMMEDIATE ACTIONS`.
    Remediation,
    /// `MONITORING RECOMMENDATIONS`.
    Monitoring,
}

/// Recognized verbs for the Kubernetes adapter's execute-action vocabulary (§4.1),
/// plus generic `kubectl <verb>` phrasing the model sometimes falls back to.
const RECOGNIZED_VERBS: &[&str] = &[
    "restart_pod",
    "scale_deployment",
    "patch_memory_limit",
    "patch_cpu_limit",
    "rollback_deployment",
    "set_image",
    "apply_manifest",
    "delete_namespace",
    "delete_node",
    "delete_pv",
    "delete_pvc",
];

fn match_section(line: &str) -> Option<Section> {
    let trimmed = line.trim_start_matches('#').trim().to_ascii_uppercase();
    match trimmed.as_str() {
        "ROOT CAUSE" => Some(Section::RootCause),
        "IMPACT ASSESSMENT" => Some(Section::ImpactAssessment),
        "REMEDIATION STEPS" | "IMMEDIATE ACTIONS" => Some(Section::Remediation),
        "MONITORING RECOMMENDATIONS" => Some(Section::Monitoring),
        _ => None,
    }
}

// ============================================================================
// SECTION: Parse Error
// ============================================================================

/// Raised when a model response cannot be parsed into a plan at all.
///
/// An empty-but-well-formed response (no remediation section, or a section
/// with no recognizable commands) is *not* an error — it produces a
/// zero-action [`ResolutionPlan`] (§4.3 failure mode: `analysis_empty`).
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The response contained no recognized section markers at all.
    #[error("response contained no recognized section markers")]
    NoSections,
}

// ============================================================================
// SECTION: Command Line Parsing
// ============================================================================

/// Strips a markdown code-fence marker line, returning `None` for pure fence
/// delimiters (```), so callers skip them without emitting an empty action.
fn strip_fence(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.starts_with("```") {
        return None;
    }
    Some(trimmed)
}

/// Extracted pieces of one candidate remediation line.
struct CommandLine<'a> {
    verb: &'a str,
    rest: &'a str,
}

/// Recognizes a leading verb, in either `verb(args)` or `kubectl verb args` form.
fn recognize_command(line: &str) -> Option<CommandLine<'_>> {
    let line = line.trim_start_matches('-').trim();

    if let Some(stripped) = line.strip_prefix("kubectl ") {
        let verb = stripped.split_whitespace().next()?;
        if RECOGNIZED_VERBS.contains(&verb) || verb == "delete" {
            return Some(CommandLine {
                verb,
                rest: stripped[verb.len() ..].trim(),
            });
        }
        return None;
    }

    let verb = line.split(|c: char| c == '(' || c.is_whitespace()).next()?;
    if RECOGNIZED_VERBS.contains(&verb) {
        let rest = line[verb.len() ..].trim();
        return Some(CommandLine { verb, rest });
    }
    None
}

/// Parses `key=value, key2=value2` pairs inside optional parentheses into a
/// JSON object; values are left as strings (the Planner resolves placeholders
/// and types them against context).
fn parse_args(rest: &str) -> Value {
    let inner = rest.trim().trim_start_matches('(').trim_end_matches(')');
    let mut map = serde_json::Map::new();
    for pair in inner.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        if let Some((key, value)) = pair.split_once('=').or_else(|| pair.split_once(':')) {
            map.insert(
                key.trim().to_string(),
                Value::String(value.trim().trim_matches('"').to_string()),
            );
        }
    }
    Value::Object(map)
}

/// Extracts a trailing `confidence=0.NN` or `confidence: 0.NN` annotation, if present.
fn extract_confidence(line: &str) -> Option<f64> {
    let lower = line.to_ascii_lowercase();
    let idx = lower.find("confidence")?;
    let after = &line[idx + "confidence".len() ..];
    let after = after.trim_start_matches([':', '=', ' ']);
    let digits: String = after
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse::<f64>().ok().map(|v| v.clamp(0.0, 1.0))
}

/// Default confidence assigned when a remediation line carries no explicit
/// annotation; conservative enough to avoid auto-execution in `yolo` mode.
const DEFAULT_CONFIDENCE: f64 = 0.6;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Parses a model's free-text analysis response into a [`ResolutionPlan`].
///
/// `next_action_id` assigns stable ids to each recognized action in order.
///
/// # Errors
///
/// Returns [`ParseError::NoSections`] if the response contains none of the
/// recognized section markers at all — distinct from a well-formed response
/// whose remediation section is simply empty, which parses successfully to a
/// zero-action plan.
pub fn parse_response(
    text: &str,
    mut next_action_id: impl FnMut() -> ActionId,
) -> Result<ResolutionPlan, ParseError> {
    let mut section = Section::Preamble;
    let mut saw_any_section = false;
    let mut root_cause_lines = Vec::new();
    let mut impact_lines = Vec::new();
    let mut monitoring = Vec::new();
    let mut actions = Vec::new();

    for raw_line in text.lines() {
        if let Some(next) = match_section(raw_line) {
            section = next;
            saw_any_section = true;
            continue;
        }

        match section {
            Section::Preamble => {}
            Section::RootCause => {
                if !raw_line.trim().is_empty() {
                    root_cause_lines.push(raw_line.trim());
                }
            }
            Section::ImpactAssessment => {
                if !raw_line.trim().is_empty() {
                    impact_lines.push(raw_line.trim());
                }
            }
            Section::Monitoring => {
                if !raw_line.trim().is_empty() {
                    monitoring.push(raw_line.trim().to_string());
                }
            }
            Section::Remediation => {
                let Some(line) = strip_fence(raw_line) else {
                    continue;
                };
                if line.is_empty() {
                    continue;
                }
                let Some(command) = recognize_command(line) else {
                    continue;
                };
                let action_type = ActionType::new(command.verb);
                let params = parse_args(command.rest);
                let confidence = extract_confidence(line).unwrap_or(DEFAULT_CONFIDENCE);
                let risk_level = classify_command(&CommandView {
                    verb: command.verb,
                    namespace: None,
                    wildcard_selector: false,
                    cluster_scoped: false,
                });

                actions.push(ResolutionAction {
                    action_id: next_action_id(),
                    action_type,
                    params,
                    description: line.to_string(),
                    confidence,
                    risk_level,
                    estimated_duration: None,
                    rollback_possible: false,
                    prerequisites: Vec::new(),
                    commands: Vec::new(),
                });
            }
        }
    }

    if !saw_any_section {
        return Err(ParseError::NoSections);
    }

    Ok(ResolutionPlan {
        root_cause: root_cause_lines.join(" "),
        impact_assessment: impact_lines.join(" "),
        actions,
        monitoring_recommendations: monitoring,
    })
}

/// Convenience used where an expected risk mismatch would otherwise be
/// silently downgraded; kept as a free function since `ResolutionPlan`
/// itself carries no notion of a "best" risk.
#[must_use]
pub const fn higher_risk(a: RiskLevel, b: RiskLevel) -> RiskLevel {
    if matches!(a, RiskLevel::High) || matches!(b, RiskLevel::High) {
        RiskLevel::High
    } else if matches!(a, RiskLevel::Medium) || matches!(b, RiskLevel::Medium) {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}
