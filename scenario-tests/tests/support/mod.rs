// scenario-tests/tests/support/mod.rs
// ============================================================================
// Module: Scenario Test Support
// Description: Shared alert/engine/adapter fixtures for the scenario suite.
// Purpose: Keep each scenario file focused on the behavior it is proving.
// Dependencies: oncall-core
// ============================================================================

#![allow(dead_code, reason = "not every helper is used by every test binary that includes this module")]
#![allow(clippy::unwrap_used, reason = "test-only fixtures")]
#![allow(clippy::expect_used, reason = "test-only fixtures")]

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use oncall_core::core::Alert;
use oncall_core::core::AlertSource;
use oncall_core::core::AutonomyConfig;
use oncall_core::core::AutonomyConfigHandle;
use oncall_core::core::AutonomyMode;
use oncall_core::core::ContextBundle;
use oncall_core::core::ExecutionRecord;
use oncall_core::core::LiveLogEvent;
use oncall_core::core::Severity;
use oncall_core::core::Timestamp;
use oncall_core::interfaces::DispatchError;
use oncall_core::interfaces::IncidentManagementDispatcher;
use oncall_core::interfaces::IntegrationAdapter;
use oncall_core::interfaces::LiveLogPublisher;
use oncall_core::runtime::store::InMemoryApprovalQueue;
use oncall_core::runtime::store::InMemoryAuditLog;
use oncall_core::runtime::store::InMemoryIncidentStore;
use oncall_core::runtime::IncidentEngine;
use oncall_core::testing::ScriptedAdapter;
use oncall_core::testing::ScriptedModelClient;
use oncall_core::testing::ScriptedResult;

/// Builds one alert with the given `service`/`description`, otherwise filled
/// with stable fixture values. Two alerts with the same `service` + `title` +
/// `description` share a dedup fingerprint regardless of `id`/`timestamp`.
pub fn alert(id: &str, source: AlertSource, severity: Severity, service: &str, title: &str, description: &str) -> Alert {
    Alert {
        id: id.into(),
        source,
        severity,
        title: title.to_string(),
        description: description.to_string(),
        service: service.to_string(),
        timestamp: Timestamp::now(),
        raw: serde_json::json!({}),
    }
}

/// A dispatcher that records every resolve/escalate call instead of calling out.
pub struct RecordingDispatcher {
    pub resolved: Mutex<Vec<String>>,
    pub escalated: Mutex<Vec<(String, String)>>,
}

impl RecordingDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            resolved: Mutex::new(Vec::new()),
            escalated: Mutex::new(Vec::new()),
        }
    }
}

impl Default for RecordingDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IncidentManagementDispatcher for RecordingDispatcher {
    async fn acknowledge(&self, _incident_id: &oncall_core::core::IncidentId) -> Result<(), DispatchError> {
        Ok(())
    }

    async fn resolve(&self, incident_id: &oncall_core::core::IncidentId) -> Result<(), DispatchError> {
        self.resolved.lock().expect("dispatcher mutex").push(incident_id.as_str().to_string());
        Ok(())
    }

    async fn escalate(&self, incident_id: &oncall_core::core::IncidentId, reason: &str) -> Result<(), DispatchError> {
        self.escalated
            .lock()
            .expect("dispatcher mutex")
            .push((incident_id.as_str().to_string(), reason.to_string()));
        Ok(())
    }
}

/// A publisher that records every live-log event for post-hoc assertions.
pub struct RecordingPublisher {
    pub events: Mutex<Vec<LiveLogEvent>>,
}

impl RecordingPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self { events: Mutex::new(Vec::new()) }
    }
}

impl Default for RecordingPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveLogPublisher for RecordingPublisher {
    fn publish(&self, event: &LiveLogEvent) {
        self.events.lock().expect("publisher mutex").push(event.clone());
    }
}

/// Builds an `AutonomyConfig` in `mode` with otherwise-default policy.
#[must_use]
pub fn config(mode: AutonomyMode) -> AutonomyConfig {
    AutonomyConfig {
        mode,
        ..AutonomyConfig::default()
    }
}

/// A handle around a fully wired engine plus the doubles used to assert on
/// it, so a scenario can inspect dispatcher/publisher/store state afterward.
pub struct Harness {
    pub engine: IncidentEngine,
    pub store: Arc<InMemoryIncidentStore>,
    pub audit: Arc<InMemoryAuditLog>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub publisher: Arc<RecordingPublisher>,
}

/// Assembles an engine over in-memory backends with the given `config`,
/// scripted model `responses`, and named adapters.
#[must_use]
pub fn harness(
    config: AutonomyConfig,
    responses: Vec<String>,
    adapters: BTreeMap<String, Arc<dyn IntegrationAdapter>>,
) -> Harness {
    let store = Arc::new(InMemoryIncidentStore::new());
    let audit = Arc::new(InMemoryAuditLog::new());
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let publisher = Arc::new(RecordingPublisher::new());
    let engine = IncidentEngine::new(
        store.clone(),
        audit.clone(),
        Arc::new(InMemoryApprovalQueue::new()),
        adapters,
        dispatcher.clone(),
        Arc::new(ScriptedModelClient::new(responses)),
        publisher.clone(),
        AutonomyConfigHandle::new(config),
    );
    Harness {
        engine,
        store,
        audit,
        dispatcher,
        publisher,
    }
}

/// Builds a `ScriptedAdapter` named `kubernetes` that answers one
/// `fetch_context` call with `context_data` and then replays `action_script`
/// for whatever `execute_action` calls follow.
#[must_use]
pub fn kubernetes_adapter(context_data: serde_json::Value, action_script: Vec<ScriptedResult>) -> Arc<dyn IntegrationAdapter> {
    kubernetes_adapter_with_contexts(vec![context_data], action_script)
}

/// Builds a `ScriptedAdapter` named `kubernetes` that answers successive
/// `fetch_context` calls with each entry of `context_data` in order — for
/// scenarios where the engine re-gathers context after execution (the
/// subject-gone resolution recheck, §4.7) — and then replays `action_script`
/// for whatever `execute_action` calls follow.
#[must_use]
pub fn kubernetes_adapter_with_contexts(context_data: Vec<serde_json::Value>, action_script: Vec<ScriptedResult>) -> Arc<dyn IntegrationAdapter> {
    Arc::new(ScriptedAdapter::new(
        "kubernetes",
        BTreeSet::new(),
        context_data
            .into_iter()
            .map(|data| ScriptedResult::Context(ContextBundle::ok("kubernetes".into(), data, 20, false)))
            .collect(),
        action_script,
    ))
}

/// Builds a verified-success `ExecutionRecord` for a command the kubernetes
/// adapter ran and confirmed via its post-condition predicate.
#[must_use]
pub fn verified_success(verb: &str, args: serde_json::Value, predicate: &str, observed: serde_json::Value) -> ExecutionRecord {
    ExecutionRecord {
        execution_id: "unused".into(),
        action_ref: "unused".into(),
        command: oncall_core::core::CommandSpec {
            command_id: "unused".into(),
            target_system: "kubernetes".into(),
            verb: verb.to_string(),
            args,
            dry_run: false,
            forbidden: false,
            classified_risk: oncall_core::core::RiskLevel::Medium,
        },
        started_at: Timestamp::now(),
        finished_at: Some(Timestamp::now()),
        status: oncall_core::core::ExecutionStatus::Succeeded,
        reason: None,
        stdout: format!("{verb} applied"),
        stderr: String::new(),
        verification: Some(oncall_core::core::VerificationResult {
            predicate: predicate.to_string(),
            observed,
            passed: true,
            latency_ms: 40,
        }),
        rollback_ref: None,
    }
}

/// Builds a failed, unverified `ExecutionRecord`, as a kubernetes adapter
/// would return when its post-condition check never passes.
#[must_use]
pub fn verification_failure(verb: &str) -> ExecutionRecord {
    ExecutionRecord {
        execution_id: "unused".into(),
        action_ref: "unused".into(),
        command: oncall_core::core::CommandSpec {
            command_id: "unused".into(),
            target_system: "kubernetes".into(),
            verb: verb.to_string(),
            args: serde_json::json!({}),
            dry_run: false,
            forbidden: false,
            classified_risk: oncall_core::core::RiskLevel::Medium,
        },
        started_at: Timestamp::now(),
        finished_at: Some(Timestamp::now()),
        status: oncall_core::core::ExecutionStatus::Failed,
        reason: None,
        stdout: String::new(),
        stderr: "rollout never became ready".to_string(),
        verification: None,
        rollback_ref: None,
    }
}

/// Renders a plan's actions back into the `REMEDIATION STEPS` text grammar
/// `parser::parse_response` accepts, for the round-trip invariant (§8
/// property 5). Mirrors the parser's `verb(key=value, ...) confidence=N`
/// shape exactly, including how `parse_args` lowercases nothing and keeps
/// string values bare.
#[must_use]
pub fn render_remediation_text(actions: &[(String, serde_json::Value)]) -> String {
    let mut text = String::from("ROOT CAUSE\nrendered from a resolution plan\nREMEDIATION STEPS\n");
    for (verb, params) in actions {
        let args = params
            .as_object()
            .map(|object| {
                object
                    .iter()
                    .map(|(key, value)| format!("{key}={}", value.as_str().unwrap_or_default()))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        text.push_str(&format!("{verb}({args}) confidence=0.80\n"));
    }
    text
}
