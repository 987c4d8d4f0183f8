// oncall-core/tests/engine_end_to_end.rs
// ============================================================================
// Module: Incident Engine End-To-End Scenarios
// Description: Full-pipeline runs of IncidentEngine against scripted doubles.
// Purpose: Exercise dedup -> context -> analysis -> gate -> execute -> finalize
//          as one path, the way scenario-tests does against real adapters.
// Dependencies: oncall-core, tokio
// ============================================================================

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use oncall_core::core::Alert;
use oncall_core::core::AlertSource;
use oncall_core::core::ApprovalDecision;
use oncall_core::core::AutonomyConfig;
use oncall_core::core::AutonomyConfigHandle;
use oncall_core::core::AutonomyMode;
use oncall_core::core::ExecutionStatus;
use oncall_core::core::IncidentId;
use oncall_core::core::IncidentState;
use oncall_core::core::LiveLogEvent;
use oncall_core::core::Severity;
use oncall_core::core::SkipReason;
use oncall_core::core::Timestamp;
use oncall_core::interfaces::DispatchError;
use oncall_core::interfaces::IncidentManagementDispatcher;
use oncall_core::interfaces::LiveLogPublisher;
use oncall_core::runtime::store::InMemoryApprovalQueue;
use oncall_core::runtime::store::InMemoryAuditLog;
use oncall_core::runtime::store::InMemoryIncidentStore;
use oncall_core::runtime::IncidentEngine;
use oncall_core::testing::ScriptedAdapter;
use oncall_core::testing::ScriptedModelClient;
use oncall_core::testing::ScriptedResult;

struct RecordingPublisher {
    events: Mutex<Vec<LiveLogEvent>>,
}

impl RecordingPublisher {
    fn new() -> Self {
        Self { events: Mutex::new(Vec::new()) }
    }
}

impl LiveLogPublisher for RecordingPublisher {
    fn publish(&self, event: &LiveLogEvent) {
        #[expect(clippy::unwrap_used, reason = "test double: a poisoned mutex means a prior panic in this same test")]
        self.events.lock().unwrap().push(event.clone());
    }
}

struct RecordingDispatcher {
    resolved: Mutex<Vec<IncidentId>>,
    escalated: Mutex<Vec<IncidentId>>,
}

impl RecordingDispatcher {
    fn new() -> Self {
        Self {
            resolved: Mutex::new(Vec::new()),
            escalated: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl IncidentManagementDispatcher for RecordingDispatcher {
    async fn acknowledge(&self, _incident_id: &IncidentId) -> Result<(), DispatchError> {
        Ok(())
    }

    async fn resolve(&self, incident_id: &IncidentId) -> Result<(), DispatchError> {
        #[expect(clippy::unwrap_used, reason = "test double: a poisoned mutex means a prior panic in this same test")]
        self.resolved.lock().unwrap().push(incident_id.clone());
        Ok(())
    }

    async fn escalate(&self, incident_id: &IncidentId, _reason: &str) -> Result<(), DispatchError> {
        #[expect(clippy::unwrap_used, reason = "test double: a poisoned mutex means a prior panic in this same test")]
        self.escalated.lock().unwrap().push(incident_id.clone());
        Ok(())
    }
}

fn alert() -> Alert {
    Alert {
        id: "alert-1".into(),
        source: AlertSource::Pagerduty,
        severity: Severity::Critical,
        title: "checkout down".to_string(),
        description: "5xx spike".to_string(),
        service: "checkout-service".to_string(),
        timestamp: Timestamp::now(),
        raw: serde_json::json!({}),
    }
}

fn succeeding_kubernetes_adapter() -> ScriptedAdapter {
    ScriptedAdapter::new(
        "kubernetes",
        BTreeSet::new(),
        Vec::new(),
        vec![ScriptedResult::Execution(oncall_core::core::ExecutionRecord {
            execution_id: "unused".into(),
            action_ref: "unused".into(),
            command: oncall_core::core::CommandSpec {
                command_id: "unused".into(),
                target_system: "kubernetes".into(),
                verb: "restart_pod".to_string(),
                args: serde_json::json!({}),
                dry_run: false,
                forbidden: false,
                classified_risk: oncall_core::core::RiskLevel::Medium,
            },
            started_at: Timestamp::now(),
            finished_at: Some(Timestamp::now()),
            status: ExecutionStatus::Succeeded,
            reason: None,
            stdout: "pod restarted".to_string(),
            stderr: String::new(),
            verification: Some(oncall_core::core::VerificationResult {
                predicate: "pod ready".to_string(),
                observed: serde_json::json!({"ready": true}),
                passed: true,
                latency_ms: 50,
            }),
            rollback_ref: None,
        })],
    )
}

#[tokio::test]
async fn yolo_mode_auto_executes_and_resolves_via_verified_success() {
    let response = "ROOT CAUSE\nmemory pressure\nREMEDIATION STEPS\n\
                     restart_pod(pod=checkout-1) confidence=0.95\n"
        .to_string();
    let config = AutonomyConfig {
        mode: AutonomyMode::Yolo,
        ..AutonomyConfig::default()
    };

    let mut adapters: BTreeMap<String, Arc<dyn oncall_core::interfaces::IntegrationAdapter>> = BTreeMap::new();
    adapters.insert("kubernetes".to_string(), Arc::new(succeeding_kubernetes_adapter()));

    let store = Arc::new(InMemoryIncidentStore::new());
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let engine = IncidentEngine::new(
        store.clone(),
        Arc::new(InMemoryAuditLog::new()),
        Arc::new(InMemoryApprovalQueue::new()),
        adapters,
        dispatcher.clone(),
        Arc::new(ScriptedModelClient::new(vec![response])),
        Arc::new(RecordingPublisher::new()),
        AutonomyConfigHandle::new(config),
    );

    let incident_id = engine.handle_alert(alert()).await.expect("handles alert");
    let incident = store.load(&incident_id).await.expect("load").expect("exists");

    assert_eq!(incident.state, IncidentState::Resolved);
    assert_eq!(incident.terminal_outcome, Some(oncall_core::core::TerminalOutcome::ResolvedExecuted));
    assert_eq!(incident.executions.len(), 1);
    assert_eq!(incident.executions[0].status, ExecutionStatus::Succeeded);
    #[expect(clippy::unwrap_used, reason = "test double: a poisoned mutex means a prior panic in this same test")]
    let resolved = dispatcher.resolved.lock().unwrap();
    assert_eq!(resolved.as_slice(), [incident_id]);
}

#[tokio::test]
async fn approved_action_dispatches_to_adapter_and_resolves() {
    let response = "ROOT CAUSE\ndeployment stuck on bad image\nREMEDIATION STEPS\n\
                     rollback_deployment(deployment=checkout) confidence=0.9\n"
        .to_string();
    let config = AutonomyConfig {
        mode: AutonomyMode::Approval,
        ..AutonomyConfig::default()
    };

    let mut adapters: BTreeMap<String, Arc<dyn oncall_core::interfaces::IntegrationAdapter>> = BTreeMap::new();
    adapters.insert("kubernetes".to_string(), Arc::new(succeeding_kubernetes_adapter()));

    let store = Arc::new(InMemoryIncidentStore::new());
    let engine = IncidentEngine::new(
        store.clone(),
        Arc::new(InMemoryAuditLog::new()),
        Arc::new(InMemoryApprovalQueue::new()),
        adapters,
        Arc::new(RecordingDispatcher::new()),
        Arc::new(ScriptedModelClient::new(vec![response])),
        Arc::new(RecordingPublisher::new()),
        AutonomyConfigHandle::new(config),
    );

    let incident_id = engine.handle_alert(alert()).await.expect("handles alert");
    let incident = store.load(&incident_id).await.expect("load").expect("exists");
    assert_eq!(incident.state, IncidentState::AwaitingApproval);
    let approval_id = incident.approvals[0].id.clone();

    engine
        .decide_approval(&incident_id, &approval_id, ApprovalDecision::Approved, "oncall-operator", None)
        .await
        .expect("decide succeeds");

    let incident = store.load(&incident_id).await.expect("load").expect("exists");
    assert_eq!(incident.state, IncidentState::Resolved);
    assert_eq!(incident.executions.len(), 1);
    assert_eq!(incident.executions[0].status, ExecutionStatus::Succeeded);
}

#[tokio::test]
async fn rejected_approval_skips_execution_and_fails_the_incident() {
    let response = "ROOT CAUSE\ndeployment stuck on bad image\nREMEDIATION STEPS\n\
                     rollback_deployment(deployment=checkout) confidence=0.9\n"
        .to_string();
    let config = AutonomyConfig {
        mode: AutonomyMode::Approval,
        ..AutonomyConfig::default()
    };

    let store = Arc::new(InMemoryIncidentStore::new());
    let engine = IncidentEngine::new(
        store.clone(),
        Arc::new(InMemoryAuditLog::new()),
        Arc::new(InMemoryApprovalQueue::new()),
        BTreeMap::new(),
        Arc::new(RecordingDispatcher::new()),
        Arc::new(ScriptedModelClient::new(vec![response])),
        Arc::new(RecordingPublisher::new()),
        AutonomyConfigHandle::new(config),
    );

    let incident_id = engine.handle_alert(alert()).await.expect("handles alert");
    let incident = store.load(&incident_id).await.expect("load").expect("exists");
    let approval_id = incident.approvals[0].id.clone();

    engine
        .decide_approval(&incident_id, &approval_id, ApprovalDecision::Rejected, "oncall-operator", Some("too risky right now".to_string()))
        .await
        .expect("decide succeeds");

    let incident = store.load(&incident_id).await.expect("load").expect("exists");
    assert_eq!(incident.state, IncidentState::Failed);
    assert_eq!(incident.executions.len(), 1);
    assert_eq!(incident.executions[0].status, ExecutionStatus::Skipped);
}

#[tokio::test]
async fn unregistered_adapter_marks_execution_failed_not_lost() {
    let response = "ROOT CAUSE\nmemory pressure\nREMEDIATION STEPS\n\
                     restart_pod(pod=checkout-1) confidence=0.95\n"
        .to_string();
    let config = AutonomyConfig {
        mode: AutonomyMode::Yolo,
        trust_all_yolo: true,
        ..AutonomyConfig::default()
    };

    // No adapters registered at all: the command resolves to "kubernetes" but
    // nothing answers for it.
    let store = Arc::new(InMemoryIncidentStore::new());
    let engine = IncidentEngine::new(
        store.clone(),
        Arc::new(InMemoryAuditLog::new()),
        Arc::new(InMemoryApprovalQueue::new()),
        BTreeMap::new(),
        Arc::new(RecordingDispatcher::new()),
        Arc::new(ScriptedModelClient::new(vec![response])),
        Arc::new(RecordingPublisher::new()),
        AutonomyConfigHandle::new(config),
    );

    let incident_id = engine.handle_alert(alert()).await.expect("handles alert");
    let incident = store.load(&incident_id).await.expect("load").expect("exists");
    assert_eq!(incident.executions.len(), 1);
    assert_eq!(incident.executions[0].status, ExecutionStatus::Failed);
    assert_eq!(incident.executions[0].reason, Some(SkipReason::AdapterNotRegistered));
    assert_eq!(incident.state, IncidentState::Failed);
}

#[tokio::test]
async fn unresolved_placeholder_skips_with_unresolved_target_reason() {
    // The model names a deployment the context aggregator never reported, so
    // the bracketed placeholder has no candidate to resolve against.
    let response = "ROOT CAUSE\nmemory pressure\nREMEDIATION STEPS\n\
                     scale_deployment(deployment=<deployment-name>, replicas=3) confidence=0.9\n"
        .to_string();
    let config = AutonomyConfig {
        mode: AutonomyMode::Yolo,
        trust_all_yolo: true,
        ..AutonomyConfig::default()
    };

    let store = Arc::new(InMemoryIncidentStore::new());
    let engine = IncidentEngine::new(
        store.clone(),
        Arc::new(InMemoryAuditLog::new()),
        Arc::new(InMemoryApprovalQueue::new()),
        BTreeMap::new(),
        Arc::new(RecordingDispatcher::new()),
        Arc::new(ScriptedModelClient::new(vec![response])),
        Arc::new(RecordingPublisher::new()),
        AutonomyConfigHandle::new(config),
    );

    let incident_id = engine.handle_alert(alert()).await.expect("handles alert");
    let incident = store.load(&incident_id).await.expect("load").expect("exists");
    assert_eq!(incident.executions.len(), 1);
    assert_eq!(incident.executions[0].status, ExecutionStatus::Skipped);
    assert_eq!(incident.executions[0].reason, Some(SkipReason::UnresolvedTarget));
    assert_eq!(incident.state, IncidentState::Failed);
}
