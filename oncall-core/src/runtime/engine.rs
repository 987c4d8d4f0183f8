// oncall-core/src/runtime/engine.rs
// ============================================================================
// Module: Oncall Incident Engine
// Description: Drives one incident through the full lifecycle state machine.
// Purpose: Implement §4.7, composing every other runtime module per alert.
// Dependencies: crate::core, crate::interfaces, crate::runtime::*
// ============================================================================

//! ## Overview
//! [`IncidentEngine`] is the only component that mutates an [`Incident`]
//! directly (§3 "Ownership"); every other module is consulted for a decision
//! and returns a value the engine applies. One call to
//! [`IncidentEngine::handle_alert`] drives an incident from `received` through
//! `context_gathering`, `analyzing`, the gate-routed
//! `awaiting_approval`/`executing` branch, `verifying`, and into a terminal
//! state, emitting a [`LiveLogEvent`] at every transition.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crate::core::ActionId;
use crate::core::Actor;
use crate::core::Alert;
use crate::core::ApprovalDecision;
use crate::core::ApprovalId;
use crate::core::ApprovalRequest;
use crate::core::AutonomyConfigHandle;
use crate::core::CircuitBreakerState;
use crate::core::CircuitState;
use crate::core::CommandId;
use crate::core::CommandSpec;
use crate::core::EventKind;
use crate::core::ExecutionId;
use crate::core::ExecutionRecord;
use crate::core::Incident;
use crate::core::IncidentId;
use crate::core::IncidentState;
use crate::core::LiveLogEvent;
use crate::core::ResolutionPlan;
use crate::core::SkipReason;
use crate::core::TerminalOutcome;
use crate::core::Timestamp;
use crate::interfaces::ApprovalQueue;
use crate::interfaces::AuditLog;
use crate::interfaces::ContextParams;
use crate::interfaces::IncidentManagementDispatcher;
use crate::interfaces::IncidentStore;
use crate::interfaces::IntegrationAdapter;
use crate::interfaces::LiveLogPublisher;
use crate::interfaces::ModelClient;
use crate::interfaces::StoreError;
use crate::runtime::aggregator;
use crate::runtime::dedup;
use crate::runtime::dedup::DedupOutcome;
use crate::runtime::executor;
use crate::runtime::gate;
use crate::runtime::gate::GateDecision;
use crate::runtime::parser;
use crate::runtime::planner;
use crate::runtime::planner::ExpansionOutcome;
use crate::runtime::prompt::build_prompt;

/// Default incident-level deadline (§5): total wall-clock budget for one
/// incident before it would be abandoned with `Timeout` by an external
/// supervisor; the engine itself does not yet enforce this (see `DESIGN.md`).
pub const DEFAULT_INCIDENT_DEADLINE_MS: u64 = 30 * 60 * 1000;

/// Default deduplication window (§4.1): alerts sharing a fingerprint fold
/// into the same open incident only while it is this recent; older open
/// incidents with a matching fingerprint get a fresh incident instead.
pub const DEFAULT_DEDUP_WINDOW_SECONDS: u64 = 300;

/// Errors raised while driving an incident through the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The incident store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The dedup step failed.
    #[error(transparent)]
    Dedup(#[from] dedup::DedupError),
    /// The executor's audit append failed.
    #[error(transparent)]
    Executor(#[from] executor::ExecutorError),
    /// An incident id referenced by the caller does not exist.
    #[error("incident {0} not found")]
    IncidentNotFound(IncidentId),
    /// An approval id referenced by the caller does not exist, or was already decided.
    #[error("approval request {0} not found or already decided")]
    ApprovalNotFound(ApprovalId),
}

/// Monotonic id generator for action/command/execution ids minted within one
/// engine instance; ids are process-local and never persisted independent of
/// the record they label.
#[derive(Debug, Default)]
struct IdSequence(
    /// Next id to hand out.
    AtomicU64,
);

impl IdSequence {
    /// Mints the next id under `prefix`.
    fn next(&self, prefix: &str) -> String {
        let n = self.0.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}-{n}")
    }
}

// ============================================================================
// SECTION: Incident Engine
// ============================================================================

/// Composes every runtime module into the full per-incident pipeline.
pub struct IncidentEngine {
    /// Durable incident records.
    store: Arc<dyn IncidentStore>,
    /// Durable append-only audit trail.
    audit: Arc<dyn AuditLog>,
    /// Durable queue of pending operator decisions.
    approvals: Arc<dyn ApprovalQueue>,
    /// Registered integration adapters, keyed by adapter name.
    adapters: BTreeMap<String, Arc<dyn IntegrationAdapter>>,
    /// Upstream incident-management system notified of lifecycle transitions.
    dispatcher: Arc<dyn IncidentManagementDispatcher>,
    /// The configured Analysis Engine model.
    model: Arc<dyn ModelClient>,
    /// Best-effort operator-facing event stream.
    publisher: Arc<dyn LiveLogPublisher>,
    /// Hot-reloadable autonomy policy.
    config: AutonomyConfigHandle,
    /// Process-wide execution circuit breaker.
    circuit: Mutex<CircuitBreakerState>,
    /// Process-local id generator for commands, executions, and approvals.
    ids: IdSequence,
    /// Window within which a new alert folds into an already-open incident
    /// sharing its fingerprint, rather than spawning a fresh one.
    dedup_window_seconds: u64,
}

impl IncidentEngine {
    /// Builds an engine wired to concrete backends.
    #[must_use]
    #[expect(
        clippy::too_many_arguments,
        reason = "every field is an independently-configured collaborator; grouping a subset into a sub-struct would only rename this parameter list"
    )]
    pub fn new(
        store: Arc<dyn IncidentStore>,
        audit: Arc<dyn AuditLog>,
        approvals: Arc<dyn ApprovalQueue>,
        adapters: BTreeMap<String, Arc<dyn IntegrationAdapter>>,
        dispatcher: Arc<dyn IncidentManagementDispatcher>,
        model: Arc<dyn ModelClient>,
        publisher: Arc<dyn LiveLogPublisher>,
        config: AutonomyConfigHandle,
    ) -> Self {
        Self {
            store,
            audit,
            approvals,
            adapters,
            dispatcher,
            model,
            publisher,
            config,
            circuit: Mutex::new(CircuitBreakerState::default()),
            ids: IdSequence::default(),
            dedup_window_seconds: DEFAULT_DEDUP_WINDOW_SECONDS,
        }
    }

    /// Overrides the deduplication window from its default (§4.1); the
    /// configured `INCIDENT_DEDUP_WINDOW_SECONDS` value flows in through
    /// this builder rather than a ninth constructor argument.
    #[must_use]
    pub fn with_dedup_window_seconds(mut self, seconds: u64) -> Self {
        self.dedup_window_seconds = seconds;
        self
    }

    /// The engine's hot-reloadable autonomy policy handle, for operator
    /// surfaces (HTTP routes, the CLI) that flip `emergency_stop` or reload
    /// the whole config without going through a fresh `IncidentEngine`.
    #[must_use]
    pub fn autonomy_config(&self) -> &AutonomyConfigHandle {
        &self.config
    }

    /// Manually resets the execution circuit breaker to `closed`, per §4.6
    /// ("Manual reset is permitted"). Intended for operator use once the
    /// underlying failure has been addressed out of band.
    ///
    /// # Panics
    ///
    /// Panics only if the breaker lock is poisoned by a prior panic inside a
    /// concurrent call on this same engine.
    pub fn reset_circuit_breaker(&self) {
        #[expect(
            clippy::unwrap_used,
            reason = "a poisoned breaker lock means a prior panic inside the executor; there is no safe state to reset from"
        )]
        let mut guard = self.circuit.lock().unwrap();
        guard.reset();
    }

    /// Publishes one live-log event, best-effort.
    fn emit(&self, incident_id: &IncidentId, now: Timestamp, kind: EventKind) {
        self.publisher
            .publish(&LiveLogEvent::new(incident_id.clone(), now, kind));
    }

    /// Returns the breaker's externally observable state, advancing it past
    /// cooldown first.
    ///
    /// # Panics
    ///
    /// Panics only if the breaker lock is poisoned by a prior panic inside a
    /// concurrent call on this same engine.
    fn effective_circuit_state(&self, now: Timestamp) -> CircuitState {
        #[expect(
            clippy::unwrap_used,
            reason = "a poisoned breaker lock means a prior panic inside the executor; there is no safe state to report"
        )]
        let mut guard = self.circuit.lock().unwrap();
        guard.tick(now);
        guard.effective_state(now)
    }

    /// Ingests one alert through the full pipeline: dedup, context gathering,
    /// analysis, gated planning, execution, and finalization.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if a durable backend (store, audit log) fails.
    /// Adapter and model failures are captured as incident state rather than
    /// raised, per §4's "adapters never bubble arbitrary errors" design.
    pub async fn handle_alert(&self, alert: Alert) -> Result<IncidentId, EngineError> {
        let now = Timestamp::now();
        let new_incident_id: IncidentId = self.ids.next("incident").into();

        let outcome = dedup::deduplicate(
            self.store.as_ref(),
            alert,
            new_incident_id,
            now,
            self.dedup_window_seconds,
        )
        .await?;
        let incident_id = match outcome {
            // The fold already appended to alert_history and saved inside
            // `dedup::deduplicate`; re-running context/analysis/planning for
            // an incident already in flight would double the adapter calls
            // the second arrival is supposed to avoid (§8 property 3).
            DedupOutcome::Folded(id) => return Ok(id),
            DedupOutcome::Created(id) => id,
        };

        let mut incident = self
            .store
            .load(&incident_id)
            .await?
            .ok_or_else(|| EngineError::IncidentNotFound(incident_id.clone()))?;

        self.emit(
            &incident_id,
            now,
            EventKind::IncidentCreated {
                source: format!("{:?}", incident.alert.source),
                service: incident.alert.service.clone(),
            },
        );

        incident.state = IncidentState::Deduplicated;
        self.store.save(&incident).await?;

        self.gather_context(&mut incident).await?;
        self.analyze(&mut incident).await?;
        self.plan_and_route(&mut incident).await?;
        self.finalize(&mut incident).await?;

        self.store.save(&incident).await?;
        Ok(incident_id)
    }

    /// Runs the Context Aggregator fan-out and records the result.
    async fn gather_context(&self, incident: &mut Incident) -> Result<(), EngineError> {
        incident.state = IncidentState::ContextGathering;
        self.store.save(incident).await?;

        let adapters: Vec<Arc<dyn IntegrationAdapter>> = self.adapters.values().cloned().collect();
        let params = ContextParams {
            service: incident.alert.service.clone(),
            namespace: None,
            resource_hints: Vec::new(),
            time_window_seconds: 300,
            deadline_ms: aggregator::DEFAULT_ADAPTER_DEADLINE_MS,
        };
        let context = aggregator::gather_context(&adapters, &params, aggregator::DEFAULT_OVERALL_DEADLINE_MS).await;

        let succeeded = context.values().filter(|b| b.ok).count();
        let failed = context.len() - succeeded;
        incident.context = context;
        self.emit(
            &incident.incident_id,
            Timestamp::now(),
            EventKind::ContextGathered { succeeded, failed },
        );
        self.store.save(incident).await
    }

    /// Calls the Analysis Engine model and parses its response into a plan.
    async fn analyze(&self, incident: &mut Incident) -> Result<(), EngineError> {
        incident.state = IncidentState::Analyzing;
        self.store.save(incident).await?;

        let prompt = build_prompt(&incident.alert, &incident.context);
        let plan = match self.model.complete(&prompt, 60_000).await {
            Ok(text) => {
                let ids = &self.ids;
                parser::parse_response(&text, || ids.next("action").into()).ok()
            }
            Err(_) => None,
        };

        // A model timeout/transport error and an unparseable response both
        // leave `plan` absent (§4.3): neither is the same as a well-formed
        // response that simply recommends nothing, which keeps its (empty)
        // plan and is handled by `finalize`'s `auto_recovered` branch.
        self.emit(
            &incident.incident_id,
            Timestamp::now(),
            EventKind::PlanProduced {
                action_count: plan.as_ref().map_or(0, |p| p.actions.len()),
            },
        );
        incident.plan = plan;
        self.store.save(incident).await
    }

    /// Expands every action into a command, routes it through the Autonomy
    /// Gate, and dispatches or suspends it accordingly.
    async fn plan_and_route(&self, incident: &mut Incident) -> Result<(), EngineError> {
        let Some(mut plan) = incident.plan.clone() else {
            return Ok(());
        };

        let config = self.config.load();
        let now = Timestamp::now();
        let circuit_state = self.effective_circuit_state(now);
        // §4.1/§6: destructive operations stay off by default regardless of
        // autonomy mode; only an operator opting in, or an explicit dry-run
        // override, changes what `CommandSpec.dry_run` carries downstream.
        let dry_run = !config.destructive_operations_enabled || config.dry_run_mode;

        for action in &mut plan.actions {
            let ids = &self.ids;
            let outcome = planner::expand_action(action, &incident.context, dry_run, || {
                CommandId::from(ids.next("command"))
            });

            let commands = match outcome {
                ExpansionOutcome::Commands(commands) => commands,
                ExpansionOutcome::Skip(reason) => {
                    self.emit(
                        &incident.incident_id,
                        now,
                        EventKind::ActionPlanned {
                            action_ref: action.action_id.clone(),
                        },
                    );
                    let record = executor::skip(
                        &incident.incident_id,
                        action.action_id.clone(),
                        unresolved_command_placeholder(action),
                        reason,
                        || ExecutionId::from(self.ids.next("execution")),
                        self.audit.as_ref(),
                        now,
                    )
                    .await?;
                    incident.executions.push(record);
                    self.store.save(incident).await?;
                    continue;
                }
            };
            action.commands = commands.clone();

            self.emit(
                &incident.incident_id,
                now,
                EventKind::ActionPlanned {
                    action_ref: action.action_id.clone(),
                },
            );

            for command in commands {
                if command.forbidden {
                    let record = executor::skip(
                        &incident.incident_id,
                        action.action_id.clone(),
                        command,
                        SkipReason::PolicyForbidden,
                        || ExecutionId::from(self.ids.next("execution")),
                        self.audit.as_ref(),
                        now,
                    )
                    .await?;
                    incident.executions.push(record);
                    continue;
                }

                let decision = gate::decide(&config, circuit_state, command.classified_risk, action.confidence);
                match decision {
                    GateDecision::AutoExecute => {
                        self.emit(
                            &incident.incident_id,
                            now,
                            EventKind::ActionExecuting {
                                action_ref: action.action_id.clone(),
                            },
                        );
                        let records = self
                            .dispatch_with_rollback(&incident.incident_id, action, command, Actor::System, now)
                            .await?;
                        if let Some(record) = records.first() {
                            self.emit(
                                &incident.incident_id,
                                now,
                                EventKind::ActionCompleted {
                                    action_ref: action.action_id.clone(),
                                    status: format!("{:?}", record.status),
                                },
                            );
                        }
                        incident.executions.extend(records);
                    }
                    GateDecision::RequireApproval => {
                        let request = ApprovalRequest::new(
                            ApprovalId::from(self.ids.next("approval")),
                            incident.incident_id.clone(),
                            action.action_id.clone(),
                            &command,
                            action.confidence,
                            now,
                        );
                        self.approvals.put(&request).await?;
                        self.emit(
                            &incident.incident_id,
                            now,
                            EventKind::ApprovalRequested {
                                action_ref: action.action_id.clone(),
                            },
                        );
                        incident.approvals.push(request);
                    }
                    GateDecision::PreviewOnly(reason) => {
                        let record = executor::skip(
                            &incident.incident_id,
                            action.action_id.clone(),
                            command,
                            reason,
                            || ExecutionId::from(self.ids.next("execution")),
                            self.audit.as_ref(),
                            now,
                        )
                        .await?;
                        incident.executions.push(record);
                    }
                }
            }
            self.store.save(incident).await?;
        }

        incident.plan = Some(plan);
        incident.state = if incident.approvals.iter().any(|a| a.decision == ApprovalDecision::Pending) {
            IncidentState::AwaitingApproval
        } else {
            IncidentState::Verifying
        };
        self.store.save(incident).await
    }

    /// Dispatches `command` for `action` and, if it finishes without a
    /// passing verification and the action declared `rollback_possible`,
    /// immediately schedules and runs a `rollback_deployment` against the
    /// same deployment (§4.6 step 5). Returns every `ExecutionRecord`
    /// produced, in order; the first's `rollback_ref` is set to the
    /// second's id when a rollback ran.
    ///
    /// The rollback target is derived from the failed action's own
    /// `deployment` parameter — the data model carries no separate rollback
    /// command of its own (§3 models `rollback_possible` as a bare bool), so
    /// `rollback_deployment` against the same deployment is the only rollback
    /// this engine can construct without the model supplying one explicitly.
    /// An action with no `deployment` parameter, or whose own verb already
    /// is `rollback_deployment`, runs without a rollback attempt.
    async fn dispatch_with_rollback(
        &self,
        incident_id: &IncidentId,
        action: &crate::core::ResolutionAction,
        command: CommandSpec,
        actor: Actor,
        now: Timestamp,
    ) -> Result<Vec<ExecutionRecord>, EngineError> {
        let target_system = command.target_system.clone();
        let dry_run = command.dry_run;
        let verb = command.verb.clone();
        let mut record = self
            .dispatch(incident_id, action.action_id.clone(), command, actor.clone(), now)
            .await?;

        if record.is_verified_success() || !action.rollback_possible || verb == "rollback_deployment" {
            return Ok(vec![record]);
        }
        let Some(deployment) = action.params.get("deployment").and_then(serde_json::Value::as_str) else {
            return Ok(vec![record]);
        };

        let rollback_command = CommandSpec {
            command_id: CommandId::from(self.ids.next("command")),
            target_system,
            verb: "rollback_deployment".to_string(),
            args: serde_json::json!({ "deployment": deployment }),
            dry_run,
            forbidden: false,
            classified_risk: crate::runtime::risk::classify_command(&crate::runtime::risk::CommandView {
                verb: "rollback_deployment",
                namespace: None,
                wildcard_selector: false,
                cluster_scoped: false,
            }),
        };

        self.emit(
            incident_id,
            now,
            EventKind::ActionExecuting {
                action_ref: action.action_id.clone(),
            },
        );
        let rollback_record = self
            .dispatch(incident_id, action.action_id.clone(), rollback_command, actor, now)
            .await?;
        record.rollback_ref = Some(rollback_record.execution_id.clone());
        Ok(vec![record, rollback_record])
    }

    /// Locks the breaker and runs one command through the Executor.
    async fn dispatch(
        &self,
        incident_id: &IncidentId,
        action_ref: ActionId,
        command: CommandSpec,
        actor: Actor,
        now: Timestamp,
    ) -> Result<ExecutionRecord, EngineError> {
        #[expect(
            clippy::unwrap_used,
            reason = "a poisoned breaker lock means a prior panic inside a concurrent call to this same engine; there is no safe state to execute against"
        )]
        let mut circuit = self.circuit.lock().unwrap();
        executor::execute(
            incident_id,
            action_ref,
            command,
            &self.adapters,
            self.audit.as_ref(),
            actor,
            &mut circuit,
            || ExecutionId::from(self.ids.next("execution")),
            now,
        )
        .await
        .map_err(EngineError::from)
    }

    /// Applies an operator's decision to a pending approval, executing the
    /// command immediately when approved.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the incident or approval cannot be found,
    /// or a durable backend fails.
    pub async fn decide_approval(
        &self,
        incident_id: &IncidentId,
        approval_id: &ApprovalId,
        decision: ApprovalDecision,
        decided_by: &str,
        comment: Option<String>,
    ) -> Result<(), EngineError> {
        let now = Timestamp::now();
        let mut request = self
            .approvals
            .get(approval_id)
            .await?
            .ok_or_else(|| EngineError::ApprovalNotFound(approval_id.clone()))?;
        request
            .decide(decision, decided_by, now, comment)
            .map_err(|_| EngineError::ApprovalNotFound(approval_id.clone()))?;
        self.approvals.put(&request).await?;

        self.emit(
            incident_id,
            now,
            EventKind::ApprovalDecided {
                action_ref: request.action_ref.clone(),
                decision: format!("{decision:?}").to_lowercase(),
            },
        );

        let mut incident = self
            .store
            .load(incident_id)
            .await?
            .ok_or_else(|| EngineError::IncidentNotFound(incident_id.clone()))?;

        if let Some((action, command)) =
            find_pending_action_and_command(&incident, &request.action_ref, &request.command_id)
        {
            let records = if decision == ApprovalDecision::Approved {
                self.dispatch_with_rollback(
                    incident_id,
                    &action,
                    command,
                    Actor::Operator {
                        identity: decided_by.to_string(),
                    },
                    now,
                )
                .await?
            } else {
                vec![
                    executor::skip(
                        incident_id,
                        request.action_ref.clone(),
                        command,
                        SkipReason::ApprovalRejected,
                        || ExecutionId::from(self.ids.next("execution")),
                        self.audit.as_ref(),
                        now,
                    )
                    .await?,
                ]
            };
            incident.executions.extend(records);
        }

        if !incident
            .approvals
            .iter()
            .any(|a| a.decision == ApprovalDecision::Pending)
        {
            incident.state = IncidentState::Verifying;
        }

        self.finalize(&mut incident).await?;
        self.store.save(&incident).await
    }

    /// Re-gathers context for `incident`'s service and reports whether the
    /// alerting subject can no longer be located (§4.7 resolution rule (b)):
    /// every adapter that answered reports zero pods and zero deployments.
    /// An adapter that failed or has no opinion on pod/deployment presence
    /// (i.e. omits both fields) does not count as evidence either way, so a
    /// context bundle with no adapters able to answer leaves the subject
    /// considered still present rather than defaulting to "gone".
    async fn subject_gone(&self, incident: &Incident) -> bool {
        let adapters: Vec<Arc<dyn IntegrationAdapter>> = self.adapters.values().cloned().collect();
        let params = ContextParams {
            service: incident.alert.service.clone(),
            namespace: None,
            resource_hints: Vec::new(),
            time_window_seconds: 300,
            deadline_ms: aggregator::DEFAULT_ADAPTER_DEADLINE_MS,
        };
        let context = aggregator::gather_context(&adapters, &params, aggregator::DEFAULT_OVERALL_DEADLINE_MS).await;

        let mut any_evidence = false;
        for bundle in context.values() {
            if !bundle.ok {
                continue;
            }
            let pods = bundle.data.get("pods").and_then(|v| v.as_array());
            let deployments = bundle.data.get("deployments").and_then(|v| v.as_array());
            if pods.is_none() && deployments.is_none() {
                continue;
            }
            any_evidence = true;
            let pods_present = pods.is_some_and(|a| !a.is_empty());
            let deployments_present = deployments.is_some_and(|a| !a.is_empty());
            if pods_present || deployments_present {
                return false;
            }
        }
        any_evidence
    }

    /// Determines whether the incident has reached a terminal state and, if
    /// so, sets `state`/`terminal_outcome` and notifies the dispatcher.
    async fn finalize(&self, incident: &mut Incident) -> Result<(), EngineError> {
        if incident.state.is_terminal() {
            return Ok(());
        }
        if incident
            .approvals
            .iter()
            .any(|a| a.decision == ApprovalDecision::Pending)
        {
            return Ok(());
        }

        let outcome = if incident.has_verified_success() {
            TerminalOutcome::ResolvedExecuted
        } else if incident.plan.is_none() {
            // Model timeout or an unparseable response (§4.3): no plan ever
            // existed, so there is nothing left to execute or recover from.
            TerminalOutcome::AnalysisFailed
        } else if incident.has_attempted_execution() && self.subject_gone(incident).await {
            TerminalOutcome::ResolvedSubjectGone
        } else if self.effective_circuit_state(Timestamp::now()) == CircuitState::Open {
            TerminalOutcome::CircuitOpen
        } else if incident.plan.as_ref().is_some_and(ResolutionPlan::is_empty) {
            TerminalOutcome::AutoRecovered
        } else {
            TerminalOutcome::NoExecutableActions
        };

        incident.state = match outcome {
            TerminalOutcome::ResolvedExecuted | TerminalOutcome::ResolvedSubjectGone => IncidentState::Resolved,
            TerminalOutcome::OperatorAbort | TerminalOutcome::AutoRecovered => IncidentState::Abandoned,
            TerminalOutcome::CircuitOpen
            | TerminalOutcome::Timeout
            | TerminalOutcome::NoExecutableActions
            | TerminalOutcome::AnalysisFailed => IncidentState::Failed,
        };
        incident.terminal_outcome = Some(outcome);
        incident.updated_at = Timestamp::now();

        self.emit(
            &incident.incident_id,
            incident.updated_at,
            EventKind::IncidentResolved {
                outcome: format!("{outcome:?}"),
            },
        );

        let dispatch_result = if incident.state == IncidentState::Resolved {
            self.dispatcher.resolve(&incident.incident_id).await
        } else {
            self.dispatcher
                .escalate(&incident.incident_id, &format!("{outcome:?}"))
                .await
        };
        if let Err(err) = dispatch_result {
            tracing::warn!(error = %err, incident_id = %incident.incident_id, "incident-management dispatch failed; terminal state retained");
        }

        Ok(())
    }
}

/// Finds the action and the specific command `command_id` identifies, still
/// pending an execution decision (i.e. no `ExecutionRecord` yet exists for
/// that command). An action that fanned out into several candidate commands
/// (an ambiguous placeholder, §4.4) can have some already decided and others
/// still pending, so the lookup is keyed by command, not by action alone.
fn find_pending_action_and_command(
    incident: &Incident,
    action_ref: &ActionId,
    command_id: &CommandId,
) -> Option<(crate::core::ResolutionAction, CommandSpec)> {
    if incident.executions.iter().any(|e| e.command.command_id == *command_id) {
        return None;
    }
    let action = incident
        .plan
        .as_ref()?
        .actions
        .iter()
        .find(|a| &a.action_id == action_ref)?;
    let command = action.commands.iter().find(|c| &c.command_id == command_id).cloned()?;
    Some((action.clone(), command))
}

/// Builds a placeholder `CommandSpec` for an action the Planner could not
/// expand at all (an unresolved or high-risk-ambiguous placeholder), so the
/// skip path still has something to attach to the `ExecutionRecord` and
/// audit trail.
fn unresolved_command_placeholder(action: &crate::core::ResolutionAction) -> CommandSpec {
    CommandSpec {
        command_id: CommandId::from(format!("{}-unresolved", action.action_id.as_str())),
        target_system: planner::target_system_for(action.action_type.as_str()),
        verb: action.action_type.as_str().to_string(),
        args: action.params.clone(),
        dry_run: true,
        forbidden: false,
        classified_risk: action.risk_level,
    }
}
