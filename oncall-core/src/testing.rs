// oncall-core/src/testing.rs
// ============================================================================
// Module: Oncall Test Doubles
// Description: Deterministic ModelClient and IntegrationAdapter doubles.
// Purpose: Let scenario tests exercise the engine without a live model or cluster.
// Dependencies: crate::core, crate::interfaces, async-trait
// ============================================================================

//! ## Overview
//! These doubles are deterministic by construction: a [`ScriptedModelClient`]
//! returns pre-recorded transcripts in call order, and a [`ScriptedAdapter`]
//! returns pre-recorded context/execution results keyed by call order. Both
//! are exported (not `#[cfg(test)]`-gated) so `scenario-tests` can assemble
//! full end-to-end runs of the engine.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::ActionType;
use crate::core::AdapterName;
use crate::core::ContextBundle;
use crate::core::ExecutionRecord;
use crate::interfaces::ActionParams;
use crate::interfaces::AdapterError;
use crate::interfaces::ContextParams;
use crate::interfaces::IntegrationAdapter;
use crate::interfaces::ModelClient;
use crate::interfaces::ModelError;

// ============================================================================
// SECTION: Scripted Model Client
// ============================================================================

/// A [`ModelClient`] that replays pre-recorded responses in call order.
pub struct ScriptedModelClient {
    /// Remaining responses, stored reversed so `pop` yields call order.
    responses: Mutex<Vec<String>>,
}

impl ScriptedModelClient {
    /// Builds a client that returns each of `responses` in order, one per call.
    #[must_use]
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().rev().collect()),
        }
    }
}

#[async_trait]
impl ModelClient for ScriptedModelClient {
    async fn complete(&self, _prompt: &str, _deadline_ms: u64) -> Result<String, ModelError> {
        #[expect(clippy::unwrap_used, reason = "test double: a poisoned mutex means a prior panic in the same test")]
        let mut responses = self.responses.lock().unwrap();
        responses
            .pop()
            .ok_or_else(|| ModelError::Transport("scripted model client exhausted".to_string()))
    }
}

// ============================================================================
// SECTION: Scripted Adapter
// ============================================================================

/// A fixed result an adapter call should return for one scenario step.
pub enum ScriptedResult {
    /// Return this context bundle from `fetch_context`.
    Context(ContextBundle),
    /// Return this execution record from `execute_action`.
    Execution(ExecutionRecord),
    /// Fail the call with this adapter error.
    Error(AdapterError),
}

/// A deterministic [`IntegrationAdapter`] double driven by a fixed script.
pub struct ScriptedAdapter {
    /// Stable adapter name this double is registered under.
    name: AdapterName,
    /// Declared capability set returned by `connect`/`capabilities`.
    capabilities: BTreeSet<ActionType>,
    /// Remaining `fetch_context` results, stored reversed for `pop` order.
    context_script: Mutex<Vec<ScriptedResult>>,
    /// Remaining `execute_action` results, stored reversed for `pop` order.
    action_script: Mutex<Vec<ScriptedResult>>,
}

impl ScriptedAdapter {
    /// Builds an adapter named `name` exposing `capabilities`, replaying
    /// `context_script` for `fetch_context` calls and `action_script` for
    /// `execute_action` calls, each in call order.
    #[must_use]
    pub fn new(
        name: impl Into<AdapterName>,
        capabilities: BTreeSet<ActionType>,
        context_script: Vec<ScriptedResult>,
        action_script: Vec<ScriptedResult>,
    ) -> Self {
        Self {
            name: name.into(),
            capabilities,
            context_script: Mutex::new(context_script.into_iter().rev().collect()),
            action_script: Mutex::new(action_script.into_iter().rev().collect()),
        }
    }
}

#[async_trait]
impl IntegrationAdapter for ScriptedAdapter {
    fn name(&self) -> AdapterName {
        self.name.clone()
    }

    async fn connect(&self) -> Result<BTreeSet<ActionType>, AdapterError> {
        Ok(self.capabilities.clone())
    }

    async fn health(&self) -> bool {
        true
    }

    async fn fetch_context(&self, _params: &ContextParams) -> Result<ContextBundle, AdapterError> {
        #[expect(clippy::unwrap_used, reason = "test double: a poisoned mutex means a prior panic in the same test")]
        let mut script = self.context_script.lock().unwrap();
        match script.pop() {
            Some(ScriptedResult::Context(bundle)) => Ok(bundle),
            Some(ScriptedResult::Error(err)) => Err(err),
            Some(ScriptedResult::Execution(_)) | None => {
                Err(AdapterError::Semantic("scripted adapter context script exhausted or mismatched".to_string()))
            }
        }
    }

    async fn execute_action(
        &self,
        _action_type: ActionType,
        _params: &ActionParams,
    ) -> Result<ExecutionRecord, AdapterError> {
        #[expect(clippy::unwrap_used, reason = "test double: a poisoned mutex means a prior panic in the same test")]
        let mut script = self.action_script.lock().unwrap();
        match script.pop() {
            Some(ScriptedResult::Execution(record)) => Ok(record),
            Some(ScriptedResult::Error(err)) => Err(err),
            Some(ScriptedResult::Context(_)) | None => {
                Err(AdapterError::Semantic("scripted adapter action script exhausted or mismatched".to_string()))
            }
        }
    }

    fn capabilities(&self) -> BTreeSet<ActionType> {
        self.capabilities.clone()
    }
}
