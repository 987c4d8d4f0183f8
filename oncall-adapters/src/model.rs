// oncall-adapters/src/model.rs
// ============================================================================
// Module: HTTP Model Client
// Description: Generic HTTP-backed ModelClient for the Analysis Engine.
// Purpose: Give the engine a real, runnable ModelClient without committing
//          to any specific model vendor's request/response shape.
// Dependencies: oncall-core, reqwest
// ============================================================================

//! ## Overview
//! `oncall_core::ModelClient` is deliberately vendor-agnostic: the engine's
//! purpose excludes picking a specific LLM provider. [`HttpModelClient`]
//! keeps that boundary in the deployed binary too — it POSTs
//! `{"prompt": ..., "deadline_ms": ...}` to an operator-configured URL and
//! expects back `{"completion": "..."}`, which any provider can be made to
//! satisfy with a thin proxy. When no URL is configured,
//! [`UnconfiguredModelClient`] fails every call, which the Analysis Engine
//! already treats as an empty plan (`analyze` maps a `ModelError` to
//! `ResolutionPlan::default()`) rather than a crash.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use oncall_core::ModelClient;
use oncall_core::ModelError;
use serde::Deserialize;
use serde::Serialize;

use crate::http::build_client;

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Request body posted to the configured model endpoint.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    /// The fully-rendered analysis prompt.
    prompt: &'a str,
    /// Caller's deadline, forwarded so a proxying endpoint can apply it to
    /// its own upstream call.
    deadline_ms: u64,
}

/// Response body expected back from the configured model endpoint.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    /// The model's free-text completion, parsed downstream by
    /// `runtime::parser::parse_response`.
    completion: String,
}

// ============================================================================
// SECTION: HTTP Model Client
// ============================================================================

/// `ModelClient` backed by a single configurable HTTP endpoint.
pub struct HttpModelClient {
    client: reqwest::Client,
    /// Endpoint URL, typically a thin proxy in front of the chosen provider.
    endpoint: String,
    /// Bearer credential forwarded as `Authorization: Bearer <key>`.
    api_key: String,
}

impl HttpModelClient {
    /// Builds a client posting to `endpoint` with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns a `reqwest::Error` if the TLS backend fails to initialize.
    pub fn new(endpoint: String, api_key: String) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client()?,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn complete(&self, prompt: &str, deadline_ms: u64) -> Result<String, ModelError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_millis(deadline_ms))
            .json(&CompletionRequest { prompt, deadline_ms })
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ModelError::Timeout
                } else {
                    ModelError::Transport(err.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(ModelError::Transport(format!("model endpoint returned {}", response.status())));
        }

        response
            .json::<CompletionResponse>()
            .await
            .map(|body| body.completion)
            .map_err(|err| ModelError::Transport(err.to_string()))
    }
}

// ============================================================================
// SECTION: Unconfigured Fallback
// ============================================================================

/// `ModelClient` used when no model endpoint is configured; every call fails
/// with [`ModelError::Transport`], which the engine already treats as "no
/// plan produced" rather than propagating a fatal error.
pub struct UnconfiguredModelClient;

#[async_trait]
impl ModelClient for UnconfiguredModelClient {
    async fn complete(&self, _prompt: &str, _deadline_ms: u64) -> Result<String, ModelError> {
        Err(ModelError::Transport("no model endpoint configured (MODEL_API_URL unset)".to_string()))
    }
}
