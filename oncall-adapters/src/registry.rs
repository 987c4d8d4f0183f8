// oncall-adapters/src/registry.rs
// ============================================================================
// Module: Adapter Registry
// Description: Builds the adapter map and dispatcher the engine is wired with.
// Purpose: Translate plain configuration values into the trait objects
//          IncidentEngine::new expects, without this crate depending on the
//          configuration crate itself.
// Dependencies: oncall-core, crate::{kubernetes, pagerduty}
// ============================================================================

//! ## Overview
//! Kept deliberately thin: the engine only ever needs a
//! `BTreeMap<String, Arc<dyn IntegrationAdapter>>` keyed by adapter name and
//! an optional dispatcher, so construction is exposed as two free functions
//! rather than a builder type. The binary crate that owns configuration
//! loading calls these with already-validated values.

use std::collections::BTreeMap;
use std::sync::Arc;

use oncall_core::IncidentManagementDispatcher;
use oncall_core::IntegrationAdapter;
use oncall_core::ModelClient;

use crate::kubernetes::KubernetesAdapter;
use crate::model::HttpModelClient;
use crate::model::UnconfiguredModelClient;
use crate::pagerduty::PagerdutyDispatcher;

/// Builds the adapter map the engine dispatches commands through.
///
/// Kubernetes is always registered, since it's the only adapter that acts;
/// `kubeconfig_path` of `None` falls back to in-cluster config.
#[must_use]
pub fn build_adapters(
    kubeconfig_path: Option<String>,
    kubernetes_context: Option<String>,
) -> BTreeMap<String, Arc<dyn IntegrationAdapter>> {
    let mut adapters: BTreeMap<String, Arc<dyn IntegrationAdapter>> = BTreeMap::new();
    adapters.insert(
        "kubernetes".to_string(),
        Arc::new(KubernetesAdapter::new(kubeconfig_path, kubernetes_context)),
    );
    adapters
}

/// Builds the incident-management dispatcher, or `None` when no credentials
/// are configured (finalization then logs and proceeds without notifying
/// upstream, per §4.7).
///
/// # Errors
///
/// Returns a `reqwest::Error` if the TLS backend fails to initialize.
pub fn build_dispatcher(
    api_key: Option<String>,
    user_email: Option<String>,
    events_routing_key: Option<String>,
) -> Result<Option<Arc<dyn IncidentManagementDispatcher>>, reqwest::Error> {
    match (api_key, user_email) {
        (Some(api_key), Some(user_email)) => {
            let dispatcher = PagerdutyDispatcher::new(api_key, user_email, events_routing_key)?;
            Ok(Some(Arc::new(dispatcher) as Arc<dyn IncidentManagementDispatcher>))
        }
        _ => Ok(None),
    }
}

/// Builds the Analysis Engine's `ModelClient`, falling back to
/// [`UnconfiguredModelClient`] when no endpoint is configured.
///
/// # Errors
///
/// Returns a `reqwest::Error` if the TLS backend fails to initialize.
pub fn build_model_client(
    model_api_url: Option<String>,
    model_api_key: Option<String>,
) -> Result<Arc<dyn ModelClient>, reqwest::Error> {
    match (model_api_url, model_api_key) {
        (Some(endpoint), Some(api_key)) => {
            Ok(Arc::new(HttpModelClient::new(endpoint, api_key)?) as Arc<dyn ModelClient>)
        }
        _ => Ok(Arc::new(UnconfiguredModelClient) as Arc<dyn ModelClient>),
    }
}
