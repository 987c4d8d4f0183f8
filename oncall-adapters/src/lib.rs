// oncall-adapters/src/lib.rs
// ============================================================================
// Module: Oncall Adapters Library
// Description: Concrete IntegrationAdapter and dispatcher implementations.
// Purpose: Bind the backend-agnostic interfaces in oncall-core to Kubernetes
//          and PagerDuty.
// Dependencies: oncall-core, kube, k8s-openapi, reqwest
// ============================================================================

//! ## Overview
//! `oncall-core` defines adapters as a trait; this crate supplies the two
//! implementations the engine ships with. [`kubernetes::KubernetesAdapter`]
//! is the only adapter that acts — it both gathers context (pod/deployment
//! state, logs, events) and executes the six mutating action types the
//! planner can expand a plan into. [`pagerduty::PagerdutyDispatcher`]
//! notifies the upstream incident-management system of lifecycle
//! transitions; it does not implement [`oncall_core::IntegrationAdapter`]
//! because the engine never plans a command against it. [`registry`] wires
//! both from an `oncall_config::EngineConfig`.

pub mod http;
pub mod kubernetes;
pub mod model;
pub mod pagerduty;
pub mod registry;

pub use kubernetes::KubernetesAdapter;
pub use model::HttpModelClient;
pub use model::UnconfiguredModelClient;
pub use pagerduty::PagerdutyDispatcher;
pub use registry::build_adapters;
pub use registry::build_dispatcher;
pub use registry::build_model_client;
