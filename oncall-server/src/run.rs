// oncall-server/src/run.rs
// ============================================================================
// Module: Server Bootstrap
// Description: Wires every collaborator and serves the HTTP surface.
// Purpose: Single entry point binding config, storage, adapters, and routes.
// Dependencies: oncall-adapters, oncall-broker, oncall-config, oncall-core,
//               oncall-store-sqlite, axum, tokio
// ============================================================================

//! ## Overview
//! [`build_engine`] opens durable storage and builds every adapter,
//! dispatcher, and model client `EngineConfig` implies, then wires them into
//! a running `IncidentEngine`. [`serve`] layers the HTTP surface on top: it
//! bridges the engine's single-consumer live-log publisher into a broadcast
//! channel every SSE connection can subscribe to independently, spawns the
//! webhook ingest worker, and binds the listener. `oncall-cli`'s manual
//! alert-injection command calls `build_engine` directly, bypassing the HTTP
//! layer entirely.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use oncall_adapters::build_adapters;
use oncall_adapters::build_dispatcher;
use oncall_adapters::build_model_client;
use oncall_broker::ChannelSink;
use oncall_broker::CloudwatchSource;
use oncall_broker::PagerdutySource;
use oncall_config::EngineConfig;
use oncall_core::AutonomyConfigHandle;
use oncall_core::IncidentEngine;
use oncall_core::IncidentStore;
use oncall_core::LiveLogEvent;
use oncall_core::LiveLogPublisher;
use oncall_store_sqlite::SqliteStore;
use oncall_store_sqlite::SqliteStoreConfig;
use oncall_store_sqlite::SqliteStoreError;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tracing::error;
use tracing::info;

use crate::dispatcher::NoopDispatcher;
use crate::ingest;
use crate::router;
use crate::state::AppState;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Bound on the webhook ingest queue. A full queue means the engine is
/// falling behind its ingress rate; callers are asked to retry (§6: HTTP 429).
const INGEST_QUEUE_CAPACITY: usize = 256;

/// Bound on the live-log broadcast channel. A lagging SSE subscriber drops
/// the oldest buffered events rather than blocking the incident engine.
const LIVE_LOG_CAPACITY: usize = 1024;

/// Bound on the bridge channel `ChannelSink` publishes into before it is
/// fanned out to every broadcast subscriber.
const LIVE_LOG_BRIDGE_CAPACITY: usize = 256;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors that can prevent the server from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Durable storage failed to open.
    #[error("failed to open sqlite store: {0}")]
    Store(#[from] SqliteStoreError),
    /// An adapter or dispatcher failed to build its HTTP client.
    #[error("failed to build a collaborator: {0}")]
    Collaborator(#[from] reqwest::Error),
    /// The HTTP listener failed to bind or serve.
    #[error("http server failed: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// SECTION: Engine Bootstrap
// ============================================================================

/// Builds the durable store and every collaborator `config` implies, wired
/// into a fresh `IncidentEngine` that publishes its live log through
/// `publisher`. Returns the engine alongside the opened store, so a caller
/// that also needs direct read access (the HTTP read routes, the CLI) does
/// not open a second connection to the same database file.
///
/// # Errors
///
/// Returns [`ServerError`] if storage cannot be opened or a collaborator's
/// HTTP client cannot be built.
pub async fn build_engine(
    config: &EngineConfig,
    publisher: Arc<dyn LiveLogPublisher>,
) -> Result<(Arc<IncidentEngine>, Arc<SqliteStore>), ServerError> {
    let store = Arc::new(SqliteStore::open(SqliteStoreConfig::new(config.sqlite_path.clone()))?);

    let adapters = build_adapters(config.kubernetes_kubeconfig_path.clone(), config.kubernetes_context.clone());
    let dispatcher = build_dispatcher(
        config.incident_management_api_key.clone(),
        config.incident_management_user_email.clone(),
        None,
    )?
    .unwrap_or_else(|| Arc::new(NoopDispatcher));
    let model = build_model_client(config.model_api_url.clone(), config.model_api_key.clone())?;
    let config_handle = AutonomyConfigHandle::new(config.to_autonomy_config());

    let engine = Arc::new(
        IncidentEngine::new(
            store.clone() as Arc<dyn IncidentStore>,
            store.clone(),
            store.clone(),
            adapters,
            dispatcher,
            model,
            publisher,
            config_handle,
        )
        .with_dedup_window_seconds(config.incident_dedup_window_seconds),
    );
    Ok((engine, store))
}

// ============================================================================
// SECTION: HTTP Bootstrap
// ============================================================================

/// Builds every collaborator `config` implies and serves the HTTP surface
/// until the process is terminated.
///
/// # Errors
///
/// Returns [`ServerError`] if storage cannot be opened, a collaborator's
/// HTTP client cannot be built, or the listener cannot bind.
pub async fn serve(config: EngineConfig) -> Result<(), ServerError> {
    let (bridge_sender, bridge_receiver) = mpsc::channel::<LiveLogEvent>(LIVE_LOG_BRIDGE_CAPACITY);
    let (live_log, _) = broadcast::channel::<LiveLogEvent>(LIVE_LOG_CAPACITY);
    tokio::spawn(bridge_live_log(bridge_receiver, live_log.clone()));

    let (engine, store) = build_engine(&config, Arc::new(ChannelSink::new(bridge_sender))).await?;

    let (ingest_sender, ingest_receiver) = mpsc::channel(INGEST_QUEUE_CAPACITY);
    tokio::spawn(ingest::run(engine.clone(), ingest_receiver));

    let state = AppState {
        engine,
        store: store.clone(),
        audit: store.clone(),
        approvals: store,
        pagerduty_source: Arc::new(PagerdutySource::default()),
        cloudwatch_source: Arc::new(CloudwatchSource::default()),
        webhook_secret: config.webhook_secret.map(Into::into),
        ingest: ingest_sender,
        live_log,
    };

    let router = router::build(state);
    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "oncall server listening");
    axum::serve(listener, router).await?;
    Ok(())
}

/// Drains `receiver` and republishes every event onto `live_log`, so each SSE
/// connection gets its own independent broadcast subscription rather than
/// racing over the single-consumer channel `ChannelSink` writes into.
async fn bridge_live_log(mut receiver: mpsc::Receiver<LiveLogEvent>, live_log: broadcast::Sender<LiveLogEvent>) {
    while let Some(event) = receiver.recv().await {
        if live_log.send(event).is_err() {
            error!("no live-log subscribers connected; event dropped");
        }
    }
}
