// oncall-core/src/runtime/aggregator.rs
// ============================================================================
// Module: Oncall Context Aggregator
// Description: Bounded-concurrency fan-out across every configured adapter.
// Purpose: Implement §4.2's fan-out, per-adapter deadline, and never-raise contract.
// Dependencies: crate::core, crate::interfaces, tokio
// ============================================================================

//! ## Overview
//! The Context Aggregator calls [`IntegrationAdapter::fetch_context`] on every
//! registered adapter concurrently, each bounded by its own deadline, and
//! never propagates an individual adapter's failure: a timeout, connection
//! error, or panic all collapse to a failed [`ContextBundle`] for that
//! adapter alone (§4.2). The aggregate call itself is bounded by an overall
//! deadline so one slow adapter cannot stall the whole incident past budget.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::core::ContextBundle;
use crate::interfaces::ContextParams;
use crate::interfaces::IntegrationAdapter;

/// Per-adapter deadline applied when the caller does not override it (§4.2).
pub const DEFAULT_ADAPTER_DEADLINE_MS: u64 = 10_000;
/// Overall fan-out deadline applied when the caller does not override it (§4.2).
pub const DEFAULT_OVERALL_DEADLINE_MS: u64 = 30_000;

/// Gathers context from every adapter in `adapters`, keyed by adapter name.
///
/// Every adapter's slot is populated even if its own call fails, times out, or
/// its task panics: a panic is caught by `tokio::spawn`'s own unwind boundary
/// and converted to a failed bundle exactly like a timeout, so one broken
/// adapter never aborts the aggregate result (§4.2 "never raises").
pub async fn gather_context(
    adapters: &[Arc<dyn IntegrationAdapter>],
    params: &ContextParams,
    overall_deadline_ms: u64,
) -> BTreeMap<String, ContextBundle> {
    let per_adapter_deadline_ms = if params.deadline_ms == 0 {
        DEFAULT_ADAPTER_DEADLINE_MS
    } else {
        params.deadline_ms
    };

    let adapter_names: Vec<String> = adapters.iter().map(|a| a.name().as_str().to_string()).collect();

    let mut tasks = Vec::with_capacity(adapters.len());
    for adapter in adapters {
        let adapter = Arc::clone(adapter);
        let mut task_params = params.clone();
        task_params.deadline_ms = per_adapter_deadline_ms;
        tasks.push(tokio::spawn(async move {
            let name = adapter.name();
            let started = std::time::Instant::now();
            let outcome = timeout(
                Duration::from_millis(per_adapter_deadline_ms),
                adapter.fetch_context(&task_params),
            )
            .await;
            let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            match outcome {
                Ok(Ok(bundle)) => bundle,
                Ok(Err(err)) => ContextBundle::failed(name, err.to_string(), duration_ms),
                Err(_) => ContextBundle::failed(name, "adapter deadline exceeded", duration_ms),
            }
        }));
    }

    let joined = timeout(
        Duration::from_millis(overall_deadline_ms.max(per_adapter_deadline_ms)),
        futures::future::join_all(tasks),
    )
    .await;

    let mut results = BTreeMap::new();
    match joined {
        Ok(handles) => {
            for handle in handles {
                match handle {
                    Ok(bundle) => {
                        results.insert(bundle.adapter_name.as_str().to_string(), bundle);
                    }
                    Err(join_error) => {
                        tracing::warn!(error = %join_error, "context adapter task panicked");
                    }
                }
            }
        }
        Err(_) => {
            tracing::warn!("context aggregator overall deadline exceeded before every adapter reported");
        }
    }

    // §4.2: the returned mapping always has one entry per enabled adapter,
    // whether the overall deadline expired first or an individual task
    // panicked without the `Err(join_error)` arm above inserting anything.
    for name in adapter_names {
        results
            .entry(name.clone())
            .or_insert_with(|| ContextBundle::failed(name.as_str().into(), "adapter task did not report a result", 0));
    }
    results
}
