// oncall-core/src/interfaces/mod.rs
// ============================================================================
// Module: Oncall Interfaces
// Description: Backend-agnostic interfaces for adapters, storage, and dispatch.
// Purpose: Define the contract surfaces used by the oncall runtime.
// Dependencies: crate::core, async-trait, serde
// ============================================================================

//! ## Overview
//! Interfaces define how the engine integrates with external systems without
//! embedding backend-specific details. Implementations must be deterministic
//! about what they report and fail closed on missing or invalid data: an
//! adapter that cannot answer returns an error, never a guessed default.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::AdapterName;
use crate::core::ApprovalId;
use crate::core::ApprovalRequest;
use crate::core::AuditRecord;
use crate::core::IncidentId;
use crate::core::LiveLogEvent;
use crate::core::ActionType;
use crate::core::ContextBundle;
use crate::core::ExecutionRecord;
use crate::core::Incident;

// ============================================================================
// SECTION: Integration Adapter
// ============================================================================

/// Parameters conveyed to `fetch_context` (§4.1): what the caller wants to
/// know about, and the bounds it must be gathered within.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextParams {
    /// Service name extracted from the originating alert.
    pub service: String,
    /// Kubernetes namespace, when known.
    pub namespace: Option<String>,
    /// Free-form resource hints (deployment/pod name fragments).
    pub resource_hints: Vec<String>,
    /// Lookback window, in seconds, for log/event queries.
    pub time_window_seconds: u64,
    /// Wall-clock budget this call must respect, in milliseconds.
    pub deadline_ms: u64,
}

/// Parameters conveyed to `execute_action` (§4.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionParams {
    /// Structured arguments, adapter-specific.
    pub args: Value,
    /// Whether this call should only simulate its effect.
    pub dry_run: bool,
    /// Wall-clock budget this call must respect, in milliseconds.
    pub deadline_ms: u64,
}

/// Tagged-union adapter failure (§9 REDESIGN FLAGS): callers branch on kind
/// rather than matching adapter-specific error types.
///
/// # Invariants
/// - Only `Transient` failures are eligible for caller-side retry; adapters
///   never retry internally (§4.1).
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Network timeout, 5xx, or rate limit — eligible for caller retry.
    #[error("transient adapter error: {0}")]
    Transient(String),
    /// The adapter does not implement the requested `action_type`.
    #[error("unsupported action: {0}")]
    Unsupported(String),
    /// The target system rejected the call as policy-forbidden.
    #[error("forbidden by target system: {0}")]
    Forbidden(String),
    /// A 4xx-equivalent or adapter-level semantic rejection; never retried.
    #[error("semantic adapter error: {0}")]
    Semantic(String),
}

/// Polymorphic capability over one external system (§4.1).
///
/// All operations are cancellable and deadline-scoped by the caller; an
/// adapter implementation must respect `deadline_ms` rather than relying on
/// the runtime to enforce it externally, since only the adapter knows how to
/// cancel its own in-flight I/O.
#[async_trait]
pub trait IntegrationAdapter: Send + Sync {
    /// Stable name this adapter is registered and addressed under.
    fn name(&self) -> AdapterName;

    /// Establishes resources (HTTP clients, auth, subprocess handles).
    ///
    /// Idempotent. Returns the capability set this adapter will actually
    /// expose, which may be narrower than its declared set if the target
    /// refuses some operations (e.g. RBAC denies a verb).
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] if the adapter cannot establish resources.
    async fn connect(&self) -> Result<BTreeSet<ActionType>, AdapterError>;

    /// Cheap, side-effect-free liveness probe. Must return within the
    /// caller's deadline (§4.1 recommends ≤2s).
    async fn health(&self) -> bool;

    /// Gathers everything this adapter knows that could be relevant to an
    /// incident described by `params`, truncating rather than failing when
    /// output exceeds a configured cap.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] only for connection-level failures; a
    /// reachable-but-empty result is `Ok` with empty `data`.
    async fn fetch_context(&self, params: &ContextParams) -> Result<ContextBundle, AdapterError>;

    /// Attempts one concrete remediation.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Unsupported`] if `action_type` is not in this
    /// adapter's capability set, and other [`AdapterError`] variants per the
    /// failure taxonomy above.
    async fn execute_action(
        &self,
        action_type: ActionType,
        params: &ActionParams,
    ) -> Result<ExecutionRecord, AdapterError>;

    /// Static declaration of supported action types, consumed by the Command
    /// Planner (§4.4) before any command naming this adapter is expanded.
    fn capabilities(&self) -> BTreeSet<ActionType>;
}

// ============================================================================
// SECTION: Incident Store
// ============================================================================

/// Incident persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("incident store io error: {0}")]
    Io(String),
    /// Stored data is corrupted or fails integrity checks.
    #[error("incident store corruption: {0}")]
    Corrupt(String),
    /// Stored schema version is incompatible with this build.
    #[error("incident store version mismatch: {0}")]
    VersionMismatch(String),
}

/// Durable store for `Incident` records, keyed by `incident_id`.
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Loads an incident by id, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store fails or the stored
    /// record cannot be decoded.
    async fn load(&self, incident_id: &IncidentId) -> Result<Option<Incident>, StoreError>;

    /// Persists the full incident record, replacing any prior value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store fails.
    async fn save(&self, incident: &Incident) -> Result<(), StoreError>;

    /// Returns the open (non-terminal) incident whose fingerprint matches, if
    /// any, used by the dedup step (§4.7).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store fails.
    async fn find_open_by_fingerprint(
        &self,
        fingerprint: &crate::core::Fingerprint,
    ) -> Result<Option<Incident>, StoreError>;
}

// ============================================================================
// SECTION: Audit Log
// ============================================================================

/// Append-only durable log for `AuditRecord`s (§6).
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Appends one record. Must complete before the corresponding command is
    /// considered issued (§4.1: "appended verbatim... before being issued").
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the append fails.
    async fn append(&self, record: &AuditRecord) -> Result<(), StoreError>;

    /// Returns every record for an incident, in append order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    async fn read_for_incident(&self, incident_id: &IncidentId) -> Result<Vec<AuditRecord>, StoreError>;
}

// ============================================================================
// SECTION: Approval Queue
// ============================================================================

/// Durable queue for `ApprovalRequest`s raised by the Autonomy Gate.
#[async_trait]
pub trait ApprovalQueue: Send + Sync {
    /// Inserts or replaces an approval request.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    async fn put(&self, request: &ApprovalRequest) -> Result<(), StoreError>;

    /// Retrieves one request by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    async fn get(&self, id: &ApprovalId) -> Result<Option<ApprovalRequest>, StoreError>;

    /// Lists every request still in the `Pending` decision state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    async fn list_pending(&self) -> Result<Vec<ApprovalRequest>, StoreError>;
}

// ============================================================================
// SECTION: Incident Management Dispatcher
// ============================================================================

/// Dispatch errors for incident-management notifications.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The incident-management system reported an error.
    #[error("incident management dispatch error: {0}")]
    Failed(String),
}

/// Notifies the incident-management system of lifecycle transitions (§4.7).
///
/// Finalization errors from this trait must never revert an incident's
/// decided terminal state; callers log and surface them instead.
#[async_trait]
pub trait IncidentManagementDispatcher: Send + Sync {
    /// Acknowledges receipt of the alert upstream.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the upstream call fails.
    async fn acknowledge(&self, incident_id: &IncidentId) -> Result<(), DispatchError>;

    /// Marks the upstream incident resolved.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the upstream call fails.
    async fn resolve(&self, incident_id: &IncidentId) -> Result<(), DispatchError>;

    /// Escalates the upstream incident (failed/abandoned terminal states).
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the upstream call fails.
    async fn escalate(&self, incident_id: &IncidentId, reason: &str) -> Result<(), DispatchError>;
}

// ============================================================================
// SECTION: Model Client
// ============================================================================

/// Failure modes for an Analysis Engine model call.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The call did not complete within the caller's deadline.
    #[error("model call timed out")]
    Timeout,
    /// Transport or provider-side failure.
    #[error("model call failed: {0}")]
    Transport(String),
}

/// The Analysis Engine's boundary to whichever model provider is configured
/// (out of scope per the engine's purpose: this crate is provider-agnostic).
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Requests one completion for `prompt`, bounded by `deadline_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] on timeout or transport failure.
    async fn complete(&self, prompt: &str, deadline_ms: u64) -> Result<String, ModelError>;
}

// ============================================================================
// SECTION: Live Log Publisher
// ============================================================================

/// Push channel delivering `LiveLogEvent`s to operator-facing subscribers
/// (§6). Delivery is at-most-once: subscribers reconnect and refresh from the
/// audit log if they miss events, so a publish failure is logged and dropped
/// rather than retried.
pub trait LiveLogPublisher: Send + Sync {
    /// Publishes one event to all current subscribers.
    fn publish(&self, event: &LiveLogEvent);
}
