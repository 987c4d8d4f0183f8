// oncall-core/src/runtime/store.rs
// ============================================================================
// Module: Oncall In-Memory Store
// Description: In-memory incident store, audit log, and approval queue.
// Purpose: Provide deterministic storage for tests and dry-run deployments.
// Dependencies: crate::core, crate::interfaces, async-trait
// ============================================================================

//! ## Overview
//! These in-memory implementations back the scenario tests and a dry-run
//! deployment mode. `oncall-store-sqlite` provides the durable counterpart
//! for production use; both implement the same `crate::interfaces` traits so
//! the engine is agnostic to which backs it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::ApprovalId;
use crate::core::AuditRecord;
use crate::core::Fingerprint;
use crate::core::Incident;
use crate::core::IncidentId;
use crate::core::ApprovalRequest;
use crate::interfaces::ApprovalQueue;
use crate::interfaces::AuditLog;
use crate::interfaces::IncidentStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Incident Store
// ============================================================================

/// In-memory [`IncidentStore`] for tests and dry-run deployments.
#[derive(Debug, Default, Clone)]
pub struct InMemoryIncidentStore {
    incidents: Arc<Mutex<BTreeMap<String, Incident>>>,
}

impl InMemoryIncidentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            incidents: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Incident>>, StoreError> {
        self.incidents
            .lock()
            .map_err(|_| StoreError::Io("incident store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl IncidentStore for InMemoryIncidentStore {
    async fn load(&self, incident_id: &IncidentId) -> Result<Option<Incident>, StoreError> {
        Ok(self.lock()?.get(incident_id.as_str()).cloned())
    }

    async fn save(&self, incident: &Incident) -> Result<(), StoreError> {
        self.lock()?
            .insert(incident.incident_id.as_str().to_string(), incident.clone());
        Ok(())
    }

    async fn find_open_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<Incident>, StoreError> {
        let guard = self.lock()?;
        Ok(guard
            .values()
            .find(|incident| &incident.fingerprint == fingerprint && !incident.state.is_terminal())
            .cloned())
    }
}

// ============================================================================
// SECTION: In-Memory Audit Log
// ============================================================================

/// In-memory [`AuditLog`] for tests and dry-run deployments.
#[derive(Debug, Default, Clone)]
pub struct InMemoryAuditLog {
    records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl InMemoryAuditLog {
    /// Creates an empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn append(&self, record: &AuditRecord) -> Result<(), StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Io("audit log mutex poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }

    async fn read_for_incident(&self, incident_id: &IncidentId) -> Result<Vec<AuditRecord>, StoreError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| StoreError::Io("audit log mutex poisoned".to_string()))?;
        Ok(guard
            .iter()
            .filter(|record| &record.incident_id == incident_id)
            .cloned()
            .collect())
    }
}

// ============================================================================
// SECTION: In-Memory Approval Queue
// ============================================================================

/// In-memory [`ApprovalQueue`] for tests and dry-run deployments.
#[derive(Debug, Default, Clone)]
pub struct InMemoryApprovalQueue {
    requests: Arc<Mutex<BTreeMap<String, ApprovalRequest>>>,
}

impl InMemoryApprovalQueue {
    /// Creates an empty approval queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            requests: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, ApprovalRequest>>, StoreError> {
        self.requests
            .lock()
            .map_err(|_| StoreError::Io("approval queue mutex poisoned".to_string()))
    }
}

#[async_trait]
impl ApprovalQueue for InMemoryApprovalQueue {
    async fn put(&self, request: &ApprovalRequest) -> Result<(), StoreError> {
        self.lock()?
            .insert(request.id.as_str().to_string(), request.clone());
        Ok(())
    }

    async fn get(&self, id: &ApprovalId) -> Result<Option<ApprovalRequest>, StoreError> {
        Ok(self.lock()?.get(id.as_str()).cloned())
    }

    async fn list_pending(&self) -> Result<Vec<ApprovalRequest>, StoreError> {
        let guard = self.lock()?;
        Ok(guard
            .values()
            .filter(|request| matches!(request.decision, crate::core::ApprovalDecision::Pending))
            .cloned()
            .collect())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
