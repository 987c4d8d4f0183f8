// oncall-server/src/dispatcher.rs
// ============================================================================
// Module: Noop Incident Management Dispatcher
// Description: Dispatcher used when no incident-management credentials are configured.
// Purpose: Let the engine finalize incidents without an upstream system wired up.
// Dependencies: oncall-core, tracing
// ============================================================================

//! ## Overview
//! `IncidentEngine::new` requires a dispatcher; §4.7 already specifies that
//! finalization proceeds (logging and moving on) when no incident-management
//! credentials are configured, so [`NoopDispatcher`] is the production
//! stand-in rather than making the engine's constructor accept an `Option`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use oncall_core::DispatchError;
use oncall_core::IncidentId;
use oncall_core::IncidentManagementDispatcher;
use tracing::debug;

// ============================================================================
// SECTION: Noop Dispatcher
// ============================================================================

/// `IncidentManagementDispatcher` that logs and always succeeds.
pub struct NoopDispatcher;

#[async_trait]
impl IncidentManagementDispatcher for NoopDispatcher {
    async fn acknowledge(&self, incident_id: &IncidentId) -> Result<(), DispatchError> {
        debug!(%incident_id, "no incident-management dispatcher configured, skipping acknowledge");
        Ok(())
    }

    async fn resolve(&self, incident_id: &IncidentId) -> Result<(), DispatchError> {
        debug!(%incident_id, "no incident-management dispatcher configured, skipping resolve");
        Ok(())
    }

    async fn escalate(&self, incident_id: &IncidentId, reason: &str) -> Result<(), DispatchError> {
        debug!(%incident_id, reason, "no incident-management dispatcher configured, skipping escalate");
        Ok(())
    }
}
