// oncall-store-sqlite/src/lib.rs
// ============================================================================
// Module: Oncall SQLite Store
// Description: Durable IncidentStore, AuditLog, and ApprovalQueue over SQLite.
// Purpose: Provide the production-grade persistence backend named in §6.
// Dependencies: oncall-core, rusqlite
// ============================================================================

//! ## Overview
//! `oncall-store-sqlite` is the durable counterpart to
//! `oncall_core::runtime::store`'s in-process reference implementations. One
//! [`store::SqliteStore`] implements [`oncall_core::IncidentStore`],
//! [`oncall_core::AuditLog`], and [`oncall_core::ApprovalQueue`] over a
//! single WAL-mode `SQLite` database, so the engine's three durable
//! interfaces share one connection and one schema migration path.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
