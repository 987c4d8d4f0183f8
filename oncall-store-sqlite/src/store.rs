// oncall-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Incident Store
// Description: Durable IncidentStore/AuditLog/ApprovalQueue backed by SQLite WAL.
// Purpose: Persist incidents, the append-only audit trail, and the approval
//          queue named in §6 behind one connection and one schema.
// Dependencies: oncall-core, rusqlite, serde_json, thiserror, tokio
// ============================================================================

//! ## Overview
//! Every row stores its record as canonical JSON alongside a `SHA-256` digest
//! of that same canonical form, so a load can detect on-disk corruption
//! before handing a decoded value back to the engine. `SQLite` access is
//! synchronous (`rusqlite` holds no internal executor); every trait method
//! here moves its work onto `tokio::task::spawn_blocking` rather than
//! blocking the calling task's scheduler thread (§5: "no CPU-bound work
//! justifies blocking a scheduler thread").

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use oncall_core::core::hashing::DEFAULT_HASH_ALGORITHM;
use oncall_core::core::hashing::canonical_json_bytes;
use oncall_core::core::hashing::hash_bytes;
use oncall_core::ApprovalId;
use oncall_core::ApprovalQueue;
use oncall_core::ApprovalRequest;
use oncall_core::AuditLog;
use oncall_core::AuditRecord;
use oncall_core::Fingerprint;
use oncall_core::Incident;
use oncall_core::IncidentId;
use oncall_core::IncidentStore;
use oncall_core::StoreError;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Schema version recorded in `store_meta`.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout, in milliseconds, before a lock-contended write fails.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum total path length accepted for the database file.
const MAX_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for [`SqliteStore::open`].
#[derive(Debug, Clone)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file; created if absent.
    pub path: PathBuf,
    /// Busy timeout, in milliseconds, before a lock-contended write fails.
    pub busy_timeout_ms: u64,
}

impl SqliteStoreConfig {
    /// Builds a config pointing at `path` with the default busy timeout.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while opening or migrating the `SQLite` store.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// The database file or its parent directory could not be created or opened.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// A `SQLite` engine call failed.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// The store path failed basic safety validation.
    #[error("sqlite store invalid path: {0}")]
    InvalidPath(String),
    /// The on-disk schema version is newer or older than this build supports.
    #[error("sqlite store schema version mismatch: found {found}, expected {expected}")]
    VersionMismatch {
        /// Version recorded in the database.
        found: i64,
        /// Version this build expects.
        expected: i64,
    },
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Io(message),
            SqliteStoreError::InvalidPath(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch { found, expected } => {
                Self::VersionMismatch(format!("found {found}, expected {expected}"))
            }
        }
    }
}

/// Maps a blocking-task join failure (panic inside `spawn_blocking`) to a [`StoreError`].
fn join_error(_: tokio::task::JoinError) -> StoreError {
    StoreError::Io("sqlite worker task panicked".to_string())
}

// ============================================================================
// SECTION: Row Codec
// ============================================================================

/// Serializes `value` to canonical JSON plus its digest, ready to store.
fn encode<T: Serialize>(value: &T) -> Result<(Vec<u8>, String), SqliteStoreError> {
    let bytes = canonical_json_bytes(value).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, &bytes).value;
    Ok((bytes, digest))
}

/// Decodes a stored row, verifying its digest before deserializing.
fn decode<T: DeserializeOwned>(bytes: &[u8], expected_digest: &str) -> Result<T, SqliteStoreError> {
    let actual = hash_bytes(DEFAULT_HASH_ALGORITHM, bytes).value;
    if actual != expected_digest {
        return Err(SqliteStoreError::Db(format!(
            "stored row digest mismatch: expected {expected_digest}, found {actual}"
        )));
    }
    serde_json::from_slice(bytes).map_err(|err| SqliteStoreError::Db(err.to_string()))
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed implementation of `IncidentStore`, `AuditLog`, and `ApprovalQueue`.
#[derive(Clone)]
pub struct SqliteStore {
    /// Shared connection guarded by a mutex; `SQLite` serializes writers
    /// internally, but `rusqlite::Connection` itself is not `Sync`.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (creating if absent) a `SQLite`-backed store at `config.path`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] if the path is unsafe, the file cannot be
    /// opened, or the schema cannot be initialized or migrated.
    pub fn open(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_path(&config.path)?;
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))?;
            }
        }
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Opens an in-memory store, used by tests that want real `SQLite`
    /// semantics without a file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] if the in-memory database cannot be
    /// initialized.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        let mut connection = Connection::open_in_memory().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Clones the shared connection handle for use inside a blocking closure.
    fn handle(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.connection)
    }

    /// Locks the connection, mapping a poisoned lock to a db error.
    fn lock(connection: &Mutex<Connection>) -> Result<std::sync::MutexGuard<'_, Connection>, SqliteStoreError> {
        connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("sqlite connection mutex poisoned".to_string()))
    }
}

#[async_trait]
impl IncidentStore for SqliteStore {
    async fn load(&self, incident_id: &IncidentId) -> Result<Option<Incident>, StoreError> {
        let handle = self.handle();
        let incident_id = incident_id.clone();
        tokio::task::spawn_blocking(move || load_incident(&handle, &incident_id))
            .await
            .map_err(join_error)?
            .map_err(StoreError::from)
    }

    async fn save(&self, incident: &Incident) -> Result<(), StoreError> {
        let handle = self.handle();
        let incident = incident.clone();
        tokio::task::spawn_blocking(move || save_incident(&handle, &incident))
            .await
            .map_err(join_error)?
            .map_err(StoreError::from)
    }

    async fn find_open_by_fingerprint(&self, fingerprint: &Fingerprint) -> Result<Option<Incident>, StoreError> {
        let handle = self.handle();
        let fingerprint = fingerprint.clone();
        tokio::task::spawn_blocking(move || find_open_by_fingerprint(&handle, &fingerprint))
            .await
            .map_err(join_error)?
            .map_err(StoreError::from)
    }
}

#[async_trait]
impl AuditLog for SqliteStore {
    async fn append(&self, record: &AuditRecord) -> Result<(), StoreError> {
        let handle = self.handle();
        let record = record.clone();
        tokio::task::spawn_blocking(move || append_audit(&handle, &record))
            .await
            .map_err(join_error)?
            .map_err(StoreError::from)
    }

    async fn read_for_incident(&self, incident_id: &IncidentId) -> Result<Vec<AuditRecord>, StoreError> {
        let handle = self.handle();
        let incident_id = incident_id.clone();
        tokio::task::spawn_blocking(move || read_audit_for_incident(&handle, &incident_id))
            .await
            .map_err(join_error)?
            .map_err(StoreError::from)
    }
}

#[async_trait]
impl ApprovalQueue for SqliteStore {
    async fn put(&self, request: &ApprovalRequest) -> Result<(), StoreError> {
        let handle = self.handle();
        let request = request.clone();
        tokio::task::spawn_blocking(move || put_approval(&handle, &request))
            .await
            .map_err(join_error)?
            .map_err(StoreError::from)
    }

    async fn get(&self, id: &ApprovalId) -> Result<Option<ApprovalRequest>, StoreError> {
        let handle = self.handle();
        let id = id.clone();
        tokio::task::spawn_blocking(move || get_approval(&handle, &id))
            .await
            .map_err(join_error)?
            .map_err(StoreError::from)
    }

    async fn list_pending(&self) -> Result<Vec<ApprovalRequest>, StoreError> {
        let handle = self.handle();
        tokio::task::spawn_blocking(move || list_pending_approvals(&handle))
            .await
            .map_err(join_error)?
            .map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Blocking Implementations
// ============================================================================

/// Loads one incident by id.
fn load_incident(connection: &Mutex<Connection>, incident_id: &IncidentId) -> Result<Option<Incident>, SqliteStoreError> {
    let guard = SqliteStore::lock(connection)?;
    let row: Option<(Vec<u8>, String)> = guard
        .query_row(
            "SELECT incident_json, digest FROM incidents WHERE incident_id = ?1",
            params![incident_id.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    row.map(|(bytes, digest)| decode(&bytes, &digest)).transpose()
}

/// Inserts or replaces the full incident record.
fn save_incident(connection: &Mutex<Connection>, incident: &Incident) -> Result<(), SqliteStoreError> {
    let (bytes, digest) = encode(incident)?;
    let guard = SqliteStore::lock(connection)?;
    guard
        .execute(
            "INSERT INTO incidents (incident_id, fingerprint, terminal, incident_json, digest)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(incident_id) DO UPDATE SET
                fingerprint = excluded.fingerprint,
                terminal = excluded.terminal,
                incident_json = excluded.incident_json,
                digest = excluded.digest",
            params![
                incident.incident_id.as_str(),
                incident.fingerprint.as_str(),
                i64::from(incident.state.is_terminal()),
                bytes,
                digest,
            ],
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Finds the open (non-terminal) incident matching `fingerprint`, if any.
fn find_open_by_fingerprint(
    connection: &Mutex<Connection>,
    fingerprint: &Fingerprint,
) -> Result<Option<Incident>, SqliteStoreError> {
    let guard = SqliteStore::lock(connection)?;
    let row: Option<(Vec<u8>, String)> = guard
        .query_row(
            "SELECT incident_json, digest FROM incidents WHERE fingerprint = ?1 AND terminal = 0
             ORDER BY rowid DESC LIMIT 1",
            params![fingerprint.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    row.map(|(bytes, digest)| decode(&bytes, &digest)).transpose()
}

/// Appends one audit record.
fn append_audit(connection: &Mutex<Connection>, record: &AuditRecord) -> Result<(), SqliteStoreError> {
    let (bytes, digest) = encode(record)?;
    let guard = SqliteStore::lock(connection)?;
    guard
        .execute(
            "INSERT INTO audit_records (incident_id, record_json, digest) VALUES (?1, ?2, ?3)",
            params![record.incident_id.as_str(), bytes, digest],
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Reads every audit record for `incident_id`, in append (rowid) order.
fn read_audit_for_incident(
    connection: &Mutex<Connection>,
    incident_id: &IncidentId,
) -> Result<Vec<AuditRecord>, SqliteStoreError> {
    let guard = SqliteStore::lock(connection)?;
    let mut statement = guard
        .prepare(
            "SELECT record_json, digest FROM audit_records WHERE incident_id = ?1 ORDER BY rowid ASC",
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let rows = statement
        .query_map(params![incident_id.as_str()], |row| Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, String>(1)?)))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let mut records = Vec::new();
    for row in rows {
        let (bytes, digest) = row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        records.push(decode(&bytes, &digest)?);
    }
    Ok(records)
}

/// Inserts or replaces one approval request.
fn put_approval(connection: &Mutex<Connection>, request: &ApprovalRequest) -> Result<(), SqliteStoreError> {
    let (bytes, digest) = encode(request)?;
    let guard = SqliteStore::lock(connection)?;
    guard
        .execute(
            "INSERT INTO approvals (approval_id, incident_id, pending, request_json, digest)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(approval_id) DO UPDATE SET
                pending = excluded.pending,
                request_json = excluded.request_json,
                digest = excluded.digest",
            params![
                request.id.as_str(),
                request.incident_id.as_str(),
                i64::from(request.decision == oncall_core::ApprovalDecision::Pending),
                bytes,
                digest,
            ],
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Reads one approval request by id.
fn get_approval(connection: &Mutex<Connection>, id: &ApprovalId) -> Result<Option<ApprovalRequest>, SqliteStoreError> {
    let guard = SqliteStore::lock(connection)?;
    let row: Option<(Vec<u8>, String)> = guard
        .query_row(
            "SELECT request_json, digest FROM approvals WHERE approval_id = ?1",
            params![id.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    row.map(|(bytes, digest)| decode(&bytes, &digest)).transpose()
}

/// Lists every approval request still pending a decision.
fn list_pending_approvals(connection: &Mutex<Connection>) -> Result<Vec<ApprovalRequest>, SqliteStoreError> {
    let guard = SqliteStore::lock(connection)?;
    let mut statement = guard
        .prepare("SELECT request_json, digest FROM approvals WHERE pending = 1 ORDER BY rowid ASC")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let rows = statement
        .query_map(params![], |row| Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, String>(1)?)))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let mut requests = Vec::new();
    for row in rows {
        let (bytes, digest) = row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        requests.push(decode(&bytes, &digest)?);
    }
    Ok(requests)
}

// ============================================================================
// SECTION: Schema & Connection Setup
// ============================================================================

/// Rejects paths that are unreasonably long or point at an existing directory.
fn validate_path(path: &Path) -> Result<(), SqliteStoreError> {
    let rendered = path.display().to_string();
    if rendered.len() > MAX_PATH_LENGTH {
        return Err(SqliteStoreError::InvalidPath("path exceeds length limit".to_string()));
    }
    if path.is_dir() {
        return Err(SqliteStoreError::InvalidPath("path must be a file, not a directory".to_string()));
    }
    Ok(())
}

/// Opens the connection and applies `WAL` durability pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL; PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(connection)
}

/// Creates the schema on first open, or validates the recorded version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS incidents (
                    incident_id TEXT PRIMARY KEY,
                    fingerprint TEXT NOT NULL,
                    terminal INTEGER NOT NULL,
                    incident_json BLOB NOT NULL,
                    digest TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_incidents_fingerprint
                    ON incidents (fingerprint, terminal);
                CREATE TABLE IF NOT EXISTS audit_records (
                    incident_id TEXT NOT NULL,
                    record_json BLOB NOT NULL,
                    digest TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_audit_records_incident
                    ON audit_records (incident_id);
                CREATE TABLE IF NOT EXISTS approvals (
                    approval_id TEXT PRIMARY KEY,
                    incident_id TEXT NOT NULL,
                    pending INTEGER NOT NULL,
                    request_json BLOB NOT NULL,
                    digest TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_approvals_pending ON approvals (pending);",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(found) => {
            return Err(SqliteStoreError::VersionMismatch {
                found,
                expected: SCHEMA_VERSION,
            });
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
