// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable local storage for queued drafts and events.
//!
//! Backed by SQLite. The store is best-effort: if the database cannot be
//! opened (unsupported location, newer schema, blocked upgrade, I/O
//! failure) every operation degrades to a no-op that returns an empty
//! result. Failures are logged, never raised to callers.
//!
//! One connection is cached per store. Errors that suggest the handle is
//! unusable drop the cache so the next call reopens cleanly.

mod migrations;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use offsync_core::{DraftRecord, EventRecord, NewEvent};

pub use migrations::LATEST_VERSION;

/// How long a statement waits on another writer before reporting busy.
const BUSY_TIMEOUT: Duration = Duration::from_millis(500);

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// SQLite error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The database was written by a newer build.
    #[error("schema version {found} is newer than supported version {supported}")]
    NewerSchema { found: u32, supported: u32 },
}

impl StoreError {
    /// Returns true if the cached connection should be discarded.
    fn invalidates_handle(&self) -> bool {
        match self {
            StoreError::Database(e) => matches!(
                e.sqlite_error_code(),
                Some(
                    ErrorCode::DatabaseBusy
                        | ErrorCode::DatabaseLocked
                        | ErrorCode::DatabaseCorrupt
                        | ErrorCode::NotADatabase
                        | ErrorCode::CannotOpen
                        | ErrorCode::SystemIoFailure
                        | ErrorCode::ReadOnly
                )
            ),
            StoreError::NewerSchema { .. } => true,
            StoreError::Serialization(_) => false,
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

/// Schema-versioned local store with one table per record kind.
pub struct LocalStore {
    location: Location,
    conn: Mutex<Option<Connection>>,
}

impl LocalStore {
    /// Creates a store backed by the database file at `path`.
    ///
    /// Nothing is opened until the first operation or [`LocalStore::open`].
    pub fn new(path: impl AsRef<Path>) -> Self {
        LocalStore {
            location: Location::File(path.as_ref().to_path_buf()),
            conn: Mutex::new(None),
        }
    }

    /// Creates a store backed by a private in-memory database.
    pub fn in_memory() -> Self {
        LocalStore {
            location: Location::Memory,
            conn: Mutex::new(None),
        }
    }

    /// Opens and migrates the database if not already open.
    ///
    /// Idempotent. Returns false if storage is unavailable.
    pub fn open(&self) -> bool {
        let mut guard = self.lock();
        self.ensure_open(&mut guard)
    }

    /// Returns the stored draft with this id.
    pub fn get_draft(&self, id: &str) -> Option<DraftRecord> {
        self.with_conn("get_draft", |conn| {
            conn.query_row(
                &format!("SELECT {DRAFT_COLUMNS} FROM drafts WHERE id = ?1"),
                [id],
                row_to_draft,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .flatten()
    }

    /// Stores a draft, replacing any existing draft with the same id.
    pub fn put_draft(&self, record: &DraftRecord) {
        self.with_conn("put_draft", |conn| write_draft(conn, record));
    }

    /// Reads, transforms and writes a draft inside one write transaction.
    ///
    /// Concurrent instances sharing the database observe each other's
    /// updates in order, so revisions derived from `prev` never repeat.
    pub fn update_draft<F>(&self, id: &str, f: F) -> Option<DraftRecord>
    where
        F: FnOnce(Option<DraftRecord>) -> DraftRecord,
    {
        self.with_conn("update_draft", |conn| {
            let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
            let prev = tx
                .query_row(
                    &format!("SELECT {DRAFT_COLUMNS} FROM drafts WHERE id = ?1"),
                    [id],
                    row_to_draft,
                )
                .optional()?;
            let next = f(prev);
            write_draft(&tx, &next)?;
            tx.commit()?;
            Ok(next)
        })
    }

    /// Returns all stored drafts, oldest update first.
    pub fn get_all_drafts(&self) -> Vec<DraftRecord> {
        self.with_conn("get_all_drafts", |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {DRAFT_COLUMNS} FROM drafts ORDER BY updated_at, id"
            ))?;
            let drafts = stmt
                .query_map([], row_to_draft)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(drafts)
        })
        .unwrap_or_default()
    }

    /// Deletes the draft with this id, if present.
    pub fn delete_draft(&self, id: &str) {
        self.with_conn("delete_draft", |conn| {
            conn.execute("DELETE FROM drafts WHERE id = ?1", [id])?;
            Ok(())
        });
    }

    /// Deletes the draft only if its stored revision is at most `revision`.
    ///
    /// A draft edited after `revision` was read is kept.
    pub fn delete_draft_through(&self, id: &str, revision: u64) {
        self.with_conn("delete_draft_through", |conn| {
            conn.execute(
                "DELETE FROM drafts WHERE id = ?1 AND revision <= ?2",
                params![id, revision as i64],
            )?;
            Ok(())
        });
    }

    /// Appends an event and returns it with its assigned id.
    pub fn add_event(&self, event: NewEvent) -> Option<EventRecord> {
        self.with_conn("add_event", |conn| {
            let payload = event
                .payload
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            conn.execute(
                "INSERT INTO events (kind, attempt_id, event_type, payload, occurred_at, offline_id, schema_version)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    event.kind.as_str(),
                    event.attempt_id,
                    event.event_type.as_str(),
                    payload,
                    event.occurred_at as i64,
                    event.offline_id,
                    event.schema_version,
                ],
            )?;
            let id = conn.last_insert_rowid();
            Ok(event.with_id(id))
        })
    }

    /// Returns all stored events in insertion order.
    pub fn get_events(&self) -> Vec<EventRecord> {
        self.query_events("get_events", None)
    }

    /// Returns at most `limit` stored events in insertion order.
    pub fn get_events_limited(&self, limit: usize) -> Vec<EventRecord> {
        self.query_events("get_events_limited", Some(limit))
    }

    /// Deletes the events with these ids in one transaction.
    pub fn delete_events(&self, ids: &[i64]) {
        if ids.is_empty() {
            return;
        }
        self.with_conn("delete_events", |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare("DELETE FROM events WHERE id = ?1")?;
                for id in ids {
                    stmt.execute([id])?;
                }
            }
            tx.commit()?;
            Ok(())
        });
    }

    fn query_events(&self, op: &'static str, limit: Option<usize>) -> Vec<EventRecord> {
        self.with_conn(op, |conn| {
            // SQLite treats a negative LIMIT as unbounded.
            let limit = limit.map(|l| l as i64).unwrap_or(-1);
            let mut stmt = conn.prepare(&format!(
                "SELECT {EVENT_COLUMNS} FROM events ORDER BY id LIMIT ?1"
            ))?;
            let events = stmt
                .query_map(params_from_iter([limit]), row_to_event)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(events)
        })
        .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_open(&self, guard: &mut MutexGuard<'_, Option<Connection>>) -> bool {
        if guard.is_some() {
            return true;
        }
        match open_connection(&self.location) {
            Ok(conn) => {
                debug!(location = ?self.location, "opened local store");
                **guard = Some(conn);
                true
            }
            Err(e) => {
                warn!(location = ?self.location, error = %e, "local store unavailable");
                false
            }
        }
    }

    /// Runs `f` against the cached connection, degrading to `None` on failure.
    fn with_conn<T, F>(&self, op: &'static str, f: F) -> Option<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T>,
    {
        let mut guard = self.lock();
        if !self.ensure_open(&mut guard) {
            return None;
        }
        let conn = guard.as_mut()?;

        // Another build upgraded the file underneath us.
        match migrations::user_version(conn) {
            Ok(version) if version > LATEST_VERSION => {
                warn!(op, version, "local store schema changed by a newer build");
                *guard = None;
                return None;
            }
            Ok(_) => {}
            Err(e) => {
                let e = StoreError::from(e);
                warn!(op, error = %e, "local store operation failed");
                if e.invalidates_handle() {
                    *guard = None;
                }
                return None;
            }
        }

        match f(conn) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(op, error = %e, "local store operation failed");
                if e.invalidates_handle() {
                    *guard = None;
                }
                None
            }
        }
    }
}

fn open_connection(location: &Location) -> StoreResult<Connection> {
    let mut conn = match location {
        Location::File(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        rusqlite::Error::SqliteFailure(
                            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                            Some(e.to_string()),
                        )
                    })?;
                }
            }
            let conn = Connection::open(path)?;
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            conn
        }
        Location::Memory => Connection::open_in_memory()?,
    };
    conn.busy_timeout(BUSY_TIMEOUT)?;
    migrations::run_migrations(&mut conn)?;
    Ok(conn)
}

const DRAFT_COLUMNS: &str =
    "id, kind, attempt_id, revision, updated_at, queued_at, payload, schema_version";

const EVENT_COLUMNS: &str =
    "id, kind, attempt_id, event_type, payload, occurred_at, offline_id, schema_version";

fn write_draft(conn: &Connection, record: &DraftRecord) -> StoreResult<()> {
    let payload = serde_json::to_string(&record.payload)?;
    conn.execute(
        "INSERT OR REPLACE INTO drafts (id, kind, attempt_id, revision, updated_at, queued_at, payload, schema_version)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            record.id,
            record.kind.as_str(),
            record.attempt_id,
            record.revision as i64,
            record.updated_at as i64,
            record.queued_at as i64,
            payload,
            record.schema_version,
        ],
    )?;
    Ok(())
}

/// Converts a column parse failure into a rusqlite error.
fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}

fn parse_column<T: std::str::FromStr>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let value: String = row.get(idx)?;
    value
        .parse()
        .map_err(|_| conversion_error(idx, format!("invalid value '{value}'")))
}

fn json_column<T: DeserializeOwned>(value: &str, idx: usize) -> rusqlite::Result<T> {
    serde_json::from_str(value).map_err(|e| conversion_error(idx, format!("invalid json: {e}")))
}

fn row_to_draft(row: &Row<'_>) -> rusqlite::Result<DraftRecord> {
    let payload: String = row.get(6)?;
    Ok(DraftRecord {
        id: row.get(0)?,
        kind: parse_column(row, 1)?,
        attempt_id: row.get(2)?,
        revision: row.get::<_, i64>(3)? as u64,
        updated_at: row.get::<_, i64>(4)? as u64,
        queued_at: row.get::<_, i64>(5)? as u64,
        payload: json_column(&payload, 6)?,
        schema_version: row.get(7)?,
    })
}

fn row_to_event(row: &Row<'_>) -> rusqlite::Result<EventRecord> {
    let payload: Option<String> = row.get(4)?;
    Ok(EventRecord {
        id: row.get(0)?,
        kind: parse_column(row, 1)?,
        attempt_id: row.get(2)?,
        event_type: parse_column(row, 3)?,
        payload: payload.as_deref().map(|p| json_column(p, 4)).transpose()?,
        occurred_at: row.get::<_, i64>(5)? as u64,
        offline_id: row.get(6)?,
        schema_version: row.get(7)?,
    })
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
