// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Forward-only schema migrations for the local store.
//!
//! The schema version lives in `PRAGMA user_version`. Each step is tolerant
//! of objects that already exist, so a database left half-upgraded by a
//! crashed process finishes cleanly on the next open.

use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::debug;

use super::{StoreError, StoreResult};

/// Highest schema version this build knows how to create.
pub const LATEST_VERSION: u32 = 2;

type Migration = fn(&Transaction<'_>) -> rusqlite::Result<()>;

/// Version-ordered migration chain.
const MIGRATIONS: &[(u32, Migration)] = &[(1, create_stores), (2, create_indexes)];

/// Reads the schema version recorded in the database.
pub fn user_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

/// Brings the database up to [`LATEST_VERSION`].
///
/// Refuses to touch a database written by a newer build.
pub fn run_migrations(conn: &mut Connection) -> StoreResult<()> {
    let current = user_version(conn)?;
    if current > LATEST_VERSION {
        return Err(StoreError::NewerSchema {
            found: current,
            supported: LATEST_VERSION,
        });
    }
    if current == LATEST_VERSION {
        return Ok(());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    // Another instance may have upgraded while we waited for the write lock.
    let current = user_version(&tx)?;
    if current > LATEST_VERSION {
        return Err(StoreError::NewerSchema {
            found: current,
            supported: LATEST_VERSION,
        });
    }

    for (version, step) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
        step(&tx)?;
        debug!(version, "applied local store migration");
    }

    tx.pragma_update(None, "user_version", LATEST_VERSION)?;
    tx.commit()?;
    Ok(())
}

/// v1: one table per record kind.
fn create_stores(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS drafts (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    attempt_id TEXT NOT NULL,
    revision INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    queued_at INTEGER NOT NULL,
    payload TEXT NOT NULL,
    schema_version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    attempt_id TEXT NOT NULL,
    event_type TEXT NOT NULL,
    payload TEXT,
    occurred_at INTEGER NOT NULL,
    offline_id TEXT NOT NULL,
    schema_version INTEGER NOT NULL
);
"#,
    )
}

/// v2: secondary indexes, only on tables that exist.
fn create_indexes(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    if table_exists(tx, "drafts")? {
        tx.execute_batch(
            "CREATE INDEX IF NOT EXISTS drafts_by_attempt ON drafts(attempt_id);
             CREATE INDEX IF NOT EXISTS drafts_by_updated_at ON drafts(updated_at);",
        )?;
    }
    if table_exists(tx, "events")? {
        tx.execute_batch(
            "CREATE INDEX IF NOT EXISTS events_by_attempt ON events(attempt_id);
             CREATE INDEX IF NOT EXISTS events_by_offline_id ON events(offline_id);",
        )?;
    }
    Ok(())
}

fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get(0),
    )
}

/// Returns true if the named index exists.
#[cfg(test)]
pub fn index_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'index' AND name = ?1",
        [name],
        |row| row.get(0),
    )
}
