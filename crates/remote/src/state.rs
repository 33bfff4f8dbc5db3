// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server state management.
//!
//! Wraps the server-of-record database for shared access across requests.
//! Every statement touching attempt data is filtered by the calling user.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use offsync_core::{EventType, TaskId};

use crate::error::Result;

const DB_FILE_NAME: &str = "offsync-remote.db";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    user_id TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS exam_attempts (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS writing_responses (
    exam_attempt_id TEXT NOT NULL,
    task TEXT NOT NULL,
    user_id TEXT NOT NULL,
    task_type TEXT NOT NULL,
    answer_text TEXT NOT NULL,
    word_count INTEGER NOT NULL,
    duration_seconds INTEGER,
    evaluation_version TEXT NOT NULL,
    PRIMARY KEY (exam_attempt_id, task)
);
CREATE TABLE IF NOT EXISTS exam_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    attempt_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    event_type TEXT NOT NULL,
    payload TEXT NOT NULL,
    occurred_at TEXT NOT NULL,
    offline_id TEXT,
    offline_revision INTEGER
);
CREATE UNIQUE INDEX IF NOT EXISTS exam_events_offline_id
    ON exam_events(attempt_id, user_id, event_type, offline_id)
    WHERE offline_id IS NOT NULL;
CREATE UNIQUE INDEX IF NOT EXISTS exam_events_offline_revision
    ON exam_events(attempt_id, user_id, event_type, offline_revision)
    WHERE offline_revision IS NOT NULL;
";

/// Event type recorded for each applied draft revision.
pub const AUTOSAVE_EVENT: &str = "autosave";

/// Normalized draft, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftWrite {
    pub attempt_id: String,
    pub revision: u64,
    pub tasks: Vec<(TaskId, String, u32)>,
    pub active_task: Option<TaskId>,
    pub elapsed_seconds: Option<i64>,
    pub updated_at: String,
}

/// Normalized event, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct EventWrite {
    pub attempt_id: String,
    pub event_type: EventType,
    pub offline_id: String,
    pub payload: Map<String, Value>,
    pub occurred_at: String,
}

/// What happened to one submitted entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Persisted, or already present from an earlier submission.
    Applied,
    /// The attempt does not belong to the caller; nothing was written.
    NotOwned,
}

/// One row of `writing_responses`.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub struct WritingResponse {
    pub user_id: String,
    pub answer_text: String,
    pub word_count: u32,
    pub duration_seconds: Option<i64>,
    pub evaluation_version: String,
}

/// One row of `exam_events`.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    pub event_type: String,
    pub payload: Value,
    pub occurred_at: String,
}

/// Shared server state containing the canonical database.
#[derive(Clone)]
pub struct ServerState {
    inner: Arc<ServerStateInner>,
}

struct ServerStateInner {
    db: Mutex<Connection>,
}

impl ServerState {
    /// Opens (creating if needed) the database in `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let conn = Connection::open(data_dir.join(DB_FILE_NAME))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(ServerState {
            inner: Arc::new(ServerStateInner {
                db: Mutex::new(conn),
            }),
        })
    }

    /// Registers a bearer token for `user_id`, replacing any previous owner.
    pub async fn add_session(&self, token: &str, user_id: &str) -> Result<()> {
        let conn = self.inner.db.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO sessions (token, user_id) VALUES (?1, ?2)",
            params![token, user_id],
        )?;
        Ok(())
    }

    /// Registers an exam attempt owned by `user_id`.
    pub async fn add_attempt(&self, attempt_id: &str, user_id: &str) -> Result<()> {
        let conn = self.inner.db.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO exam_attempts (id, user_id) VALUES (?1, ?2)",
            params![attempt_id, user_id],
        )?;
        Ok(())
    }

    /// Resolves a bearer token to its user.
    pub async fn resolve_session(&self, token: &str) -> Result<Option<String>> {
        let conn = self.inner.db.lock().await;
        let user = conn
            .query_row(
                "SELECT user_id FROM sessions WHERE token = ?1",
                params![token],
                |row| row.get(0),
            )
            .optional()?;
        Ok(user)
    }

    /// Upserts each task's response and records one autosave event per
    /// revision, all in one transaction.
    pub async fn apply_draft(&self, user_id: &str, draft: &DraftWrite) -> Result<WriteOutcome> {
        let mut conn = self.inner.db.lock().await;
        let tx = conn.transaction()?;
        if !owns_attempt(&tx, user_id, &draft.attempt_id)? {
            return Ok(WriteOutcome::NotOwned);
        }

        for (task, content, word_count) in &draft.tasks {
            tx.execute(
                "INSERT INTO writing_responses
                    (exam_attempt_id, task, user_id, task_type, answer_text, word_count,
                     duration_seconds, evaluation_version)
                 VALUES (?1, ?2, ?3, ?2, ?4, ?5, ?6, 'draft')
                 ON CONFLICT (exam_attempt_id, task) DO UPDATE SET
                    answer_text = excluded.answer_text,
                    word_count = excluded.word_count,
                    duration_seconds = excluded.duration_seconds,
                    evaluation_version = excluded.evaluation_version
                 WHERE writing_responses.user_id = excluded.user_id",
                params![
                    draft.attempt_id,
                    task.as_str(),
                    user_id,
                    content,
                    word_count,
                    draft.elapsed_seconds
                ],
            )?;
        }

        let mut tasks = Map::new();
        for (task, content, word_count) in &draft.tasks {
            tasks.insert(
                task.as_str().to_string(),
                serde_json::json!({ "content": content, "wordCount": word_count }),
            );
        }
        let payload = serde_json::json!({
            "tasks": tasks,
            "activeTask": draft.active_task.map(|t| t.as_str()),
            "elapsedSeconds": draft.elapsed_seconds,
            "offlineRevision": draft.revision,
            "offlineUpdatedAt": draft.updated_at,
        });
        let revision = i64::try_from(draft.revision).unwrap_or(i64::MAX);
        tx.execute(
            "INSERT INTO exam_events
                (attempt_id, user_id, event_type, payload, occurred_at, offline_revision)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT DO NOTHING",
            params![
                draft.attempt_id,
                user_id,
                AUTOSAVE_EVENT,
                serde_json::to_string(&payload)?,
                draft.updated_at,
                revision
            ],
        )?;

        tx.commit()?;
        Ok(WriteOutcome::Applied)
    }

    /// Inserts an event unless one with the same offline id exists.
    pub async fn apply_event(&self, user_id: &str, event: &EventWrite) -> Result<WriteOutcome> {
        let conn = self.inner.db.lock().await;
        if !owns_attempt(&conn, user_id, &event.attempt_id)? {
            return Ok(WriteOutcome::NotOwned);
        }

        let mut payload = event.payload.clone();
        payload.insert("offlineId".into(), Value::from(event.offline_id.clone()));
        conn.execute(
            "INSERT INTO exam_events
                (attempt_id, user_id, event_type, payload, occurred_at, offline_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT DO NOTHING",
            params![
                event.attempt_id,
                user_id,
                event.event_type.as_str(),
                serde_json::to_string(&payload)?,
                event.occurred_at,
                event.offline_id
            ],
        )?;
        Ok(WriteOutcome::Applied)
    }

    /// Returns the stored response for one task of the caller's attempt.
    #[cfg(test)]
    pub async fn writing_response(
        &self,
        user_id: &str,
        attempt_id: &str,
        task: TaskId,
    ) -> Result<Option<WritingResponse>> {
        let conn = self.inner.db.lock().await;
        let response = conn
            .query_row(
                "SELECT user_id, answer_text, word_count, duration_seconds, evaluation_version
                 FROM writing_responses
                 WHERE exam_attempt_id = ?1 AND task = ?2 AND user_id = ?3",
                params![attempt_id, task.as_str(), user_id],
                |row| {
                    Ok(WritingResponse {
                        user_id: row.get(0)?,
                        answer_text: row.get(1)?,
                        word_count: row.get(2)?,
                        duration_seconds: row.get(3)?,
                        evaluation_version: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(response)
    }

    /// Returns the caller's events for an attempt, oldest first.
    #[cfg(test)]
    pub async fn events(&self, user_id: &str, attempt_id: &str) -> Result<Vec<StoredEvent>> {
        let conn = self.inner.db.lock().await;
        let mut stmt = conn.prepare(
            "SELECT event_type, payload, occurred_at FROM exam_events
             WHERE attempt_id = ?1 AND user_id = ?2
             ORDER BY id",
        )?;
        let rows = stmt.query_map(params![attempt_id, user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (event_type, payload, occurred_at) = row?;
            events.push(StoredEvent {
                event_type,
                payload: serde_json::from_str(&payload)?,
                occurred_at,
            });
        }
        Ok(events)
    }
}

fn owns_attempt(conn: &Connection, user_id: &str, attempt_id: &str) -> Result<bool> {
    let owned = conn
        .query_row(
            "SELECT 1 FROM exam_attempts WHERE id = ?1 AND user_id = ?2",
            params![attempt_id, user_id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(owned.is_some())
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
