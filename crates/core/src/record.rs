// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Locally queued record types.
//!
//! A [`DraftRecord`] is the latest snapshot of an attempt's writing tasks and
//! is overwritten in place on every edit. An [`EventRecord`] is an immutable
//! interaction event carrying a client-generated `offline_id`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Version stamped on every record written by this build.
pub const SCHEMA_VERSION: u32 = 2;

/// Builds the composite draft key for a (kind, attempt) pair.
pub fn draft_id(kind: RecordKind, attempt_id: &str) -> String {
    format!("{}:{}", kind.as_str(), attempt_id)
}

/// The exam section a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Writing,
}

impl RecordKind {
    /// Returns the string representation used in storage and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Writing => "writing",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "writing" => Ok(RecordKind::Writing),
            _ => Err(Error::InvalidKind(s.to_string())),
        }
    }
}

/// Writing task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskId {
    Task1,
    Task2,
}

impl TaskId {
    /// Returns the string representation used in storage and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskId::Task1 => "task1",
            TaskId::Task2 => "task2",
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "task1" => Ok(TaskId::Task1),
            "task2" => Ok(TaskId::Task2),
            _ => Err(Error::InvalidTask(s.to_string())),
        }
    }
}

/// Discrete interaction captured while editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Focus,
    Blur,
    Typing,
}

impl EventType {
    /// Returns the string representation used in storage and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Focus => "focus",
            EventType::Blur => "blur",
            EventType::Typing => "typing",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "focus" => Ok(EventType::Focus),
            "blur" => Ok(EventType::Blur),
            "typing" => Ok(EventType::Typing),
            _ => Err(Error::InvalidEventType(s.to_string())),
        }
    }
}

/// Content of one writing task at the time of the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    pub content: String,
    pub word_count: u32,
}

impl TaskSnapshot {
    /// Snapshot with the word count derived from whitespace-separated tokens.
    pub fn from_content(content: impl Into<String>) -> Self {
        let content = content.into();
        let word_count = content.split_whitespace().count() as u32;
        TaskSnapshot {
            content,
            word_count,
        }
    }
}

/// Draft payload: per-task snapshots plus editor state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftPayload {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tasks: BTreeMap<TaskId, TaskSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_task: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<f64>,
}

impl DraftPayload {
    /// Overlays `newer` onto this payload.
    ///
    /// Tasks present in `newer` replace ours; editor state is taken from
    /// `newer` when it carries a value.
    pub fn merge(&mut self, newer: DraftPayload) {
        self.tasks.extend(newer.tasks);
        if newer.active_task.is_some() {
            self.active_task = newer.active_task;
        }
        if newer.elapsed_seconds.is_some() {
            self.elapsed_seconds = newer.elapsed_seconds;
        }
    }
}

/// The single queued draft for one (kind, attempt) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRecord {
    pub id: String,
    pub kind: RecordKind,
    pub attempt_id: String,
    pub revision: u64,
    pub updated_at: u64,
    pub queued_at: u64,
    pub payload: DraftPayload,
    pub schema_version: u32,
}

/// An event that has not been stored yet, so has no local id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub kind: RecordKind,
    pub attempt_id: String,
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Map<String, serde_json::Value>>,
    pub occurred_at: u64,
    pub offline_id: String,
    pub schema_version: u32,
}

impl NewEvent {
    /// Attaches the id assigned by the local store.
    pub fn with_id(self, id: i64) -> EventRecord {
        EventRecord {
            id,
            kind: self.kind,
            attempt_id: self.attempt_id,
            event_type: self.event_type,
            payload: self.payload,
            occurred_at: self.occurred_at,
            offline_id: self.offline_id,
            schema_version: self.schema_version,
        }
    }
}

/// A stored interaction event. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: i64,
    pub kind: RecordKind,
    pub attempt_id: String,
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Map<String, serde_json::Value>>,
    pub occurred_at: u64,
    pub offline_id: String,
    pub schema_version: u32,
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
