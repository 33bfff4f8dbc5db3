// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync batch protocol between client and reconciliation server.
//!
//! The protocol is a single request/response exchange:
//! - Client posts a bounded batch of drafts and events
//! - Server answers with the ids it applied; anything omitted stays queued

use serde::{Deserialize, Serialize};

use crate::record::{DraftPayload, DraftRecord, EventRecord, EventType, RecordKind};

/// Path of the reconciliation endpoint.
pub const SYNC_PATH: &str = "/api/offline/sync";

/// Draft as submitted in a batch. Local bookkeeping fields are not sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftEntry {
    pub id: String,
    pub kind: RecordKind,
    pub attempt_id: String,
    pub revision: u64,
    pub updated_at: u64,
    pub payload: DraftPayload,
}

/// Event as submitted in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEntry {
    pub id: i64,
    pub kind: RecordKind,
    pub attempt_id: String,
    pub event_type: EventType,
    pub occurred_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Map<String, serde_json::Value>>,
    pub offline_id: String,
}

/// Request body sent from client to server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    #[serde(default)]
    pub drafts: Vec<DraftEntry>,
    #[serde(default)]
    pub events: Vec<EventEntry>,
}

/// Response body sent from server to client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub ok: bool,
    #[serde(default)]
    pub synced_draft_ids: Vec<String>,
    #[serde(default)]
    pub synced_event_ids: Vec<i64>,
}

impl From<&DraftRecord> for DraftEntry {
    fn from(record: &DraftRecord) -> Self {
        DraftEntry {
            id: record.id.clone(),
            kind: record.kind,
            attempt_id: record.attempt_id.clone(),
            revision: record.revision,
            updated_at: record.updated_at,
            payload: record.payload.clone(),
        }
    }
}

impl From<&EventRecord> for EventEntry {
    fn from(record: &EventRecord) -> Self {
        EventEntry {
            id: record.id,
            kind: record.kind,
            attempt_id: record.attempt_id.clone(),
            event_type: record.event_type,
            occurred_at: record.occurred_at,
            payload: record.payload.clone(),
            offline_id: record.offline_id.clone(),
        }
    }
}

impl SyncRequest {
    /// Builds a batch from queued records.
    pub fn from_records(drafts: &[DraftRecord], events: &[EventRecord]) -> Self {
        SyncRequest {
            drafts: drafts.iter().map(DraftEntry::from).collect(),
            events: events.iter().map(EventEntry::from).collect(),
        }
    }

    /// Returns true if the batch carries nothing.
    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty() && self.events.is_empty()
    }

    /// Serializes the request to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the request from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl SyncResponse {
    /// Creates a successful response listing the applied ids.
    pub fn applied(synced_draft_ids: Vec<String>, synced_event_ids: Vec<i64>) -> Self {
        SyncResponse {
            ok: true,
            synced_draft_ids,
            synced_event_ids,
        }
    }

    /// Serializes the response to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the response from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
