// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Typed queue API over the local store.
//!
//! Drafts are keyed per attempt and overwritten in place with a bumped
//! revision. Events are appended with a fresh `offline_id`. Nothing here
//! returns an error: if storage is unavailable, writes are dropped and
//! reads come back empty.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use offsync_core::{
    draft_id, ClockSource, DraftPayload, DraftRecord, EventRecord, EventType, NewEvent,
    RecordKind, SystemClock, SCHEMA_VERSION,
};

use crate::store::LocalStore;

/// Counts of records waiting to be synced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingCounts {
    pub drafts: usize,
    pub events: usize,
}

impl PendingCounts {
    pub fn is_empty(&self) -> bool {
        self.drafts == 0 && self.events == 0
    }
}

/// Draft/event queue backed by a [`LocalStore`].
#[derive(Clone)]
pub struct OfflineQueue {
    store: Arc<LocalStore>,
    clock: Arc<dyn ClockSource>,
}

impl OfflineQueue {
    /// Creates a queue using the system clock.
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Creates a queue with an injected clock.
    pub fn with_clock(store: Arc<LocalStore>, clock: Arc<dyn ClockSource>) -> Self {
        OfflineQueue { store, clock }
    }

    /// Queues the latest snapshot of an attempt's writing tasks.
    ///
    /// Replaces any queued draft for the attempt. The revision is one past
    /// the previous queued revision and `queued_at` keeps its first value.
    pub fn queue_writing_draft(&self, attempt_id: &str, payload: DraftPayload) -> Option<DraftRecord> {
        self.write_draft(attempt_id, |_| payload)
    }

    /// Like [`OfflineQueue::queue_writing_draft`], but overlays `payload` on
    /// the queued one so tasks not mentioned are kept.
    pub fn merge_writing_draft(&self, attempt_id: &str, payload: DraftPayload) -> Option<DraftRecord> {
        self.write_draft(attempt_id, |prev| {
            let mut merged = prev.unwrap_or_default();
            merged.merge(payload);
            merged
        })
    }

    fn write_draft<F>(&self, attempt_id: &str, build: F) -> Option<DraftRecord>
    where
        F: FnOnce(Option<DraftPayload>) -> DraftPayload,
    {
        let kind = RecordKind::Writing;
        let id = draft_id(kind, attempt_id);
        let now = self.clock.now_ms();

        let record = self.store.update_draft(&id, |prev| {
            let (revision, queued_at, prev_payload) = match prev {
                Some(prev) => (prev.revision + 1, prev.queued_at, Some(prev.payload)),
                None => (1, now, None),
            };
            DraftRecord {
                id: id.clone(),
                kind,
                attempt_id: attempt_id.to_string(),
                revision,
                updated_at: now,
                queued_at,
                payload: build(prev_payload),
                schema_version: SCHEMA_VERSION,
            }
        });

        match &record {
            Some(r) => debug!(id = %r.id, revision = r.revision, "queued draft"),
            None => warn!(%id, "draft not queued: local store unavailable"),
        }
        record
    }

    /// Queues an interaction event under a fresh offline id.
    pub fn queue_exam_event(
        &self,
        attempt_id: &str,
        event_type: EventType,
        payload: Option<Map<String, Value>>,
    ) -> Option<EventRecord> {
        let event = NewEvent {
            kind: RecordKind::Writing,
            attempt_id: attempt_id.to_string(),
            event_type,
            payload,
            occurred_at: self.clock.now_ms(),
            offline_id: Uuid::new_v4().to_string(),
            schema_version: SCHEMA_VERSION,
        };

        let record = self.store.add_event(event);
        match &record {
            Some(r) => debug!(id = r.id, offline_id = %r.offline_id, "queued event"),
            None => warn!(attempt_id, "event not queued: local store unavailable"),
        }
        record
    }

    /// Returns all queued drafts, oldest update first.
    pub fn list_queued_drafts(&self) -> Vec<DraftRecord> {
        self.store.get_all_drafts()
    }

    /// Returns queued events in insertion order, at most `limit` if given.
    pub fn list_queued_events(&self, limit: Option<usize>) -> Vec<EventRecord> {
        match limit {
            Some(limit) => self.store.get_events_limited(limit),
            None => self.store.get_events(),
        }
    }

    pub fn remove_queued_draft(&self, id: &str) {
        self.store.delete_draft(id);
    }

    /// Removes a draft the server applied at `revision`.
    ///
    /// If the draft was edited again since, the newer revision stays queued.
    pub fn remove_synced_draft(&self, id: &str, revision: u64) {
        self.store.delete_draft_through(id, revision);
    }

    pub fn remove_queued_events(&self, ids: &[i64]) {
        self.store.delete_events(ids);
    }

    /// Number of queued drafts and events.
    pub fn pending_counts(&self) -> PendingCounts {
        PendingCounts {
            drafts: self.store.get_all_drafts().len(),
            events: self.store.get_events().len(),
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
