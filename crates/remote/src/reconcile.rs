// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Applies a validated sync batch for one user.
//!
//! Each entry is handled on its own: an entry that cannot be applied is
//! left out of the response and the client keeps it queued. Replaying a
//! batch is harmless since drafts upsert and events dedupe on `offlineId`.

use chrono::{DateTime, SecondsFormat};
use tracing::{debug, info, warn};

use offsync_core::{DraftEntry, EventEntry, SyncRequest, SyncResponse};

use crate::state::{DraftWrite, EventWrite, ServerState, WriteOutcome};

/// Applies `request` on behalf of `user_id`.
///
/// `now_ms` stands in for missing (zero) timestamps.
pub async fn reconcile(
    state: &ServerState,
    user_id: &str,
    request: &SyncRequest,
    now_ms: u64,
) -> SyncResponse {
    let mut synced_draft_ids = Vec::new();
    let mut synced_event_ids = Vec::new();

    for draft in &request.drafts {
        let Some(write) = normalize_draft(draft, now_ms) else {
            warn!(id = %draft.id, "draft timestamp out of range");
            continue;
        };
        match state.apply_draft(user_id, &write).await {
            Ok(WriteOutcome::Applied) => synced_draft_ids.push(draft.id.clone()),
            Ok(WriteOutcome::NotOwned) => {
                debug!(id = %draft.id, attempt_id = %draft.attempt_id, "draft for foreign attempt");
            }
            Err(e) => warn!(id = %draft.id, error = %e, "draft sync failed"),
        }
    }

    for event in &request.events {
        let Some(write) = normalize_event(event, now_ms) else {
            warn!(id = event.id, "event timestamp out of range");
            continue;
        };
        match state.apply_event(user_id, &write).await {
            Ok(WriteOutcome::Applied) => synced_event_ids.push(event.id),
            Ok(WriteOutcome::NotOwned) => {
                debug!(id = event.id, attempt_id = %event.attempt_id, "event for foreign attempt");
            }
            Err(e) => warn!(id = event.id, error = %e, "event sync failed"),
        }
    }

    if !request.is_empty() {
        info!(
            user_id,
            requested_drafts = request.drafts.len(),
            synced_drafts = synced_draft_ids.len(),
            requested_events = request.events.len(),
            synced_events = synced_event_ids.len(),
            "offline sync batch"
        );
    }

    SyncResponse::applied(synced_draft_ids, synced_event_ids)
}

pub(crate) fn normalize_draft(draft: &DraftEntry, now_ms: u64) -> Option<DraftWrite> {
    let tasks = draft
        .payload
        .tasks
        .iter()
        .map(|(task, snapshot)| (*task, snapshot.content.clone(), snapshot.word_count))
        .collect();

    Some(DraftWrite {
        attempt_id: draft.attempt_id.clone(),
        revision: draft.revision,
        tasks,
        active_task: draft.payload.active_task,
        elapsed_seconds: draft.payload.elapsed_seconds.and_then(round_seconds),
        updated_at: to_iso(draft.updated_at, now_ms)?,
    })
}

pub(crate) fn normalize_event(event: &EventEntry, now_ms: u64) -> Option<EventWrite> {
    Some(EventWrite {
        attempt_id: event.attempt_id.clone(),
        event_type: event.event_type,
        offline_id: event.offline_id.clone(),
        payload: event.payload.clone().unwrap_or_default(),
        occurred_at: to_iso(event.occurred_at, now_ms)?,
    })
}

/// Whole seconds, never negative. Non-finite input is dropped.
pub(crate) fn round_seconds(seconds: f64) -> Option<i64> {
    if !seconds.is_finite() {
        return None;
    }
    Some(seconds.round().max(0.0) as i64)
}

/// Replaces a zero timestamp with `now_ms`.
pub(crate) fn clamp_timestamp(ms: u64, now_ms: u64) -> u64 {
    if ms == 0 {
        now_ms
    } else {
        ms
    }
}

/// RFC 3339 form of a clamped timestamp, if representable.
pub(crate) fn to_iso(ms: u64, now_ms: u64) -> Option<String> {
    i64::try_from(clamp_timestamp(ms, now_ms))
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
