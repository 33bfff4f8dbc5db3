// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use super::*;
use crate::record::{DraftPayload, EventType, RecordKind, TaskId, TaskSnapshot};

const ATTEMPT: &str = "0b8f5c2e-3d1a-4c6f-9e2b-7a4d1f0c8e11";

fn draft(attempt_id: &str) -> DraftEntry {
    let mut payload = DraftPayload::default();
    payload
        .tasks
        .insert(TaskId::Task1, TaskSnapshot::from_content("Hello"));
    DraftEntry {
        id: format!("writing:{attempt_id}"),
        kind: RecordKind::Writing,
        attempt_id: attempt_id.to_string(),
        revision: 1,
        updated_at: 1000,
        payload,
    }
}

fn event(id: i64, offline_id: &str) -> EventEntry {
    EventEntry {
        id,
        kind: RecordKind::Writing,
        attempt_id: ATTEMPT.to_string(),
        event_type: EventType::Typing,
        occurred_at: 1000,
        payload: None,
        offline_id: offline_id.to_string(),
    }
}

fn issues_of(request: &SyncRequest) -> Vec<String> {
    match validate_request(request) {
        Err(Error::InvalidBatch { issues }) => issues,
        other => panic!("expected invalid batch, got {other:?}"),
    }
}

#[test]
fn valid_batch_passes() {
    let request = SyncRequest {
        drafts: vec![draft(ATTEMPT)],
        events: vec![event(1, "off-1")],
    };
    assert!(validate_request(&request).is_ok());
}

#[test]
fn empty_batch_passes() {
    assert!(validate_request(&SyncRequest::default()).is_ok());
}

#[test]
fn non_uuid_attempt_is_rejected() {
    let request = SyncRequest {
        drafts: vec![draft("A1")],
        events: vec![],
    };
    let issues = issues_of(&request);
    assert_eq!(issues, vec!["drafts[0].attemptId: must be a UUID".to_string()]);
}

#[test]
fn oversized_content_is_rejected() {
    let mut entry = draft(ATTEMPT);
    entry.payload.tasks.insert(
        TaskId::Task2,
        TaskSnapshot::from_content("x".repeat(MAX_CONTENT_CHARS + 1)),
    );
    let request = SyncRequest {
        drafts: vec![entry],
        events: vec![],
    };
    let issues = issues_of(&request);
    assert_eq!(issues.len(), 1);
    assert!(issues[0].starts_with("drafts[0].payload.tasks.task2.content: too long"));
}

#[test]
fn content_at_limit_is_accepted() {
    let mut entry = draft(ATTEMPT);
    entry.payload.tasks.insert(
        TaskId::Task1,
        TaskSnapshot::from_content("x".repeat(MAX_CONTENT_CHARS)),
    );
    let request = SyncRequest {
        drafts: vec![entry],
        events: vec![],
    };
    assert!(validate_request(&request).is_ok());
}

#[test]
fn negative_or_nan_elapsed_is_rejected() {
    let mut negative = draft(ATTEMPT);
    negative.payload.elapsed_seconds = Some(-1.0);
    let mut nan = draft(ATTEMPT);
    nan.payload.elapsed_seconds = Some(f64::NAN);
    let request = SyncRequest {
        drafts: vec![negative, nan],
        events: vec![],
    };
    assert_eq!(issues_of(&request).len(), 2);
}

#[test]
fn event_issues_are_all_reported() {
    let mut bad = event(-4, " ");
    bad.attempt_id = "nope".to_string();
    let request = SyncRequest {
        drafts: vec![],
        events: vec![event(1, "ok"), bad],
    };
    let issues = issues_of(&request);
    assert_eq!(
        issues,
        vec![
            "events[1].id: must be non-negative".to_string(),
            "events[1].attemptId: must be a UUID".to_string(),
            "events[1].offlineId: cannot be empty".to_string(),
        ]
    );
}
