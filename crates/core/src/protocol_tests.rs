// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::record::{draft_id, NewEvent, TaskId, TaskSnapshot, SCHEMA_VERSION};

fn test_draft() -> DraftRecord {
    let mut payload = DraftPayload::default();
    payload
        .tasks
        .insert(TaskId::Task1, TaskSnapshot::from_content("Hello"));
    DraftRecord {
        id: draft_id(RecordKind::Writing, "A1"),
        kind: RecordKind::Writing,
        attempt_id: "A1".to_string(),
        revision: 2,
        updated_at: 2000,
        queued_at: 1000,
        payload,
        schema_version: SCHEMA_VERSION,
    }
}

fn test_event() -> EventRecord {
    NewEvent {
        kind: RecordKind::Writing,
        attempt_id: "A1".to_string(),
        event_type: EventType::Focus,
        payload: None,
        occurred_at: 1500,
        offline_id: "off-1".to_string(),
        schema_version: SCHEMA_VERSION,
    }
    .with_id(3)
}

#[test]
fn request_json_format() {
    let request = SyncRequest::from_records(&[test_draft()], &[test_event()]);
    let json: serde_json::Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();

    let draft = &json["drafts"][0];
    assert_eq!(draft["id"], "writing:A1");
    assert_eq!(draft["kind"], "writing");
    assert_eq!(draft["attemptId"], "A1");
    assert_eq!(draft["revision"], 2);
    assert_eq!(draft["updatedAt"], 2000);
    assert_eq!(draft["payload"]["tasks"]["task1"]["wordCount"], 1);
    assert!(draft.get("queuedAt").is_none());
    assert!(draft.get("schemaVersion").is_none());

    let event = &json["events"][0];
    assert_eq!(event["id"], 3);
    assert_eq!(event["eventType"], "focus");
    assert_eq!(event["occurredAt"], 1500);
    assert_eq!(event["offlineId"], "off-1");
    assert!(event.get("payload").is_none());
}

#[test]
fn request_missing_arrays_default_to_empty() {
    let request = SyncRequest::from_json("{}").unwrap();
    assert!(request.is_empty());
}

#[test]
fn request_rejects_unknown_kind() {
    let json = r#"{"events":[{"id":1,"kind":"reading","attemptId":"A1","eventType":"focus","occurredAt":1,"offlineId":"x"}]}"#;
    assert!(SyncRequest::from_json(json).is_err());
}

#[test]
fn request_rejects_negative_revision() {
    let json = r#"{"drafts":[{"id":"writing:A1","kind":"writing","attemptId":"A1","revision":-1,"updatedAt":1,"payload":{}}]}"#;
    assert!(SyncRequest::from_json(json).is_err());
}

#[test]
fn response_json_format() {
    let response = SyncResponse::applied(vec!["writing:A1".to_string()], vec![3, 4]);
    let json = response.to_json().unwrap();
    assert_eq!(
        json,
        r#"{"ok":true,"syncedDraftIds":["writing:A1"],"syncedEventIds":[3,4]}"#
    );
}

#[test]
fn response_without_id_lists_parses_as_nothing_applied() {
    let response = SyncResponse::from_json(r#"{"ok":true}"#).unwrap();
    assert!(response.ok);
    assert!(response.synced_draft_ids.is_empty());
    assert!(response.synced_event_ids.is_empty());
}
