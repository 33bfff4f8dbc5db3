// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use super::*;
use crate::store::LocalStore;
use crate::sync::transport_tests::{MockReply, MockTransport};
use offsync_core::{DraftPayload, EventType, TaskId, TaskSnapshot};
use tokio::sync::mpsc;

fn setup() -> (SyncOrchestrator<MockTransport>, MockTransport) {
    let queue = OfflineQueue::new(Arc::new(LocalStore::in_memory()));
    let mock = MockTransport::new();
    let orchestrator = SyncOrchestrator::new(queue, mock.clone(), SyncOptions::default());
    (orchestrator, mock)
}

fn queue_draft(orch: &SyncOrchestrator<MockTransport>, attempt: &str, content: &str) -> DraftRecord {
    let mut payload = DraftPayload::default();
    payload
        .tasks
        .insert(TaskId::Task1, TaskSnapshot::from_content(content));
    orch.queue().queue_writing_draft(attempt, payload).unwrap()
}

fn queue_event(orch: &SyncOrchestrator<MockTransport>, attempt: &str) -> EventRecord {
    orch.queue()
        .queue_exam_event(attempt, EventType::Typing, None)
        .unwrap()
}

fn queued(orch: &SyncOrchestrator<MockTransport>) -> (usize, usize) {
    let counts = orch.queue().pending_counts();
    (counts.drafts, counts.events)
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met in time");
}

#[tokio::test]
async fn drains_queue_in_one_batch() {
    let (orch, mock) = setup();
    queue_draft(&orch, "A1", "Hello");
    queue_event(&orch, "A1");
    queue_event(&orch, "A1");

    let outcome = orch.sync_now(SyncReason::Manual).await;

    assert_eq!(
        outcome,
        SyncOutcome::Drained(CycleReport {
            batches: 1,
            synced_drafts: 1,
            synced_events: 2,
            ..CycleReport::default()
        })
    );
    assert_eq!(queued(&orch), (0, 0));
    assert_eq!(mock.sent().len(), 1);
    let status = orch.status();
    assert_eq!(status.state, SyncState::Idle);
    assert!(!status.pending);
}

#[tokio::test]
async fn empty_queue_sends_nothing() {
    let (orch, mock) = setup();
    let outcome = orch.sync_now(SyncReason::Manual).await;
    assert_eq!(outcome, SyncOutcome::Drained(CycleReport::default()));
    assert!(mock.sent().is_empty());
}

#[tokio::test]
async fn offline_edit_then_reconnect_sends_latest_revision() {
    let (orch, mock) = setup();
    queue_draft(&orch, "A1", "Hello");
    orch.set_online(false);
    queue_draft(&orch, "A1", "Hello there my good friend");

    let outcome = orch.sync_now(SyncReason::Manual).await;
    assert_eq!(
        outcome,
        SyncOutcome::Offline {
            retry_in: INITIAL_BACKOFF
        }
    );
    assert!(mock.sent().is_empty());

    orch.set_online(true);
    let outcome = orch.sync_now(SyncReason::Online).await;
    assert!(matches!(outcome, SyncOutcome::Drained(_)), "{outcome:?}");

    let sent = mock.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].drafts.len(), 1);
    let entry = &sent[0].drafts[0];
    assert_eq!(entry.id, "writing:A1");
    assert_eq!(entry.revision, 2);
    assert_eq!(entry.payload.tasks[&TaskId::Task1].word_count, 5);
    assert_eq!(queued(&orch), (0, 0));
}

#[tokio::test]
async fn batches_are_bounded() {
    let (orch, mock) = setup();
    for i in 0..7 {
        queue_draft(&orch, &format!("A{i}"), "text");
    }
    for _ in 0..60 {
        queue_event(&orch, "A0");
    }

    let outcome = orch.sync_now(SyncReason::Manual).await;
    let SyncOutcome::Drained(report) = outcome else {
        panic!("expected drain, got {outcome:?}");
    };
    assert_eq!(report.batches, 2);
    assert_eq!(report.synced_drafts, 7);
    assert_eq!(report.synced_events, 60);

    let sent = mock.sent();
    assert_eq!(sent[0].drafts.len(), MAX_DRAFTS_PER_BATCH);
    assert_eq!(sent[0].events.len(), MAX_EVENTS_PER_BATCH);
    assert_eq!(sent[1].drafts.len(), 2);
    assert_eq!(sent[1].events.len(), 10);
}

#[tokio::test]
async fn partial_success_removes_exactly_the_applied_subset() {
    let (orch, mock) = setup();
    let d1 = queue_draft(&orch, "A1", "one");
    let d2 = queue_draft(&orch, "A2", "two");
    let e1 = queue_event(&orch, "A1");
    let e2 = queue_event(&orch, "A1");

    mock.push_reply(MockReply::Ack {
        drafts: vec![d1.id.clone()],
        events: vec![e1.id],
    });
    mock.set_fallback(MockReply::Unreachable);

    let outcome = orch.sync_now(SyncReason::Manual).await;
    let SyncOutcome::Failed { report, .. } = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(report.synced_drafts, 1);
    assert_eq!(report.synced_events, 1);

    let drafts = orch.queue().list_queued_drafts();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].id, d2.id);
    let events = orch.queue().list_queued_events(None);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, e2.id);
    orch.dispose();
}

#[tokio::test]
async fn unknown_ids_in_response_are_ignored() {
    let (orch, mock) = setup();
    queue_draft(&orch, "A1", "one");
    mock.push_reply(MockReply::Ack {
        drafts: vec!["writing:A1".into(), "writing:ZZ".into()],
        events: vec![999],
    });

    let outcome = orch.sync_now(SyncReason::Manual).await;
    assert!(matches!(outcome, SyncOutcome::Drained(_)), "{outcome:?}");
    assert_eq!(queued(&orch), (0, 0));
}

#[tokio::test]
async fn omitted_drafts_do_not_starve_newer_ones() {
    let (orch, mock) = setup();
    for i in 1..=5 {
        queue_draft(&orch, &format!("A{i}"), "foreign");
    }
    queue_draft(&orch, "A6", "mine");
    mock.set_fallback(MockReply::Ack {
        drafts: vec!["writing:A6".into()],
        events: vec![],
    });

    let outcome = orch.sync_now(SyncReason::Manual).await;
    let SyncOutcome::Failed { report, .. } = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(report.batches, 2);
    assert_eq!(report.synced_drafts, 1);

    let sent = mock.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].drafts.len(), MAX_DRAFTS_PER_BATCH);
    assert_eq!(sent[1].drafts.len(), 1);
    assert_eq!(sent[1].drafts[0].id, "writing:A6");

    assert_eq!(queued(&orch), (5, 0));
    assert!(orch
        .queue()
        .list_queued_drafts()
        .iter()
        .all(|d| d.id != "writing:A6"));
    orch.dispose();
}

#[tokio::test]
async fn omitted_events_do_not_starve_newer_ones() {
    let queue = OfflineQueue::new(Arc::new(LocalStore::in_memory()));
    let mock = MockTransport::new();
    let options = SyncOptions {
        max_events_per_batch: 2,
        ..SyncOptions::default()
    };
    let orch = SyncOrchestrator::new(queue, mock.clone(), options);
    queue_event(&orch, "A1");
    queue_event(&orch, "A1");
    let mine = queue_event(&orch, "A2");
    mock.set_fallback(MockReply::Ack {
        drafts: vec![],
        events: vec![mine.id],
    });

    let outcome = orch.sync_now(SyncReason::Manual).await;
    assert!(matches!(outcome, SyncOutcome::Failed { .. }), "{outcome:?}");
    assert_eq!(mock.sent().len(), 2);
    assert_eq!(queued(&orch), (0, 2));
    orch.dispose();
}

#[tokio::test]
async fn rejected_batch_drops_drafts_but_keeps_events() {
    let (orch, mock) = setup();
    queue_draft(&orch, "A1", "one");
    queue_draft(&orch, "A2", "two");
    let event = queue_event(&orch, "A1");
    mock.push_reply(MockReply::Status(422));

    let outcome = orch.sync_now(SyncReason::Manual).await;
    assert_eq!(
        outcome,
        SyncOutcome::Drained(CycleReport {
            batches: 2,
            synced_events: 1,
            dropped_drafts: 2,
            ..CycleReport::default()
        })
    );

    let sent = mock.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].drafts.len(), 0);
    assert_eq!(sent[1].events.len(), 1);
    assert_eq!(sent[1].events[0].id, event.id);
    assert_eq!(queued(&orch), (0, 0));
    assert_eq!(orch.status().consecutive_failures, 0);
}

#[tokio::test]
async fn rejected_events_stay_queued() {
    let (orch, mock) = setup();
    queue_event(&orch, "A1");
    mock.set_fallback(MockReply::Status(400));

    let outcome = orch.sync_now(SyncReason::Manual).await;
    let SyncOutcome::Failed { report, .. } = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(report.batches, 1);
    assert_eq!(report.dropped_drafts, 0);
    assert_eq!(mock.sent().len(), 1);
    assert_eq!(queued(&orch), (0, 1));
    orch.dispose();
}

#[tokio::test]
async fn unauthorized_is_retried_not_dropped() {
    let (orch, mock) = setup();
    queue_draft(&orch, "A1", "one");
    queue_event(&orch, "A1");
    mock.set_fallback(MockReply::Status(401));

    let outcome = orch.sync_now(SyncReason::Manual).await;
    let SyncOutcome::Failed { retry_in, error, .. } = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(retry_in, INITIAL_BACKOFF);
    assert!(error.contains("401"), "{error}");
    assert_eq!(queued(&orch), (1, 1));

    let status = orch.status();
    assert_eq!(status.state, SyncState::PendingRetry);
    assert!(status.pending);
    orch.dispose();
}

#[tokio::test]
async fn nothing_applied_counts_as_failure() {
    let (orch, mock) = setup();
    queue_draft(&orch, "A1", "one");
    mock.push_reply(MockReply::Ack {
        drafts: vec![],
        events: vec![],
    });

    let outcome = orch.sync_now(SyncReason::Manual).await;
    assert!(matches!(outcome, SyncOutcome::Failed { .. }), "{outcome:?}");
    assert_eq!(mock.sent().len(), 1);
    assert_eq!(queued(&orch), (1, 0));
    orch.dispose();
}

#[tokio::test]
async fn concurrent_requests_coalesce_into_one_cycle() {
    let (orch, mock) = setup();
    queue_draft(&orch, "A1", "one");
    mock.hold();

    let first = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.sync_now(SyncReason::Manual).await })
    };
    wait_for(|| mock.call_times().len() == 1).await;
    assert_eq!(orch.status().state, SyncState::Syncing);

    for _ in 0..10 {
        orch.request_sync(SyncReason::Manual);
    }
    assert_eq!(orch.sync_now(SyncReason::Manual).await, SyncOutcome::Coalesced);
    queue_draft(&orch, "A2", "two");

    mock.release();
    let outcome = first.await.unwrap();
    let SyncOutcome::Drained(report) = outcome else {
        panic!("expected drain, got {outcome:?}");
    };
    assert_eq!(report.synced_drafts, 2);

    wait_for(|| orch.status().state == SyncState::Idle).await;
    assert_eq!(mock.max_in_flight(), 1);
    assert_eq!(queued(&orch), (0, 0));
}

#[tokio::test]
async fn edit_during_flight_keeps_newer_revision() {
    let (orch, mock) = setup();
    queue_draft(&orch, "A1", "first");
    mock.hold();

    let cycle = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.sync_now(SyncReason::Manual).await })
    };
    wait_for(|| mock.call_times().len() == 1).await;
    queue_draft(&orch, "A1", "first and second");
    mock.release();

    assert!(matches!(cycle.await.unwrap(), SyncOutcome::Drained(_)));
    let sent = mock.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].drafts[0].revision, 1);
    assert_eq!(sent[1].drafts[0].revision, 2);
    assert_eq!(queued(&orch), (0, 0));
}

#[tokio::test(start_paused = true)]
async fn retry_delay_doubles_then_resets_on_success() {
    let (orch, mock) = setup();
    queue_draft(&orch, "A1", "one");
    mock.set_fallback(MockReply::Status(503));

    let outcome = orch.sync_now(SyncReason::Manual).await;
    assert!(matches!(
        outcome,
        SyncOutcome::Failed { retry_in, .. } if retry_in == INITIAL_BACKOFF
    ));

    // Attempts at 0s, 2s, 6s and 14s; the next is due at 30s.
    tokio::time::sleep(Duration::from_secs(20)).await;
    let times = mock.call_times();
    assert_eq!(times.len(), 4);
    let gaps: Vec<u64> = times
        .windows(2)
        .map(|w| (w[1] - w[0]).as_secs())
        .collect();
    assert_eq!(gaps, vec![2, 4, 8]);

    let status = orch.status();
    assert_eq!(status.state, SyncState::PendingRetry);
    assert_eq!(status.consecutive_failures, 4);
    assert_eq!(status.next_backoff, Duration::from_secs(32));

    mock.set_fallback(MockReply::AckAll);
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(mock.call_times().len(), 5);
    assert_eq!(queued(&orch), (0, 0));

    let status = orch.status();
    assert_eq!(status.state, SyncState::Idle);
    assert_eq!(status.consecutive_failures, 0);
    assert_eq!(status.next_backoff, INITIAL_BACKOFF);
}

#[tokio::test(start_paused = true)]
async fn retry_delay_is_capped() {
    let queue = OfflineQueue::new(Arc::new(LocalStore::in_memory()));
    let mock = MockTransport::new();
    let options = SyncOptions {
        initial_backoff: Duration::from_secs(1),
        max_backoff: Duration::from_secs(3),
        ..SyncOptions::default()
    };
    let orch = SyncOrchestrator::new(queue, mock.clone(), options);
    queue_draft(&orch, "A1", "one");
    mock.set_fallback(MockReply::Unreachable);

    orch.sync_now(SyncReason::Manual).await;
    // Attempts at 0, 1, 3, 6, 9, 12.
    tokio::time::sleep(Duration::from_millis(12_500)).await;
    let gaps: Vec<u64> = mock
        .call_times()
        .windows(2)
        .map(|w| (w[1] - w[0]).as_secs())
        .collect();
    assert_eq!(gaps, vec![1, 2, 3, 3, 3]);
    orch.dispose();
}

#[tokio::test(start_paused = true)]
async fn offline_defers_until_online_signal() {
    let (orch, mock) = setup();
    queue_draft(&orch, "A1", "one");
    orch.handle_signal(HostSignal::Offline);

    let outcome = orch.sync_now(SyncReason::Manual).await;
    assert!(matches!(outcome, SyncOutcome::Offline { .. }));
    let status = orch.status();
    assert_eq!(status.state, SyncState::PendingRetry);
    assert!(status.pending);
    assert!(!status.online);

    orch.handle_signal(HostSignal::Online);
    wait_for(|| queued(&orch) == (0, 0)).await;
    assert_eq!(mock.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn unloading_clears_the_retry_timer() {
    let (orch, mock) = setup();
    queue_draft(&orch, "A1", "one");
    mock.set_fallback(MockReply::Unreachable);

    orch.sync_now(SyncReason::Manual).await;
    assert_eq!(orch.status().state, SyncState::PendingRetry);

    orch.handle_signal(HostSignal::Unloading);
    assert_eq!(orch.status().state, SyncState::Idle);
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(mock.call_times().len(), 1);
    assert_eq!(queued(&orch), (1, 0));
}

#[tokio::test(start_paused = true)]
async fn signals_trigger_syncs() {
    let (orch, mock) = setup();
    let (tx, rx) = mpsc::channel(8);
    orch.start(rx);

    queue_draft(&orch, "A1", "one");
    tx.send(HostSignal::BackgroundWake {
        tag: BACKGROUND_SYNC_TAG.to_string(),
    })
    .await
    .unwrap();
    wait_for(|| queued(&orch) == (0, 0)).await;

    queue_draft(&orch, "A2", "two");
    tx.send(HostSignal::BackgroundWake {
        tag: "something-else".to_string(),
    })
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(queued(&orch), (1, 0));

    tx.send(HostSignal::Offline).await.unwrap();
    wait_for(|| !orch.is_online()).await;
    tx.send(HostSignal::Online).await.unwrap();
    wait_for(|| queued(&orch) == (0, 0)).await;
    assert_eq!(mock.sent().len(), 2);
    orch.dispose();
}

#[tokio::test(start_paused = true)]
async fn dispose_detaches_signals_and_clears_retry() {
    let (orch, mock) = setup();
    queue_draft(&orch, "A1", "one");
    mock.set_fallback(MockReply::Unreachable);
    let (tx, rx) = mpsc::channel(8);

    orch.start(rx);
    wait_for(|| orch.status().state == SyncState::PendingRetry).await;
    assert_eq!(mock.call_times().len(), 1);

    orch.dispose();
    assert_eq!(orch.status().state, SyncState::Idle);

    let _ = tx.send(HostSignal::Online).await;
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(mock.call_times().len(), 1);
}

#[test]
fn request_outside_runtime_only_marks_pending() {
    let (orch, mock) = setup();
    orch.request_sync(SyncReason::Manual);
    assert!(orch.status().pending);
    assert!(mock.sent().is_empty());
}
