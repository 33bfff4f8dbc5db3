// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Strict validation for submitted sync batches.
//!
//! Structural rules (known kinds, task ids, event types, non-negative
//! integers) are enforced by deserialization. This module checks the rules
//! types cannot express and reports every violation at once.

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::protocol::{DraftEntry, EventEntry, SyncRequest};

/// Maximum characters accepted for a single task's content.
pub const MAX_CONTENT_CHARS: usize = 50_000;

/// Validates a batch, collecting all issues.
pub fn validate_request(request: &SyncRequest) -> Result<()> {
    let mut issues = Vec::new();

    for (i, draft) in request.drafts.iter().enumerate() {
        validate_draft(&format!("drafts[{i}]"), draft, &mut issues);
    }
    for (i, event) in request.events.iter().enumerate() {
        validate_event(&format!("events[{i}]"), event, &mut issues);
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidBatch { issues })
    }
}

fn validate_draft(path: &str, draft: &DraftEntry, issues: &mut Vec<String>) {
    if draft.id.trim().is_empty() {
        issues.push(format!("{path}.id: cannot be empty"));
    }
    check_attempt_id(path, &draft.attempt_id, issues);

    for (task, snapshot) in &draft.payload.tasks {
        let chars = snapshot.content.chars().count();
        if chars > MAX_CONTENT_CHARS {
            issues.push(format!(
                "{path}.payload.tasks.{task}.content: too long ({chars} chars, max {MAX_CONTENT_CHARS})"
            ));
        }
    }

    if let Some(elapsed) = draft.payload.elapsed_seconds {
        if !elapsed.is_finite() || elapsed < 0.0 {
            issues.push(format!(
                "{path}.payload.elapsedSeconds: must be a non-negative number"
            ));
        }
    }
}

fn validate_event(path: &str, event: &EventEntry, issues: &mut Vec<String>) {
    if event.id < 0 {
        issues.push(format!("{path}.id: must be non-negative"));
    }
    check_attempt_id(path, &event.attempt_id, issues);
    if event.offline_id.trim().is_empty() {
        issues.push(format!("{path}.offlineId: cannot be empty"));
    }
}

fn check_attempt_id(path: &str, attempt_id: &str, issues: &mut Vec<String>) {
    if Uuid::parse_str(attempt_id).is_err() {
        issues.push(format!("{path}.attemptId: must be a UUID"));
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
