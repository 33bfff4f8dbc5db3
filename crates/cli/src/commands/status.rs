// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, SecondsFormat};
use serde::Serialize;

use offsync_core::{DraftRecord, EventRecord};

use super::{open_context, Context};
use crate::cli::OutputFormat;
use crate::error::Result;

/// Snapshot of the local queue as shown by `offsync status`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatusReport {
    pub database: String,
    pub server_url: String,
    pub drafts: Vec<DraftRecord>,
    pub events: Vec<EventRecord>,
}

pub fn run(data_dir: Option<&Path>, output: OutputFormat) -> Result<()> {
    let ctx = open_context(data_dir)?;
    let report = run_impl(&ctx);
    match output {
        OutputFormat::Text => print!("{}", format_text(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

/// Internal implementation that accepts a context for testing.
pub(crate) fn run_impl(ctx: &Context) -> StatusReport {
    let queue = ctx.queue();
    StatusReport {
        database: ctx.db_path.display().to_string(),
        server_url: ctx.config.server_url.clone(),
        drafts: queue.list_queued_drafts(),
        events: queue.list_queued_events(None),
    }
}

pub(crate) fn format_text(report: &StatusReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Queue:  {}", report.database);
    let _ = writeln!(out, "Server: {}", report.server_url);

    if report.drafts.is_empty() && report.events.is_empty() {
        let _ = writeln!(out, "\nNothing queued.");
        return out;
    }

    let _ = writeln!(out, "\nDrafts ({}):", report.drafts.len());
    for draft in &report.drafts {
        let tasks: Vec<String> = draft
            .payload
            .tasks
            .iter()
            .map(|(task, snapshot)| format!("{} {}w", task, snapshot.word_count))
            .collect();
        let _ = writeln!(
            out,
            "  {}  rev {}  [{}]  updated {}",
            draft.id,
            draft.revision,
            tasks.join(", "),
            format_ms(draft.updated_at)
        );
    }

    let _ = writeln!(out, "\nEvents ({}):", report.events.len());
    for event in &report.events {
        let _ = writeln!(
            out,
            "  #{}  {}  {}  {}",
            event.id,
            event.event_type,
            event.attempt_id,
            format_ms(event.occurred_at)
        );
    }
    out
}

/// Formats epoch milliseconds as RFC 3339, or the raw number if out of range.
fn format_ms(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| ms.to_string())
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
