// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use serde_json::{Map, Value};

use offsync_core::{EventRecord, EventType};

use super::{open_context, Context};
use crate::error::{Error, Result};

pub fn run(
    data_dir: Option<&Path>,
    attempt: &str,
    event_type: &str,
    payload: Option<&str>,
) -> Result<()> {
    let ctx = open_context(data_dir)?;
    let record = run_impl(&ctx, attempt, event_type, payload)?;
    println!("Queued {} event {}", record.event_type, record.offline_id);
    Ok(())
}

/// Internal implementation that accepts a context for testing.
pub(crate) fn run_impl(
    ctx: &Context,
    attempt: &str,
    event_type: &str,
    payload: Option<&str>,
) -> Result<EventRecord> {
    let event_type: EventType = event_type.parse()?;
    let payload = payload.map(parse_payload).transpose()?;

    ctx.queue()
        .queue_exam_event(attempt, event_type, payload)
        .ok_or_else(|| Error::StoreUnavailable(ctx.db_path.display().to_string()))
}

fn parse_payload(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(Error::InvalidPayload(format!(
            "expected an object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(Error::InvalidPayload(e.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
