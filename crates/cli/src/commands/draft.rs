// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::fs;
use std::io::Read;
use std::path::Path;

use offsync_core::{DraftPayload, DraftRecord, TaskId, TaskSnapshot};

use super::{open_context, Context};
use crate::cli::DraftArgs;
use crate::error::{Error, Result};

pub fn run(data_dir: Option<&Path>, args: &DraftArgs) -> Result<()> {
    let content = read_content(args)?;
    let ctx = open_context(data_dir)?;
    let record = run_impl(&ctx, args, content)?;
    println!("Queued {} (revision {})", record.id, record.revision);
    Ok(())
}

/// Internal implementation that accepts a context for testing.
pub(crate) fn run_impl(ctx: &Context, args: &DraftArgs, content: String) -> Result<DraftRecord> {
    let task: TaskId = args.task.parse()?;
    if let Some(elapsed) = args.elapsed {
        if !elapsed.is_finite() || elapsed < 0.0 {
            return Err(Error::InvalidElapsed(elapsed));
        }
    }

    let mut payload = DraftPayload {
        active_task: Some(task),
        elapsed_seconds: args.elapsed,
        ..DraftPayload::default()
    };
    payload.tasks.insert(task, TaskSnapshot::from_content(content));

    let queue = ctx.queue();
    let record = if args.replace {
        queue.queue_writing_draft(&args.attempt, payload)
    } else {
        queue.merge_writing_draft(&args.attempt, payload)
    };
    record.ok_or_else(|| Error::StoreUnavailable(ctx.db_path.display().to_string()))
}

/// Content from `--content`, then `--file`, then stdin.
fn read_content(args: &DraftArgs) -> Result<String> {
    if let Some(content) = &args.content {
        return Ok(content.clone());
    }
    if let Some(path) = &args.file {
        return Ok(fs::read_to_string(path)?);
    }
    let mut content = String::new();
    std::io::stdin().read_to_string(&mut content)?;
    if content.trim().is_empty() {
        return Err(Error::MissingContent);
    }
    Ok(content.trim_end_matches('\n').to_string())
}

#[cfg(test)]
#[path = "draft_tests.rs"]
mod tests;
