// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use tracing::debug;

use super::{open_context, Context};
use crate::cli::ServerArgs;
use crate::error::{Error, Result};
use crate::sync::{CycleReport, HttpTransport, SyncOrchestrator, SyncOutcome, SyncReason, Transport};

pub fn run(data_dir: Option<&Path>, server: &ServerArgs) -> Result<()> {
    let ctx = open_context(data_dir)?;
    let server_url = server
        .server
        .clone()
        .unwrap_or_else(|| ctx.config.server_url.clone());
    let token = server.token.clone().or_else(|| ctx.config.auth_token.clone());
    let transport = HttpTransport::new(&server_url, token, ctx.config.request_timeout())?;
    debug!(endpoint = transport.endpoint(), "syncing");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(run_impl(&ctx, transport))?;

    if report.batches == 0 {
        println!("Nothing to sync.");
    } else {
        println!("{}", summary(&report));
    }
    Ok(())
}

/// Internal implementation that accepts a transport for testing.
///
/// Runs one manual cycle and disposes the orchestrator, so no retry timer
/// outlives the command.
pub(crate) async fn run_impl<T: Transport + 'static>(
    ctx: &Context,
    transport: T,
) -> Result<CycleReport> {
    let orchestrator = SyncOrchestrator::new(ctx.queue(), transport, ctx.config.sync_options());
    let outcome = orchestrator.sync_now(SyncReason::Manual).await;
    orchestrator.dispose();

    match outcome {
        SyncOutcome::Drained(report) => Ok(report),
        SyncOutcome::Coalesced => Ok(CycleReport::default()),
        SyncOutcome::Offline { .. } => Err(Error::SyncIncomplete("offline".to_string())),
        SyncOutcome::Failed { report, error, .. } => {
            let pending = ctx.queue().pending_counts();
            let mut message = error;
            if report.batches > 0 {
                message.push_str(&format!("; {}", summary(&report)));
            }
            message.push_str(&format!(
                "; {} drafts and {} events still queued",
                pending.drafts, pending.events
            ));
            Err(Error::SyncIncomplete(message))
        }
    }
}

pub(crate) fn summary(report: &CycleReport) -> String {
    let mut out = format!(
        "Synced {} drafts and {} events in {} batches",
        report.synced_drafts, report.synced_events, report.batches
    );
    if report.dropped_drafts > 0 {
        out.push_str(&format!(" (rejected: {} drafts)", report.dropped_drafts));
    }
    out
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
