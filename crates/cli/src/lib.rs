// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! offsync - Offline draft and event queue with server reconciliation.
//!
//! This crate provides the client side: a durable local queue of writing
//! drafts and interaction events, and an orchestrator that delivers them to
//! the server of record when it is reachable.
//!
//! # Main Components
//!
//! - [`LocalStore`] - SQLite-backed storage that degrades instead of failing
//! - [`OfflineQueue`] - Typed draft/event queue with per-attempt revisions
//! - [`sync`] - Orchestrator, transport, backoff and host signals
//! - [`Config`] - Client configuration (`offsync.toml`)
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use offsync::{LocalStore, OfflineQueue};
//! use offsync::sync::{HttpTransport, SyncOptions, SyncOrchestrator, SyncReason};
//!
//! let queue = OfflineQueue::new(Arc::new(LocalStore::new("queue.db")));
//! queue.queue_exam_event(attempt_id, EventType::Focus, None);
//!
//! let transport = HttpTransport::new("http://127.0.0.1:7890", None, None)?;
//! let orchestrator = SyncOrchestrator::new(queue, transport, SyncOptions::default());
//! orchestrator.sync_now(SyncReason::Manual).await;
//! ```

mod cli;
mod commands;

pub mod config;
pub mod env;
pub mod error;
pub mod queue;
pub mod store;
pub mod sync;

pub use cli::{Cli, Command, DraftArgs, OutputFormat, ServerArgs};
pub use config::Config;
pub use error::{Error, Result};
pub use queue::{OfflineQueue, PendingCounts};
pub use store::{LocalStore, StoreError, StoreResult};

/// Execute a CLI command. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub fn run(cli: Cli) -> Result<()> {
    let data_dir = cli.data_dir.as_deref();
    match cli.command {
        Command::Draft(args) => commands::draft::run(data_dir, &args),
        Command::Event {
            attempt,
            event_type,
            payload,
        } => commands::event::run(data_dir, &attempt, &event_type, payload.as_deref()),
        Command::Status { output } => commands::status::run(data_dir, output),
        Command::Sync(server) => commands::sync::run(data_dir, &server),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
