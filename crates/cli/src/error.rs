// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::sync::TransportError;

/// All possible errors surfaced by the `offsync` command line.
///
/// The queue and orchestrator never return these: storage failures degrade
/// and sync failures are retried. Only the user-facing layer fails.
#[derive(Debug, Error)]
pub enum Error {
    #[error("local store unavailable at {0}\n  hint: check the directory is writable and was not upgraded by a newer offsync")]
    StoreUnavailable(String),

    #[error("content is required\n  hint: pass --content or pipe the text on stdin")]
    MissingContent,

    #[error("invalid event payload: {0}\n  hint: the payload must be a JSON object, e.g. '{{\"key\":\"a\"}}'")]
    InvalidPayload(String),

    #[error("invalid elapsed seconds: {0}\n  hint: elapsed time must be a non-negative number")]
    InvalidElapsed(f64),

    #[error("sync incomplete: {0}")]
    SyncIncomplete(String),

    #[error(transparent)]
    Core(#[from] offsync_core::Error),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

/// A specialized Result type for offsync operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
