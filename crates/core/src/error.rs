// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for offsync-core operations.

use thiserror::Error;

/// All possible errors that can occur in offsync-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid record kind: '{0}'\n  hint: the only supported kind is: writing")]
    InvalidKind(String),

    #[error("invalid task: '{0}'\n  hint: valid tasks are: task1, task2")]
    InvalidTask(String),

    #[error("invalid event type: '{0}'\n  hint: valid types are: focus, blur, typing")]
    InvalidEventType(String),

    #[error("invalid batch: {}", issues.join("; "))]
    InvalidBatch { issues: Vec<String> },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for offsync-core operations.
pub type Result<T> = std::result::Result<T, Error>;
