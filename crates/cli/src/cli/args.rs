// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Argument groups shared by subcommands.

use std::path::PathBuf;

use clap::Args;

use super::non_empty_string;

/// Arguments for `offsync draft`.
#[derive(Args, Clone, Debug)]
pub struct DraftArgs {
    /// Exam attempt id
    #[arg(value_parser = non_empty_string)]
    pub attempt: String,

    /// Writing task the content belongs to: task1, task2
    #[arg(long, short = 't', default_value = "task1")]
    pub task: String,

    /// Task content (read from stdin when omitted)
    #[arg(long, short = 'c', conflicts_with = "file")]
    pub content: Option<String>,

    /// Read task content from a file
    #[arg(long, short = 'f', value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Elapsed editing time in seconds
    #[arg(long)]
    pub elapsed: Option<f64>,

    /// Replace the queued snapshot instead of merging into it
    #[arg(long)]
    pub replace: bool,
}

/// Server overrides for `offsync sync`.
#[derive(Args, Clone, Debug, Default)]
pub struct ServerArgs {
    /// Server base URL (overrides offsync.toml)
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// Bearer token (overrides offsync.toml)
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,
}
