// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod args;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub use args::{DraftArgs, ServerArgs};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

const QUICKSTART_HELP: &str = "\
Get started:
  offsync draft <attempt> --task task1 --content \"...\"   Queue a draft
  offsync event <attempt> typing                         Queue an event
  offsync status                                         Show queued work
  offsync sync                                           Deliver queued work";

#[derive(Parser)]
#[command(name = "offsync")]
#[command(version)]
#[command(about = "Offline draft and event queue with server reconciliation")]
#[command(
    long_about = "Offline draft and event queue with server reconciliation.\n\n\
    Edits and interaction events are queued locally and delivered to the \
    server of record when it is reachable."
)]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    /// Data directory holding offsync.toml and the queue database
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Queue a writing draft snapshot for an attempt
    Draft(DraftArgs),

    /// Queue an interaction event for an attempt
    Event {
        /// Exam attempt id
        #[arg(value_parser = non_empty_string)]
        attempt: String,

        /// Event type: focus, blur, typing
        #[arg(value_name = "TYPE")]
        event_type: String,

        /// Event payload as a JSON object
        #[arg(long, short = 'p')]
        payload: Option<String>,
    },

    /// Show queued drafts and events
    Status {
        /// Output format
        #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Deliver queued work to the server now
    Sync(ServerArgs),
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
