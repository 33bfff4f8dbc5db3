// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! offsync-remote: reconciliation server for offline drafts and events.
//!
//! This server is the system of record. Clients post batches of queued
//! drafts and events, and the server reports which ones it applied.

mod auth;
mod error;
mod reconcile;
mod server;
mod state;

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::AppState;

/// offsync-remote: offline sync reconciliation server
#[derive(Parser, Debug)]
#[command(name = "offsync-remote")]
#[command(about = "Reconciliation server for offline drafts and events")]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "0.0.0.0:7890")]
    bind: SocketAddr,

    /// Directory for database storage
    #[arg(short, long, default_value = ".")]
    data: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Register a bearer token for a user before serving (TOKEN=USER)
    #[arg(long, value_name = "TOKEN=USER", value_parser = parse_pair)]
    session: Vec<(String, String)>,

    /// Register an exam attempt owned by a user before serving (ATTEMPT=USER)
    #[arg(long, value_name = "ATTEMPT=USER", value_parser = parse_pair)]
    attempt: Vec<(String, String)>,
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=USER, got '{s}'")),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting offsync-remote server");
    info!("  Bind address: {}", args.bind);
    info!("  Data directory: {}", args.data.display());

    let store = state::ServerState::open(&args.data)?;
    for (token, user) in &args.session {
        store.add_session(token, user).await?;
    }
    for (attempt, user) in &args.attempt {
        store.add_attempt(attempt, user).await?;
    }
    if !args.session.is_empty() || !args.attempt.is_empty() {
        info!(
            "  Registered {} sessions, {} attempts",
            args.session.len(),
            args.attempt.len()
        );
    }

    server::run(args.bind, AppState::new(store)).await?;

    Ok(())
}
