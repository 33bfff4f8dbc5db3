// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Host environment signals that drive the orchestrator.
//!
//! The host (browser shell, desktop wrapper, CLI) reports connectivity,
//! background wake-ups and shutdown through a [`SignalSource`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Tag the host uses to wake the orchestrator for a background sync.
pub const BACKGROUND_SYNC_TAG: &str = "offsync-draft-sync";

/// A notification from the host environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostSignal {
    /// Connectivity restored.
    Online,
    /// Connectivity lost.
    Offline,
    /// Host woke us for a background sync registered under `tag`.
    BackgroundWake { tag: String },
    /// Host is shutting down.
    Unloading,
}

/// Source of host signals.
pub trait SignalSource: Send + 'static {
    /// Waits for the next signal. `None` means the source is closed.
    fn next_signal(&mut self) -> Pin<Box<dyn Future<Output = Option<HostSignal>> + Send + '_>>;
}

impl SignalSource for mpsc::Receiver<HostSignal> {
    fn next_signal(&mut self) -> Pin<Box<dyn Future<Output = Option<HostSignal>> + Send + '_>> {
        Box::pin(self.recv())
    }
}

impl SignalSource for mpsc::UnboundedReceiver<HostSignal> {
    fn next_signal(&mut self) -> Pin<Box<dyn Future<Output = Option<HostSignal>> + Send + '_>> {
        Box::pin(self.recv())
    }
}

/// Why a sync cycle was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncReason {
    Manual,
    Startup,
    Online,
    BackgroundWake,
    Retry,
}

impl SyncReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncReason::Manual => "manual",
            SyncReason::Startup => "startup",
            SyncReason::Online => "online",
            SyncReason::BackgroundWake => "background",
            SyncReason::Retry => "retry",
        }
    }
}

impl fmt::Display for SyncReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by a host that cannot register a background sync.
#[derive(Debug, thiserror::Error)]
#[error("background sync registration failed: {0}")]
pub struct RegistrationError(pub String);

/// Host facility for waking the orchestrator when connectivity returns,
/// even if the editing surface is gone.
pub trait BackgroundSync: Send + Sync {
    fn register(&self, tag: &str) -> Result<(), RegistrationError>;
}

/// Registers [`BACKGROUND_SYNC_TAG`] with the host, if it supports it.
///
/// Never fails: an unsupported host or a rejected registration is logged
/// and reported as `false`.
pub fn register_background_sync(host: Option<&dyn BackgroundSync>) -> bool {
    let Some(host) = host else {
        debug!("background sync not supported by host");
        return false;
    };
    match host.register(BACKGROUND_SYNC_TAG) {
        Ok(()) => {
            debug!(tag = BACKGROUND_SYNC_TAG, "registered background sync");
            true
        }
        Err(e) => {
            warn!(error = %e, "background sync unavailable");
            false
        }
    }
}

#[cfg(test)]
#[path = "signals_tests.rs"]
mod tests;
