// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery of queued drafts and events to the reconciliation server.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Orchestrator │────►│  Transport  │────►│   Remote    │
//! │              │◄────│   (trait)   │◄────│   Server    │
//! └──────────────┘     └─────────────┘     └─────────────┘
//!     ▲       │
//!     │       ▼
//! ┌───────┐ ┌─────────────┐
//! │Signals│ │ OfflineQueue│  (drafts + events)
//! └───────┘ └─────────────┘
//! ```
//!
//! # Features
//!
//! - Single-flight cycles; concurrent requests coalesce
//! - Bounded batches, removing only what the server applied
//! - Capped exponential backoff between failed cycles
//! - Host signals for connectivity, background wake-ups and unload
//! - Injectable transport trait for testing

mod backoff;
mod orchestrator;
mod signals;
mod transport;

pub use backoff::{Backoff, INITIAL_BACKOFF, MAX_BACKOFF};
pub use orchestrator::{
    CycleReport, SyncOptions, SyncOrchestrator, SyncOutcome, SyncState, SyncStatus,
    MAX_DRAFTS_PER_BATCH, MAX_EVENTS_PER_BATCH,
};
pub use signals::{
    register_background_sync, BackgroundSync, HostSignal, RegistrationError, SignalSource,
    SyncReason, BACKGROUND_SYNC_TAG,
};
pub use transport::{HttpTransport, Transport, TransportError, TransportResult};
