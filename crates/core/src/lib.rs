// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! offsync-core: Shared library for offline draft/event sync
//!
//! This crate provides the record types, wire protocol, and validation rules
//! shared by the `offsync` client and the `offsync-remote` reconciliation
//! server.

pub mod clock;
pub mod error;
pub mod protocol;
pub mod record;
pub mod validate;

pub use clock::{ClockSource, SystemClock};
pub use error::{Error, Result};
pub use protocol::{DraftEntry, EventEntry, SyncRequest, SyncResponse};
pub use record::{
    draft_id, DraftPayload, DraftRecord, EventRecord, EventType, NewEvent, RecordKind, TaskId,
    TaskSnapshot, SCHEMA_VERSION,
};
