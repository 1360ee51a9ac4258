// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! fieldsync-core: Shared types for the fieldsync offline sync engine
//!
//! This crate provides the field domain model, the queued-record sum type,
//! sync status types and the durable key-value storage used by the
//! `fieldsync` engine.

pub mod clock;
pub mod error;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
pub mod model;
pub mod record;
pub mod status;
pub mod store;

pub use clock::{system_clock, ClockSource, SharedClock, SystemClock};
pub use error::{Error, Result};
pub use model::{
    Attachment, BatchOutcome, BoundingBox, DocumentType, FieldReport, GpsLocation, OcrResult,
    Priority, ReportCategory, ReportStatus,
};
pub use record::{generate_offline_id, is_offline_id, Payload, QueuedRecord, RecordKind, OFFLINE_PREFIX};
pub use status::{SyncError, SyncErrorKind, SyncState, SyncStatus, DEFAULT_ERROR_LOG_LIMIT};
pub use store::{load_json, save_json, FileStore, KeyValueStore, MemoryStore};
