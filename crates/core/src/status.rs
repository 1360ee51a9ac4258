// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync status snapshot and the rolling error log.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of error entries retained by default.
pub const DEFAULT_ERROR_LOG_LIMIT: usize = 50;

/// Lifecycle state of the sync orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    #[default]
    Idle,
    Running,
    /// The last pass ended with a pass-level failure.
    IdleWithErrors,
}

impl SyncState {
    /// Encoding for atomic storage.
    pub fn as_u8(self) -> u8 {
        match self {
            SyncState::Idle => 0,
            SyncState::Running => 1,
            SyncState::IdleWithErrors => 2,
        }
    }

    /// Decodes an atomic value; unknown values read as `Idle`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => SyncState::Running,
            2 => SyncState::IdleWithErrors,
            _ => SyncState::Idle,
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Idle => write!(f, "idle"),
            SyncState::Running => write!(f, "running"),
            SyncState::IdleWithErrors => write!(f, "idle (with errors)"),
        }
    }
}

/// Category of an error log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncErrorKind {
    /// A whole pass was aborted.
    SyncFailed,
    /// A record was set aside after repeated validation rejections.
    RecordRejected,
}

/// One entry of the user-visible error log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncError {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SyncErrorKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub retry_count: u32,
}

impl SyncError {
    /// A pass-level failure entry.
    pub fn sync_failed(message: impl Into<String>, at: DateTime<Utc>) -> Self {
        SyncError {
            id: error_id(&at),
            kind: SyncErrorKind::SyncFailed,
            message: message.into(),
            timestamp: at,
            retry_count: 0,
        }
    }

    /// An entry for a record moved to the dead-letter list.
    pub fn record_rejected(
        local_id: &str,
        reason: &str,
        attempts: u32,
        at: DateTime<Utc>,
    ) -> Self {
        SyncError {
            id: format!("{}_{}", error_id(&at), local_id),
            kind: SyncErrorKind::RecordRejected,
            message: format!("{local_id} rejected by server: {reason}"),
            timestamp: at,
            retry_count: attempts,
        }
    }
}

static ERROR_SEQ: AtomicU64 = AtomicU64::new(0);

/// `err_{millis}_{seq}`; the per-process sequence keeps entries logged in the
/// same millisecond apart.
fn error_id(at: &DateTime<Utc>) -> String {
    let seq = ERROR_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("err_{}_{}", at.timestamp_millis(), seq)
}

/// Appends entries to an error log, keeping only the most recent `limit`.
pub fn push_bounded(log: &mut Vec<SyncError>, entry: SyncError, limit: usize) {
    log.push(entry);
    if log.len() > limit {
        let excess = log.len() - limit;
        log.drain(..excess);
    }
}

/// Point-in-time view of the sync subsystem.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub last_sync_at: Option<DateTime<Utc>>,
    /// Live sum of the three queue lengths.
    pub pending_uploads: usize,
    /// Always zero: nothing is pulled from the server.
    pub pending_downloads: usize,
    pub sync_in_progress: bool,
    pub state: SyncState,
    /// Records parked after repeated rejections.
    pub dead_letters: usize,
    pub errors: Vec<SyncError>,
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
