// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::fixtures::fixed_time;
use yare::parameterized;

#[parameterized(
    idle = { SyncState::Idle },
    running = { SyncState::Running },
    with_errors = { SyncState::IdleWithErrors },
)]
fn state_atomic_encoding(state: SyncState) {
    assert_eq!(SyncState::from_u8(state.as_u8()), state);
}

#[test]
fn unknown_state_value_reads_idle() {
    assert_eq!(SyncState::from_u8(200), SyncState::Idle);
}

#[test]
fn sync_failed_entry_shape() {
    let at = fixed_time();
    let err = SyncError::sync_failed("session expired", at);
    assert!(err.id.starts_with(&format!("err_{}_", at.timestamp_millis())));
    assert_eq!(err.kind, SyncErrorKind::SyncFailed);
    assert_eq!(err.retry_count, 0);

    let value = serde_json::to_value(&err).unwrap();
    assert_eq!(value["type"], "sync_failed");
    assert_eq!(value["retryCount"], 0);
}

#[test]
fn entries_in_the_same_millisecond_get_distinct_ids() {
    let at = fixed_time();
    let first = SyncError::sync_failed("session expired", at);
    let second = SyncError::sync_failed("session expired", at);
    assert_ne!(first.id, second.id);
}

#[test]
fn record_rejected_entry_names_record() {
    let err = SyncError::record_rejected("offline_3", "title required", 3, fixed_time());
    assert_eq!(err.kind, SyncErrorKind::RecordRejected);
    assert!(err.message.contains("offline_3"));
    assert!(err.message.contains("title required"));
    assert_eq!(err.retry_count, 3);
}

#[test]
fn push_bounded_keeps_most_recent() {
    let mut log = Vec::new();
    for i in 0..60 {
        push_bounded(&mut log, SyncError::sync_failed(format!("e{i}"), fixed_time()), 50);
    }
    assert_eq!(log.len(), 50);
    assert_eq!(log[0].message, "e10");
    assert_eq!(log[49].message, "e59");
}

#[test]
fn default_status_is_idle_and_empty() {
    let status = SyncStatus::default();
    assert_eq!(status.state, SyncState::Idle);
    assert!(status.last_sync_at.is_none());
    assert_eq!(status.pending_uploads, 0);
    assert!(status.errors.is_empty());
}
