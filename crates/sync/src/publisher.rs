// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync status snapshots and their subscribers.
//!
//! The publisher owns the persisted part of the status (last successful
//! sync and the error log) and derives the rest from the live queue on
//! every read.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use fieldsync_core::status::push_bounded;
use fieldsync_core::{
    load_json, save_json, KeyValueStore, QueuedRecord, SharedClock, SyncError, SyncState,
    SyncStatus,
};

use crate::error::Result;
use crate::observer::{Observers, Subscription};
use crate::queue::OfflineQueue;

/// Storage key of the last successful sync timestamp.
pub const LAST_SYNC_KEY: &str = "last_sync_timestamp";
/// Storage key of the error log.
pub const ERRORS_KEY: &str = "sync_errors";

#[derive(Debug, Default)]
struct Persisted {
    last_sync_at: Option<DateTime<Utc>>,
    errors: Vec<SyncError>,
}

/// Builds [`SyncStatus`] snapshots and notifies subscribers.
pub struct StatusPublisher {
    queue: Arc<OfflineQueue>,
    store: Arc<dyn KeyValueStore>,
    clock: SharedClock,
    max_errors: usize,
    state: AtomicU8,
    persisted: Mutex<Persisted>,
    observers: Observers<SyncStatus>,
}

impl StatusPublisher {
    /// Loads the persisted status fields. The state always starts `Idle`.
    pub fn open(
        queue: Arc<OfflineQueue>,
        store: Arc<dyn KeyValueStore>,
        clock: SharedClock,
        max_errors: usize,
    ) -> Result<Self> {
        let persisted = Persisted {
            last_sync_at: load_json(store.as_ref(), LAST_SYNC_KEY)?,
            errors: load_json(store.as_ref(), ERRORS_KEY)?.unwrap_or_default(),
        };
        Ok(StatusPublisher {
            queue,
            store,
            clock,
            max_errors,
            state: AtomicU8::new(SyncState::Idle.as_u8()),
            persisted: Mutex::new(persisted),
            observers: Observers::new(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Persisted> {
        self.persisted.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> SyncState {
        SyncState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn set_state(&self, state: SyncState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    /// Current snapshot; `pending_uploads` is recomputed from the queue.
    pub fn status(&self) -> SyncStatus {
        let state = self.state();
        let persisted = self.lock();
        SyncStatus {
            last_sync_at: persisted.last_sync_at,
            pending_uploads: self.queue.pending_count(),
            pending_downloads: 0,
            sync_in_progress: state == SyncState::Running,
            state,
            dead_letters: self.queue.dead_letter_count(),
            errors: persisted.errors.clone(),
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&SyncStatus) + Send + Sync + 'static,
    {
        self.observers.subscribe(callback)
    }

    /// Sends a fresh snapshot to every subscriber, in subscription order.
    pub fn notify(&self) {
        let status = self.status();
        self.observers.notify(&status);
    }

    /// A pass completed: stamp `at` and clear the error log.
    pub fn record_success(&self, at: DateTime<Utc>) -> Result<()> {
        let mut persisted = self.lock();
        save_json(self.store.as_ref(), LAST_SYNC_KEY, &at)?;
        persisted.last_sync_at = Some(at);
        save_json(self.store.as_ref(), ERRORS_KEY, &Vec::<SyncError>::new())?;
        persisted.errors.clear();
        Ok(())
    }

    /// A pass was aborted: append a `sync_failed` entry.
    pub fn record_failure(&self, message: &str) -> Result<()> {
        let entry = SyncError::sync_failed(message, self.clock.now());
        self.append(vec![entry])
    }

    /// Records were dead-lettered: append one `record_rejected` entry each.
    pub fn record_rejections(&self, records: &[QueuedRecord]) -> Result<()> {
        let at = self.clock.now();
        let entries = records
            .iter()
            .map(|r| {
                let reason = r.last_error.as_deref().unwrap_or("rejected");
                SyncError::record_rejected(&r.local_id, reason, r.attempt_count, at)
            })
            .collect();
        self.append(entries)
    }

    fn append(&self, entries: Vec<SyncError>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut persisted = self.lock();
        let mut errors = persisted.errors.clone();
        for entry in entries {
            push_bounded(&mut errors, entry, self.max_errors);
        }
        save_json(self.store.as_ref(), ERRORS_KEY, &errors)?;
        persisted.errors = errors;
        Ok(())
    }
}

#[cfg(test)]
#[path = "publisher_tests.rs"]
mod tests;
