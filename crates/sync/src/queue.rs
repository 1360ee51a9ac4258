// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline queue for records created while disconnected.
//!
//! Holds one ordered sequence per [`RecordKind`] (insertion order is upload
//! order), each persisted under its own storage key and rewritten after every
//! mutation. Next to the queues live the id remap table (offline id → server
//! id) and the dead-letter list.
//!
//! The in-memory copy only changes after the storage write succeeded, so a
//! failed write leaves memory and disk in agreement. The remap table is the
//! exception: a server id is kept in memory even when its write fails, and
//! written again by [`OfflineQueue::flush_remap`].

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use fieldsync_core::{load_json, save_json, KeyValueStore, QueuedRecord, RecordKind, SharedClock};

use crate::error::{Error, Result};

/// Storage key of the offline id → server id table.
pub const REMAP_KEY: &str = "id_remap";
/// Storage key of the dead-letter list.
pub const DEAD_LETTER_KEY: &str = "dead_letter";

#[derive(Debug, Default)]
struct QueueState {
    reports: Vec<QueuedRecord>,
    locations: Vec<QueuedRecord>,
    ocr_results: Vec<QueuedRecord>,
    remap: BTreeMap<String, String>,
    remap_unsaved: bool,
    dead_letter: Vec<QueuedRecord>,
}

impl QueueState {
    fn records(&self, kind: RecordKind) -> &Vec<QueuedRecord> {
        match kind {
            RecordKind::Report => &self.reports,
            RecordKind::Location => &self.locations,
            RecordKind::OcrResult => &self.ocr_results,
        }
    }

    fn records_mut(&mut self, kind: RecordKind) -> &mut Vec<QueuedRecord> {
        match kind {
            RecordKind::Report => &mut self.reports,
            RecordKind::Location => &mut self.locations,
            RecordKind::OcrResult => &mut self.ocr_results,
        }
    }

    fn resolve(&self, id: &str) -> Option<&String> {
        self.remap.get(id)
    }
}

/// Durable, process-wide offline queue.
///
/// Shared behind an `Arc`; producers enqueue while the orchestrator drains a
/// snapshot.
pub struct OfflineQueue {
    store: Arc<dyn KeyValueStore>,
    clock: SharedClock,
    state: Mutex<QueueState>,
}

impl OfflineQueue {
    /// Loads the persisted queue. Missing keys start empty.
    pub fn open(store: Arc<dyn KeyValueStore>, clock: SharedClock) -> Result<Self> {
        let mut state = QueueState::default();
        for kind in RecordKind::ALL {
            let records: Vec<QueuedRecord> =
                load_json(store.as_ref(), kind.storage_key())?.unwrap_or_default();
            *state.records_mut(kind) = records;
        }
        state.remap = load_json(store.as_ref(), REMAP_KEY)?.unwrap_or_default();
        state.dead_letter = load_json(store.as_ref(), DEAD_LETTER_KEY)?.unwrap_or_default();

        tracing::debug!(
            reports = state.reports.len(),
            locations = state.locations.len(),
            ocr_results = state.ocr_results.len(),
            dead_letters = state.dead_letter.len(),
            "loaded offline queue"
        );

        Ok(OfflineQueue { store, clock, state: Mutex::new(state) })
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, kind: RecordKind, records: &[QueuedRecord]) -> Result<()> {
        save_json(self.store.as_ref(), kind.storage_key(), records)?;
        Ok(())
    }

    /// Enqueue a record for later upload.
    ///
    /// A record whose local id is already queued replaces it in place, so
    /// editing a report offline and saving again keeps a single entry. Ids
    /// already reconciled with the server are translated first: re-saving an
    /// offline report that has since been created becomes an update of the
    /// server copy.
    ///
    /// OCR results travel inside their report, so they must name an owner.
    ///
    /// Returns the local id the record is stored under.
    pub fn enqueue(&self, mut record: QueuedRecord) -> Result<String> {
        let kind = record.kind();
        if kind == RecordKind::OcrResult && record.owner_id.is_none() {
            return Err(Error::InvalidRecord(format!(
                "ocr result {} has no owning report",
                record.local_id
            )));
        }
        let mut state = self.lock();

        if let Some(remote) = state.resolve(&record.local_id).cloned() {
            tracing::debug!("{} already reconciled as {}, queuing update", record.local_id, remote);
            record.rekey(&remote);
        }
        if let Some(owner) = record.owner_id.as_ref().and_then(|o| state.resolve(o)).cloned() {
            record.owner_id = Some(owner);
        }
        record.queued_at = self.clock.now();

        let mut records = state.records(kind).clone();
        match records.iter().position(|r| r.local_id == record.local_id) {
            Some(index) => records[index] = record.clone(),
            None => records.push(record.clone()),
        }

        self.persist(kind, &records)?;
        *state.records_mut(kind) = records;

        tracing::debug!("queued {} {}", kind, record.local_id);
        Ok(record.local_id)
    }

    /// Snapshot of the queued records of one kind, in upload order.
    pub fn drainable(&self, kind: RecordKind) -> Vec<QueuedRecord> {
        self.lock().records(kind).clone()
    }

    /// Remove a record by local id. No-op if absent.
    pub fn remove(&self, kind: RecordKind, local_id: &str) -> Result<()> {
        let mut state = self.lock();
        if !state.records(kind).iter().any(|r| r.local_id == local_id) {
            return Ok(());
        }
        let records: Vec<QueuedRecord> =
            state.records(kind).iter().filter(|r| r.local_id != local_id).cloned().collect();
        self.persist(kind, &records)?;
        *state.records_mut(kind) = records;
        Ok(())
    }

    /// Atomically overwrite the queue of one kind.
    pub fn replace_all(&self, kind: RecordKind, records: Vec<QueuedRecord>) -> Result<()> {
        let mut state = self.lock();
        self.persist(kind, &records)?;
        *state.records_mut(kind) = records;
        Ok(())
    }

    /// Write the outcome of a drain pass back into the live queue.
    ///
    /// `snapshot` is what the pass read, `survivors` the records it failed to
    /// upload (with updated retry bookkeeping). Every snapshot record still
    /// queued with an unchanged payload is replaced by its survivor, or
    /// dropped when it has none. Records enqueued or edited while the pass ran
    /// are kept as they are.
    pub fn write_back(
        &self,
        kind: RecordKind,
        snapshot: &[QueuedRecord],
        survivors: Vec<QueuedRecord>,
    ) -> Result<()> {
        let mut state = self.lock();

        let read: HashMap<&str, &QueuedRecord> =
            snapshot.iter().map(|r| (r.local_id.as_str(), r)).collect();
        let mut survivors: HashMap<String, QueuedRecord> =
            survivors.into_iter().map(|r| (r.local_id.clone(), r)).collect();

        let merged: Vec<QueuedRecord> = state
            .records(kind)
            .iter()
            .filter_map(|current| match read.get(current.local_id.as_str()) {
                Some(seen) if seen.payload == current.payload => {
                    survivors.remove(&current.local_id).map(|mut survivor| {
                        survivor.owner_id = current.owner_id.clone();
                        survivor
                    })
                }
                _ => Some(current.clone()),
            })
            .collect();

        self.persist(kind, &merged)?;
        *state.records_mut(kind) = merged;
        Ok(())
    }

    /// Persist a reconciled id and repoint owner references to it.
    ///
    /// The server already holds the record, so the mapping stays in memory
    /// even if the write fails; otherwise the next pass would create it again.
    pub fn record_remap(&self, local_id: &str, remote_id: &str) -> Result<()> {
        let mut state = self.lock();

        state.remap.insert(local_id.to_string(), remote_id.to_string());
        if let Err(e) = save_json(self.store.as_ref(), REMAP_KEY, &state.remap) {
            state.remap_unsaved = true;
            return Err(e.into());
        }
        state.remap_unsaved = false;

        for kind in RecordKind::ALL {
            if !state.records(kind).iter().any(|r| r.owner_id.as_deref() == Some(local_id)) {
                continue;
            }
            let records: Vec<QueuedRecord> = state
                .records(kind)
                .iter()
                .cloned()
                .map(|mut r| {
                    if r.owner_id.as_deref() == Some(local_id) {
                        r.owner_id = Some(remote_id.to_string());
                    }
                    r
                })
                .collect();
            self.persist(kind, &records)?;
            *state.records_mut(kind) = records;
            tracing::debug!("repointed {} owner references {} -> {}", kind, local_id, remote_id);
        }

        Ok(())
    }

    /// Write remap entries whose earlier write failed. No-op when none are
    /// pending.
    pub fn flush_remap(&self) -> Result<()> {
        let mut state = self.lock();
        if !state.remap_unsaved {
            return Ok(());
        }
        save_json(self.store.as_ref(), REMAP_KEY, &state.remap)?;
        state.remap_unsaved = false;
        tracing::debug!("flushed {} remap entries", state.remap.len());
        Ok(())
    }

    /// Translate an id through the remap table; unknown ids map to themselves.
    pub fn resolve(&self, id: &str) -> String {
        self.lock().resolve(id).cloned().unwrap_or_else(|| id.to_string())
    }

    /// The server id an offline id was reconciled to, if any.
    pub fn remote_id_for(&self, local_id: &str) -> Option<String> {
        self.lock().resolve(local_id).cloned()
    }

    /// Park records that keep getting rejected.
    ///
    /// The records must also be left out of the survivors passed to
    /// [`write_back`](Self::write_back) so they leave the active queue.
    pub fn dead_letter(&self, records: Vec<QueuedRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let mut state = self.lock();
        let mut parked = state.dead_letter.clone();
        for record in records {
            match parked.iter().position(|r| r.local_id == record.local_id && r.kind() == record.kind()) {
                Some(index) => parked[index] = record,
                None => parked.push(record),
            }
        }
        save_json(self.store.as_ref(), DEAD_LETTER_KEY, &parked)?;
        state.dead_letter = parked;
        Ok(())
    }

    /// Records parked in the dead-letter list.
    pub fn dead_letters(&self) -> Vec<QueuedRecord> {
        self.lock().dead_letter.clone()
    }

    /// Move a dead letter back into its queue with fresh retry counters.
    ///
    /// The record is queued before it leaves the dead-letter list; if the
    /// second write fails it sits in both until the next requeue or discard.
    pub fn requeue_dead_letter(&self, local_id: &str) -> Result<()> {
        let mut record = self
            .lock()
            .dead_letter
            .iter()
            .find(|r| r.local_id == local_id)
            .cloned()
            .ok_or_else(|| Error::RecordNotFound(local_id.to_string()))?;
        record.reset_attempts();
        self.enqueue(record)?;
        self.take_dead_letter(local_id)?;
        Ok(())
    }

    /// Drop a dead letter for good.
    pub fn discard_dead_letter(&self, local_id: &str) -> Result<()> {
        let record = self.take_dead_letter(local_id)?;
        tracing::info!("discarded dead letter {} {}", record.kind(), record.local_id);
        Ok(())
    }

    fn take_dead_letter(&self, local_id: &str) -> Result<QueuedRecord> {
        let mut state = self.lock();
        let index = state
            .dead_letter
            .iter()
            .position(|r| r.local_id == local_id)
            .ok_or_else(|| Error::RecordNotFound(local_id.to_string()))?;
        let mut parked = state.dead_letter.clone();
        let record = parked.remove(index);
        save_json(self.store.as_ref(), DEAD_LETTER_KEY, &parked)?;
        state.dead_letter = parked;
        Ok(record)
    }

    /// Number of queued records of one kind.
    pub fn len(&self, kind: RecordKind) -> usize {
        self.lock().records(kind).len()
    }

    /// Sum of all three queue lengths.
    pub fn pending_count(&self) -> usize {
        let state = self.lock();
        RecordKind::ALL.iter().map(|k| state.records(*k).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pending_count() == 0
    }

    pub fn dead_letter_count(&self) -> usize {
        self.lock().dead_letter.len()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
