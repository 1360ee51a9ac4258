// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The sync pass.
//!
//! [`SyncOrchestrator::drain`] uploads everything currently queued, one
//! phase per record kind:
//!
//! ```text
//!   guard ──► connectivity ──► Running
//!                                 │
//!        reports (create / update, one call per record)
//!                                 │
//!        locations (batches of `batch_size`)
//!                                 │
//!        ocr results (retired once uploaded inside their report)
//!                                 │
//!                  Idle  or  IdleWithErrors
//! ```
//!
//! A failing record never stops its phase. An auth rejection or a storage
//! failure ends the whole pass after the progress made so far is persisted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fieldsync_core::{
    FieldReport, GpsLocation, Payload, QueuedRecord, RecordKind, SharedClock, SyncState,
};

use crate::config::SyncConfig;
use crate::connectivity::ConnectivityMonitor;
use crate::error::{Error, Result};
use crate::gateway::{GatewayError, RemoteGateway};
use crate::publisher::StatusPublisher;
use crate::queue::OfflineQueue;

/// Why a drain did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another pass holds the in-flight flag.
    AlreadyRunning,
    /// The connectivity monitor reported no network.
    Offline,
}

/// Counters for one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub reports_created: usize,
    pub reports_updated: usize,
    pub reports_failed: usize,
    pub location_batches_sent: usize,
    pub location_batches_failed: usize,
    pub locations_synced: usize,
    pub ocr_results_retired: usize,
    pub dead_lettered: usize,
}

/// Result of [`SyncOrchestrator::drain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    Skipped(SkipReason),
    /// Every phase ran. Individual records may still have failed.
    Completed(PassReport),
    /// The pass was aborted; `error` is the message logged as `sync_failed`.
    Failed { report: PassReport, error: String },
}

impl DrainOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, DrainOutcome::Skipped(_))
    }

    pub fn report(&self) -> Option<&PassReport> {
        match self {
            DrainOutcome::Skipped(_) => None,
            DrainOutcome::Completed(report) | DrainOutcome::Failed { report, .. } => Some(report),
        }
    }
}

/// Clears the in-flight flag when the pass ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

enum Uploaded {
    Created(String),
    Updated,
}

/// Drives drain passes against a [`RemoteGateway`].
pub struct SyncOrchestrator<G> {
    gateway: G,
    queue: Arc<OfflineQueue>,
    publisher: Arc<StatusPublisher>,
    connectivity: Arc<ConnectivityMonitor>,
    clock: SharedClock,
    batch_size: usize,
    max_validation_attempts: u32,
    in_flight: AtomicBool,
}

impl<G: RemoteGateway> SyncOrchestrator<G> {
    pub fn new(
        gateway: G,
        queue: Arc<OfflineQueue>,
        publisher: Arc<StatusPublisher>,
        connectivity: Arc<ConnectivityMonitor>,
        clock: SharedClock,
        config: &SyncConfig,
    ) -> Self {
        SyncOrchestrator {
            gateway,
            queue,
            publisher,
            connectivity,
            clock,
            batch_size: config.batch_size.max(1),
            max_validation_attempts: config.max_validation_attempts.max(1),
            in_flight: AtomicBool::new(false),
        }
    }

    /// True while a pass holds the in-flight flag.
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Runs one pass over everything queued.
    ///
    /// Returns immediately, without network calls or status changes, if a
    /// pass is already running or the device is offline.
    pub async fn drain(&self) -> DrainOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("sync already in progress, skipping");
            return DrainOutcome::Skipped(SkipReason::AlreadyRunning);
        }
        let _in_flight = InFlight(&self.in_flight);

        if !self.connectivity.current_state().await.connected {
            tracing::debug!("offline, skipping sync");
            return DrainOutcome::Skipped(SkipReason::Offline);
        }

        self.publisher.set_state(SyncState::Running);
        self.publisher.notify();
        tracing::info!(pending = self.queue.pending_count(), "sync pass started");

        let mut report = PassReport::default();
        let mut rejected = Vec::new();
        let result = match self.run_phases(&mut report, &mut rejected).await {
            Ok(()) => self.publisher.record_success(self.clock.now()),
            Err(e) => Err(e),
        };

        if let Err(e) = self.publisher.record_rejections(&rejected) {
            tracing::error!("failed to log rejected records: {}", e);
        }

        let outcome = match result {
            Ok(()) => {
                self.publisher.set_state(SyncState::Idle);
                tracing::info!(
                    created = report.reports_created,
                    updated = report.reports_updated,
                    failed = report.reports_failed,
                    locations = report.locations_synced,
                    dead_lettered = report.dead_lettered,
                    "sync pass completed"
                );
                DrainOutcome::Completed(report)
            }
            Err(e) => {
                let error = e.to_string();
                tracing::error!("sync pass aborted: {}", error);
                if let Err(log_err) = self.publisher.record_failure(&error) {
                    tracing::error!("failed to record sync failure: {}", log_err);
                }
                self.publisher.set_state(SyncState::IdleWithErrors);
                DrainOutcome::Failed { report, error }
            }
        };

        self.publisher.notify();
        outcome
    }

    async fn run_phases(
        &self,
        report: &mut PassReport,
        rejected: &mut Vec<QueuedRecord>,
    ) -> Result<()> {
        let mut delivered = Vec::new();
        let uploaded = match self.sync_reports(report, rejected, &mut delivered).await {
            Ok(()) => self.sync_locations(report, rejected).await,
            Err(e) => Err(e),
        };
        // OCR results already on the server are retired even when the pass aborts.
        let retired = self.retire_ocr_results(&delivered, report);
        match (uploaded, retired) {
            (Err(e), retired) => {
                if let Err(retire_err) = retired {
                    tracing::error!("failed to retire delivered ocr results: {}", retire_err);
                }
                Err(e)
            }
            (Ok(()), retired) => retired,
        }
    }

    async fn sync_reports(
        &self,
        pass: &mut PassReport,
        rejected: &mut Vec<QueuedRecord>,
        delivered: &mut Vec<QueuedRecord>,
    ) -> Result<()> {
        self.queue.flush_remap()?;
        let snapshot = self.queue.drainable(RecordKind::Report);
        if snapshot.is_empty() {
            return Ok(());
        }
        let ocr = self.queue.drainable(RecordKind::OcrResult);

        let mut survivors = Vec::new();
        let mut dead = Vec::new();
        let mut abort = None;

        for (index, record) in snapshot.iter().enumerate() {
            let Payload::Report(report) = &record.payload else {
                tracing::warn!("non-report payload {} in report queue, dropping", record.local_id);
                continue;
            };
            let (outbound, embedded) = embed_ocr_results(report, &record.local_id, &ocr);

            match self.upload_report(record, outbound).await {
                Ok(Uploaded::Created(remote_id)) => {
                    pass.reports_created += 1;
                    delivered.extend(embedded);
                    tracing::info!("created report {} as {}", record.local_id, remote_id);
                    if let Err(e) = self.queue.record_remap(&record.local_id, &remote_id) {
                        // Keep the server id on the record so a replay updates it.
                        let mut created = record.clone();
                        created.remote_id = Some(remote_id);
                        survivors.push(created);
                        survivors.extend(snapshot[index + 1..].iter().cloned());
                        abort = Some(e);
                        break;
                    }
                }
                Ok(Uploaded::Updated) => {
                    pass.reports_updated += 1;
                    delivered.extend(embedded);
                    tracing::info!("updated report {}", record.local_id);
                }
                Err(e) if e.is_fatal() => {
                    abort = Some(Error::Auth(e.to_string()));
                    survivors.extend(snapshot[index..].iter().cloned());
                    break;
                }
                Err(e) => {
                    pass.reports_failed += 1;
                    let failed = self.note_failure(record, &e);
                    if self.should_dead_letter(&failed, &e) {
                        dead.push(failed);
                    } else {
                        survivors.push(failed);
                    }
                }
            }
        }

        self.finish_phase(RecordKind::Report, &snapshot, survivors, dead, pass, rejected, abort)
    }

    async fn upload_report(
        &self,
        record: &QueuedRecord,
        mut outbound: FieldReport,
    ) -> std::result::Result<Uploaded, GatewayError> {
        let remote = match &record.remote_id {
            Some(remote_id) => Some(remote_id.clone()),
            None => self.queue.remote_id_for(&record.local_id),
        };
        match remote {
            None if record.is_offline_created() => {
                self.gateway.create_report(&outbound).await.map(Uploaded::Created)
            }
            remote => {
                let target = remote.unwrap_or_else(|| record.local_id.clone());
                outbound.id = target.clone();
                self.gateway.update_report(&target, &outbound).await.map(|_| Uploaded::Updated)
            }
        }
    }

    async fn sync_locations(
        &self,
        pass: &mut PassReport,
        rejected: &mut Vec<QueuedRecord>,
    ) -> Result<()> {
        let snapshot = self.queue.drainable(RecordKind::Location);
        if snapshot.is_empty() {
            return Ok(());
        }

        let mut survivors = Vec::new();
        let mut dead = Vec::new();
        let mut abort = None;

        for (number, batch) in snapshot.chunks(self.batch_size).enumerate() {
            let locations: Vec<GpsLocation> = batch
                .iter()
                .filter_map(|r| match &r.payload {
                    Payload::Location(location) => Some(location.clone()),
                    _ => None,
                })
                .collect();

            match self.gateway.batch_create_locations(&locations).await {
                Ok(outcome) => {
                    pass.location_batches_sent += 1;
                    pass.locations_synced += batch.len();
                    if outcome.failed > 0 {
                        tracing::warn!(
                            "location batch {} accepted with {} of {} items failed server-side",
                            number,
                            outcome.failed,
                            batch.len()
                        );
                    }
                }
                Err(e) if e.is_fatal() => {
                    abort = Some(Error::Auth(e.to_string()));
                    survivors.extend(snapshot[number * self.batch_size..].iter().cloned());
                    break;
                }
                Err(e) => {
                    pass.location_batches_failed += 1;
                    tracing::warn!("location batch {} ({} items) failed: {}", number, batch.len(), e);
                    for record in batch {
                        let mut failed = record.clone();
                        failed.mark_failed(e.to_string());
                        if self.should_dead_letter(&failed, &e) {
                            dead.push(failed);
                        } else {
                            survivors.push(failed);
                        }
                    }
                }
            }
        }

        self.finish_phase(RecordKind::Location, &snapshot, survivors, dead, pass, rejected, abort)
    }

    /// OCR results reach the server inside their report. `delivered` holds
    /// the versions embedded in reports the server accepted this pass; only
    /// those leave the queue. Results edited or captured meanwhile stay until
    /// their report is uploaded again.
    fn retire_ocr_results(&self, delivered: &[QueuedRecord], pass: &mut PassReport) -> Result<()> {
        if delivered.is_empty() {
            return Ok(());
        }
        let before = self.queue.len(RecordKind::OcrResult);
        self.queue.write_back(RecordKind::OcrResult, delivered, Vec::new())?;
        let waiting = self.queue.len(RecordKind::OcrResult);
        pass.ocr_results_retired += before.saturating_sub(waiting);
        tracing::debug!(retired = before.saturating_sub(waiting), waiting, "ocr phase");
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn finish_phase(
        &self,
        kind: RecordKind,
        snapshot: &[QueuedRecord],
        mut survivors: Vec<QueuedRecord>,
        dead: Vec<QueuedRecord>,
        pass: &mut PassReport,
        rejected: &mut Vec<QueuedRecord>,
        abort: Option<Error>,
    ) -> Result<()> {
        let mut failure = abort;

        if !dead.is_empty() {
            for record in &dead {
                tracing::warn!(
                    "{} {} rejected {} times, moving to dead letters",
                    kind,
                    record.local_id,
                    record.attempt_count
                );
            }
            match self.queue.dead_letter(dead.clone()) {
                Ok(()) => {
                    pass.dead_lettered += dead.len();
                    rejected.extend(dead);
                }
                Err(e) => {
                    survivors.extend(dead);
                    failure.get_or_insert(e);
                }
            }
        }

        let written = self.queue.write_back(kind, snapshot, survivors);
        match failure {
            Some(e) => {
                if let Err(write_err) = written {
                    tracing::error!("failed to persist partial {} progress: {}", kind, write_err);
                }
                Err(e)
            }
            None => written,
        }
    }

    fn note_failure(&self, record: &QueuedRecord, error: &GatewayError) -> QueuedRecord {
        let mut failed = record.clone();
        failed.mark_failed(error.to_string());
        tracing::warn!(
            "{} {} failed (attempt {}): {}",
            failed.kind(),
            failed.local_id,
            failed.attempt_count,
            error
        );
        failed
    }

    fn should_dead_letter(&self, record: &QueuedRecord, error: &GatewayError) -> bool {
        error.is_validation() && record.attempt_count >= self.max_validation_attempts
    }
}

/// The report as uploaded: queued OCR results owned by it are appended to
/// its `ocr_results` unless already present. Also returns the queued OCR
/// records the upload carries.
fn embed_ocr_results(
    report: &FieldReport,
    local_id: &str,
    ocr: &[QueuedRecord],
) -> (FieldReport, Vec<QueuedRecord>) {
    let mut outbound = report.clone();
    let mut embedded = Vec::new();
    for record in ocr.iter().filter(|r| r.owner_id.as_deref() == Some(local_id)) {
        if let Payload::OcrResult(result) = &record.payload {
            if !outbound.ocr_results.iter().any(|existing| existing.id == result.id) {
                outbound.ocr_results.push(result.clone());
            }
            embedded.push(record.clone());
        }
    }
    (outbound, embedded)
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
