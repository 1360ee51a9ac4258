// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The host-facing sync service.
//!
//! [`SyncService`] owns the queue, the status publisher, the connectivity
//! monitor and the orchestrator, and runs the automatic triggers: a
//! recurring timer and the offline → online transition.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use fieldsync_core::{
    generate_offline_id, FieldReport, FileStore, GpsLocation, KeyValueStore, OcrResult,
    QueuedRecord, SharedClock, SyncStatus,
};
use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::SyncConfig;
use crate::connectivity::{ConnectivityMonitor, HttpProbe, ReachabilityProbe};
use crate::error::{Error, Result};
use crate::gateway::{CredentialSource, HttpGateway, RemoteGateway};
use crate::observer::Subscription;
use crate::orchestrator::{DrainOutcome, SyncOrchestrator};
use crate::publisher::StatusPublisher;
use crate::queue::OfflineQueue;

struct AutoSync {
    cancel: CancellationToken,
    _reconnect: Subscription,
}

/// Offline queue plus background synchronization.
pub struct SyncService<G> {
    config: SyncConfig,
    clock: SharedClock,
    queue: Arc<OfflineQueue>,
    publisher: Arc<StatusPublisher>,
    connectivity: Arc<ConnectivityMonitor>,
    orchestrator: Arc<SyncOrchestrator<G>>,
    auto_sync: Mutex<Option<AutoSync>>,
}

impl SyncService<HttpGateway> {
    /// Production wiring: file store under the configured state directory,
    /// HTTP gateway and HTTP reachability probe.
    pub fn open(
        config: SyncConfig,
        credentials: Arc<dyn CredentialSource>,
        clock: SharedClock,
    ) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(FileStore::open(&config.resolved_state_dir())?);
        let gateway = HttpGateway::new(&config, credentials)?;
        let probe = Arc::new(HttpProbe::new(config.health_url(), config.probe_timeout())?);
        Self::new(config, store, gateway, probe, clock)
    }
}

impl<G: RemoteGateway + 'static> SyncService<G> {
    /// Loads persisted state from `store` and wires the components.
    pub fn new(
        config: SyncConfig,
        store: Arc<dyn KeyValueStore>,
        gateway: G,
        probe: Arc<dyn ReachabilityProbe>,
        clock: SharedClock,
    ) -> Result<Self> {
        let queue = Arc::new(OfflineQueue::open(Arc::clone(&store), clock.clone())?);
        let publisher = Arc::new(StatusPublisher::open(
            Arc::clone(&queue),
            store,
            clock.clone(),
            config.max_error_log,
        )?);
        let connectivity = Arc::new(ConnectivityMonitor::new(probe, config.probe_timeout()));
        let orchestrator = Arc::new(SyncOrchestrator::new(
            gateway,
            Arc::clone(&queue),
            Arc::clone(&publisher),
            Arc::clone(&connectivity),
            clock.clone(),
            &config,
        ));

        Ok(SyncService {
            config,
            clock,
            queue,
            publisher,
            connectivity,
            orchestrator,
            auto_sync: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The connectivity monitor, for platform glue feeding reachability
    /// events through [`ConnectivityMonitor::report`].
    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.connectivity
    }

    /// Queue a report. Returns the id it is queued under, which is the
    /// server id when the report was already reconciled.
    pub fn enqueue_report(&self, report: FieldReport) -> Result<String> {
        self.enqueue(QueuedRecord::new(report, self.clock.now()))
    }

    pub fn enqueue_location(&self, location: GpsLocation) -> Result<String> {
        self.enqueue(QueuedRecord::new(location, self.clock.now()))
    }

    /// Queue an OCR result captured for report `owner`. It is uploaded inside
    /// that report and stays queued until the report is next sent.
    pub fn enqueue_ocr_result(&self, ocr: OcrResult, owner: &str) -> Result<String> {
        self.enqueue(QueuedRecord::new(ocr, self.clock.now()).with_owner(owner))
    }

    fn enqueue(&self, record: QueuedRecord) -> Result<String> {
        let id = self.queue.enqueue(record)?;
        self.publisher.notify();
        Ok(id)
    }

    /// A fresh id for a report created offline.
    pub fn new_offline_report_id(&self, seed: &str) -> String {
        generate_offline_id(seed, &self.clock.now())
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.publisher.status()
    }

    pub fn subscribe_sync_status<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&SyncStatus) + Send + Sync + 'static,
    {
        self.publisher.subscribe(callback)
    }

    /// Runs a pass now (e.g. pull-to-refresh).
    pub async fn trigger_sync(&self) -> DrainOutcome {
        self.orchestrator.drain().await
    }

    fn auto_sync_slot(&self) -> MutexGuard<'_, Option<AutoSync>> {
        self.auto_sync.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_auto_syncing(&self) -> bool {
        self.auto_sync_slot().is_some()
    }

    /// Drains every `interval` and whenever connectivity comes back.
    ///
    /// Must be called from within a tokio runtime. Calling it again while
    /// running is a no-op.
    pub fn start_auto_sync(&self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(Error::Config("auto-sync interval must be greater than zero".to_string()));
        }
        let handle = Handle::try_current().map_err(|e| Error::Runtime(e.to_string()))?;
        let mut slot = self.auto_sync_slot();
        if slot.is_some() {
            tracing::debug!("auto-sync already running");
            return Ok(());
        }

        let cancel = CancellationToken::new();

        let orchestrator = Arc::clone(&self.orchestrator);
        let token = cancel.clone();
        handle.spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        orchestrator.drain().await;
                    }
                }
            }
            tracing::debug!("auto-sync timer stopped");
        });

        let orchestrator = Arc::clone(&self.orchestrator);
        let token = cancel.clone();
        let reconnect = self.connectivity.subscribe(move |state| {
            if !state.connected || token.is_cancelled() {
                return;
            }
            tracing::info!("back online, starting sync");
            let orchestrator = Arc::clone(&orchestrator);
            handle.spawn(async move {
                orchestrator.drain().await;
            });
        });

        tracing::info!("auto-sync started (every {:?})", interval);
        *slot = Some(AutoSync { cancel, _reconnect: reconnect });
        Ok(())
    }

    /// Stops both automatic triggers. A pass already running completes.
    pub fn stop_auto_sync(&self) {
        if let Some(auto_sync) = self.auto_sync_slot().take() {
            auto_sync.cancel.cancel();
            tracing::info!("auto-sync stopped");
        }
    }

    pub fn dead_letters(&self) -> Vec<QueuedRecord> {
        self.queue.dead_letters()
    }

    /// Moves a dead letter back into its queue with fresh retry counters.
    pub fn requeue_dead_letter(&self, local_id: &str) -> Result<()> {
        self.queue.requeue_dead_letter(local_id)?;
        self.publisher.notify();
        Ok(())
    }

    pub fn discard_dead_letter(&self, local_id: &str) -> Result<()> {
        self.queue.discard_dead_letter(local_id)?;
        self.publisher.notify();
        Ok(())
    }
}

impl<G> Drop for SyncService<G> {
    fn drop(&mut self) {
        if let Some(auto_sync) = self.auto_sync.lock().unwrap_or_else(|e| e.into_inner()).take() {
            auto_sync.cancel.cancel();
        }
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
