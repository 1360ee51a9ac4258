// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fakes for unit tests.

#![allow(clippy::unwrap_used)]
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fieldsync_core::{
    BatchOutcome, ClockSource, FieldReport, GpsLocation, KeyValueStore, MemoryStore, SharedClock,
};
use tokio::sync::Notify;

use crate::config::SyncConfig;
use crate::connectivity::{ConnectivityMonitor, ManualProbe};
use crate::gateway::{GatewayError, GatewayFuture, RemoteGateway};
use crate::orchestrator::SyncOrchestrator;
use crate::publisher::StatusPublisher;
use crate::queue::OfflineQueue;

/// Clock pinned to a settable instant.
pub struct FixedClock {
    now_ms: AtomicI64,
}

impl FixedClock {
    pub fn new(now_ms: i64) -> Arc<Self> {
        Arc::new(FixedClock { now_ms: AtomicI64::new(now_ms) })
    }

    pub fn advance(&self, ms: i64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl ClockSource for FixedClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

pub const START_MS: i64 = 1_773_480_600_000;

/// In-memory store whose writes can be made to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
    failing_key: Mutex<Option<String>>,
}

impl FlakyStore {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Fail writes to `key` only; `None` heals it.
    pub fn fail_key(&self, key: Option<&str>) {
        *self.failing_key.lock().unwrap() = key.map(str::to_string);
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> fieldsync_core::Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> fieldsync_core::Result<()> {
        let key_fails = self.failing_key.lock().unwrap().as_deref() == Some(key);
        if key_fails || self.fail_writes.load(Ordering::SeqCst) {
            return Err(fieldsync_core::Error::storage(key, "disk full"));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> fieldsync_core::Result<()> {
        self.inner.remove(key)
    }
}

/// A gateway call as observed by [`FakeGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Create(String),
    Update(String),
    Batch(Vec<String>),
}

/// Pauses gateway calls until released.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    release: Notify,
}

impl Gate {
    pub fn open(&self) {
        self.release.notify_one();
    }
}

#[derive(Default)]
struct FakeState {
    calls: Vec<GatewayCall>,
    sent_reports: Vec<FieldReport>,
    report_failures: HashMap<String, GatewayError>,
    remote_ids: HashMap<String, String>,
    batch_script: VecDeque<Option<GatewayError>>,
    batch_server_failures: u32,
    gate: Option<Arc<Gate>>,
}

/// Scriptable in-memory [`RemoteGateway`]. Succeeds unless told otherwise;
/// created reports get the id `srv_<local id>`.
#[derive(Clone, Default)]
pub struct FakeGateway {
    state: Arc<Mutex<FakeState>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every create/update of report `id` fails with `error`.
    pub fn fail_report(&self, id: &str, error: GatewayError) {
        self.state.lock().unwrap().report_failures.insert(id.to_string(), error);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock().unwrap();
        state.report_failures.clear();
        state.batch_script.clear();
    }

    /// Server id returned when report `local_id` is created.
    pub fn assign_remote_id(&self, local_id: &str, remote_id: &str) {
        self.state.lock().unwrap().remote_ids.insert(local_id.to_string(), remote_id.to_string());
    }

    /// Outcomes of the next batch calls, in order; `None` succeeds.
    pub fn script_batches(&self, script: Vec<Option<GatewayError>>) {
        self.state.lock().unwrap().batch_script = script.into();
    }

    /// Successful batch replies report this many items failed.
    pub fn batch_server_failures(&self, failed: u32) {
        self.state.lock().unwrap().batch_server_failures = failed;
    }

    /// Installs a gate every call waits on until [`Gate::open`].
    pub fn hold(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.state.lock().unwrap().gate = Some(Arc::clone(&gate));
        gate
    }

    pub fn release(&self) {
        if let Some(gate) = self.state.lock().unwrap().gate.take() {
            gate.open();
        }
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Report payloads as uploaded, in call order.
    pub fn sent_reports(&self) -> Vec<FieldReport> {
        self.state.lock().unwrap().sent_reports.clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GatewayCall::Batch(ids) => Some(ids.len()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: GatewayCall, report: Option<&FieldReport>) -> Option<Arc<Gate>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if let Some(report) = report {
            state.sent_reports.push(report.clone());
        }
        state.gate.clone()
    }

    async fn pass_gate(gate: Option<Arc<Gate>>) {
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
    }
}

impl RemoteGateway for FakeGateway {
    fn create_report<'a>(&'a self, report: &'a FieldReport) -> GatewayFuture<'a, String> {
        Box::pin(async move {
            let gate = self.record(GatewayCall::Create(report.id.clone()), Some(report));
            Self::pass_gate(gate).await;
            let state = self.state.lock().unwrap();
            if let Some(error) = state.report_failures.get(&report.id) {
                return Err(error.clone());
            }
            Ok(state.remote_ids.get(&report.id).cloned().unwrap_or_else(|| format!("srv_{}", report.id)))
        })
    }

    fn update_report<'a>(
        &'a self,
        remote_id: &'a str,
        report: &'a FieldReport,
    ) -> GatewayFuture<'a, FieldReport> {
        Box::pin(async move {
            let gate = self.record(GatewayCall::Update(remote_id.to_string()), Some(report));
            Self::pass_gate(gate).await;
            let state = self.state.lock().unwrap();
            if let Some(error) = state.report_failures.get(remote_id) {
                return Err(error.clone());
            }
            let mut updated = report.clone();
            updated.id = remote_id.to_string();
            Ok(updated)
        })
    }

    fn batch_create_locations<'a>(
        &'a self,
        locations: &'a [GpsLocation],
    ) -> GatewayFuture<'a, BatchOutcome> {
        Box::pin(async move {
            let ids = locations.iter().map(|l| l.id.clone()).collect();
            let gate = self.record(GatewayCall::Batch(ids), None);
            Self::pass_gate(gate).await;
            let mut state = self.state.lock().unwrap();
            if let Some(Some(error)) = state.batch_script.pop_front() {
                return Err(error);
            }
            let failed = state.batch_server_failures.min(locations.len() as u32);
            Ok(BatchOutcome { created: locations.len() as u32 - failed, failed })
        })
    }
}

/// Everything a drain needs, wired over one in-memory store.
pub struct Harness {
    pub store: Arc<FlakyStore>,
    pub clock: Arc<FixedClock>,
    pub queue: Arc<OfflineQueue>,
    pub publisher: Arc<StatusPublisher>,
    pub probe: Arc<ManualProbe>,
    pub connectivity: Arc<ConnectivityMonitor>,
    pub gateway: FakeGateway,
    pub orchestrator: Arc<SyncOrchestrator<FakeGateway>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(&SyncConfig::default())
    }

    pub fn with_config(config: &SyncConfig) -> Self {
        let store = Arc::new(FlakyStore::default());
        let clock = FixedClock::new(START_MS);
        let shared_clock: SharedClock = clock.clone();
        let kv: Arc<dyn KeyValueStore> = store.clone();

        let queue = Arc::new(OfflineQueue::open(Arc::clone(&kv), shared_clock.clone()).unwrap());
        let publisher = Arc::new(
            StatusPublisher::open(Arc::clone(&queue), kv, shared_clock.clone(), config.max_error_log)
                .unwrap(),
        );
        let probe = Arc::new(ManualProbe::online());
        let connectivity =
            Arc::new(ConnectivityMonitor::new(probe.clone(), Duration::from_millis(200)));
        let gateway = FakeGateway::new();
        let orchestrator = Arc::new(SyncOrchestrator::new(
            gateway.clone(),
            Arc::clone(&queue),
            Arc::clone(&publisher),
            Arc::clone(&connectivity),
            shared_clock,
            config,
        ));

        Harness { store, clock, queue, publisher, probe, connectivity, gateway, orchestrator }
    }
}

/// A queue over a fresh in-memory store at [`START_MS`].
pub fn memory_queue() -> (Arc<OfflineQueue>, Arc<FlakyStore>, Arc<FixedClock>) {
    let store = Arc::new(FlakyStore::default());
    let clock = FixedClock::new(START_MS);
    let queue = OfflineQueue::open(store.clone(), clock.clone()).unwrap();
    (Arc::new(queue), store, clock)
}
