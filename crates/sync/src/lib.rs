// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! fieldsync - Offline queue and sync engine for field reports.
//!
//! Records captured while the device is offline (field reports, GPS fixes
//! and OCR results) are queued durably and uploaded once the network is
//! back. Offline-created reports are reconciled with their server ids.
//!
//! # Architecture
//!
//! ```text
//!   host app ──enqueue──► OfflineQueue ◄──snapshot / write back──┐
//!      ▲                       │                                 │
//!      │ SyncStatus            ▼                                 │
//!   StatusPublisher ◄── SyncOrchestrator ──► RemoteGateway ──► field API
//!                              ▲
//!            timer, reconnect, │ manual trigger
//!                     ConnectivityMonitor
//! ```
//!
//! # Main Components
//!
//! - [`SyncService`] - Facade wiring everything, plus the auto-sync triggers
//! - [`OfflineQueue`] - Durable per-kind queues, id remap table, dead letters
//! - [`SyncOrchestrator`] - One drain pass at a time
//! - [`RemoteGateway`] - Upload operations; [`HttpGateway`] speaks HTTP
//! - [`ConnectivityMonitor`] - Bounded reachability queries and transitions
//! - [`StatusPublisher`] - [`SyncStatus`] snapshots for subscribers
//!
//! # Usage
//!
//! ```rust,ignore
//! use fieldsync::{system_clock, StaticToken, SyncConfig, SyncService};
//!
//! let config = SyncConfig::load(Path::new("fieldsync.toml"))?.with_env_overrides();
//! let service = SyncService::open(config, Arc::new(StaticToken::new(token)), system_clock())?;
//! service.start_auto_sync(service.config().sync_interval())?;
//!
//! let id = service.new_offline_report_id(&user_id);
//! service.enqueue_report(report_with_id(id))?;
//! ```

pub mod config;
pub mod connectivity;
pub mod env;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod observer;
pub mod orchestrator;
pub mod publisher;
pub mod queue;
pub mod service;

#[cfg(test)]
mod test_helpers;

pub use config::{SyncConfig, CONFIG_FILE_NAME};
pub use connectivity::{
    ConnectionKind, ConnectivityMonitor, HttpProbe, ManualProbe, NetworkState, ReachabilityProbe,
};
pub use error::{Error, Result};
pub use gateway::{
    CredentialSource, GatewayError, GatewayResult, HttpGateway, RemoteGateway, StaticToken,
};
pub use observer::{Observers, Subscription};
pub use orchestrator::{DrainOutcome, PassReport, SkipReason, SyncOrchestrator};
pub use publisher::StatusPublisher;
pub use queue::OfflineQueue;
pub use service::SyncService;

pub use fieldsync_core::{
    system_clock, FieldReport, FileStore, GpsLocation, KeyValueStore, MemoryStore, OcrResult,
    QueuedRecord, RecordKind, SharedClock, SyncError, SyncErrorKind, SyncState, SyncStatus,
};
