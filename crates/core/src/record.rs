// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queued records: domain payloads awaiting upload.
//!
//! A [`QueuedRecord`] wraps one [`Payload`] together with the bookkeeping the
//! sync pass needs: the client-side id, the server id once known, and the
//! retry counters. The payload is a closed sum type so every phase of a
//! drain dispatches exhaustively on the record kind.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::model::{FieldReport, GpsLocation, OcrResult};

/// Prefix marking an id generated on the device for a record the server
/// has not confirmed yet.
pub const OFFLINE_PREFIX: &str = "offline_";

/// The three record kinds held by the offline queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Report,
    Location,
    OcrResult,
}

impl RecordKind {
    /// All kinds in drain phase order.
    pub const ALL: [RecordKind; 3] = [RecordKind::Report, RecordKind::Location, RecordKind::OcrResult];

    /// Storage key holding this kind's queue.
    pub fn storage_key(self) -> &'static str {
        match self {
            RecordKind::Report => "offline_reports",
            RecordKind::Location => "offline_locations",
            RecordKind::OcrResult => "offline_ocr",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Report => "report",
            RecordKind::Location => "location",
            RecordKind::OcrResult => "ocr_result",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "report" => Ok(RecordKind::Report),
            "location" => Ok(RecordKind::Location),
            "ocr_result" | "ocr" => Ok(RecordKind::OcrResult),
            _ => Err(Error::InvalidInput(format!("unknown record kind: '{s}'"))),
        }
    }
}

/// The domain payload of a queued record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Payload {
    Report(FieldReport),
    Location(GpsLocation),
    OcrResult(OcrResult),
}

impl Payload {
    pub fn kind(&self) -> RecordKind {
        match self {
            Payload::Report(_) => RecordKind::Report,
            Payload::Location(_) => RecordKind::Location,
            Payload::OcrResult(_) => RecordKind::OcrResult,
        }
    }

    /// The id carried inside the domain object itself.
    pub fn id(&self) -> &str {
        match self {
            Payload::Report(r) => &r.id,
            Payload::Location(l) => &l.id,
            Payload::OcrResult(o) => &o.id,
        }
    }

    fn set_id(&mut self, id: &str) {
        match self {
            Payload::Report(r) => r.id = id.to_string(),
            Payload::Location(l) => l.id = id.to_string(),
            Payload::OcrResult(o) => o.id = id.to_string(),
        }
    }
}

impl From<FieldReport> for Payload {
    fn from(report: FieldReport) -> Self {
        Payload::Report(report)
    }
}

impl From<GpsLocation> for Payload {
    fn from(location: GpsLocation) -> Self {
        Payload::Location(location)
    }
}

impl From<OcrResult> for Payload {
    fn from(ocr: OcrResult) -> Self {
        Payload::OcrResult(ocr)
    }
}

/// A payload waiting in the offline queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedRecord {
    /// Client-side identifier, unique within the record's kind.
    pub local_id: String,
    /// Server-assigned id, set once the server accepted the record.
    #[serde(default)]
    pub remote_id: Option<String>,
    #[serde(default)]
    pub attempt_count: u32,
    #[serde(default)]
    pub last_error: Option<String>,
    /// Local id of the record this one belongs to (e.g. the report an OCR
    /// result was captured for).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub queued_at: DateTime<Utc>,
    pub payload: Payload,
}

impl QueuedRecord {
    /// Wraps a payload, using the payload's own id as the local id.
    pub fn new(payload: impl Into<Payload>, queued_at: DateTime<Utc>) -> Self {
        let payload = payload.into();
        QueuedRecord {
            local_id: payload.id().to_string(),
            remote_id: None,
            attempt_count: 0,
            last_error: None,
            owner_id: None,
            queued_at,
            payload,
        }
    }

    /// Sets the owning record's local id.
    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn kind(&self) -> RecordKind {
        self.payload.kind()
    }

    /// True when the local id was generated on the device.
    pub fn is_offline_created(&self) -> bool {
        is_offline_id(&self.local_id)
    }

    /// True until the server has confirmed the record.
    pub fn is_pending(&self) -> bool {
        self.remote_id.is_none()
    }

    /// Records a failed upload attempt.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.attempt_count = self.attempt_count.saturating_add(1);
        self.last_error = Some(error.into());
    }

    /// Re-keys the record under a server id, keeping the payload in sync.
    pub fn rekey(&mut self, id: &str) {
        self.local_id = id.to_string();
        self.payload.set_id(id);
    }

    /// Resets retry bookkeeping, used when a dead letter is requeued.
    pub fn reset_attempts(&mut self) {
        self.attempt_count = 0;
        self.last_error = None;
    }
}

/// Returns true for ids carrying the offline-created marker.
pub fn is_offline_id(id: &str) -> bool {
    id.starts_with(OFFLINE_PREFIX)
}

static LOCAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a device-local id for a record created while offline.
/// Format: `offline_{millis}_{hash}` where hash is the first 8 hex chars of
/// SHA256(seed + timestamp + per-process counter).
pub fn generate_offline_id(seed: &str, created_at: &DateTime<Utc>) -> String {
    let counter = LOCAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    let input = format!("{}{}{}", seed, created_at.to_rfc3339(), counter);
    let hash = Sha256::digest(input.as_bytes());
    let short_hash = hex::encode(&hash[..4]);
    format!("{}{}_{}", OFFLINE_PREFIX, created_at.timestamp_millis(), short_hash)
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
