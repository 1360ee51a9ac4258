// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Field domain records: reports, GPS fixes and OCR results.
//!
//! These are the payloads carried by the offline queue. Their serialized
//! form (camelCase fields, snake_case enum values, RFC 3339 timestamps) is
//! exactly what the remote report and location APIs accept and return.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Workflow status of a field report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[default]
    Draft,
    InProgress,
    Completed,
    Reviewed,
    Archived,
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportStatus::Draft => write!(f, "draft"),
            ReportStatus::InProgress => write!(f, "in_progress"),
            ReportStatus::Completed => write!(f, "completed"),
            ReportStatus::Reviewed => write!(f, "reviewed"),
            ReportStatus::Archived => write!(f, "archived"),
        }
    }
}

/// Urgency of a field report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// Business category of a field report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportCategory {
    Inspection,
    Logistics,
    Sales,
    Survey,
    Maintenance,
    Incident,
    #[default]
    Other,
}

/// Kind of document recognized by OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Invoice,
    Receipt,
    IdCard,
    BusinessCard,
    LicensePlate,
    Form,
    #[default]
    Other,
}

/// A single GPS fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsLocation {
    pub id: String,
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    /// Horizontal accuracy in meters.
    pub accuracy: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A recognized word region inside an OCR'd image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
    pub confidence: f64,
}

/// Structured output of the OCR routine for one captured image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResult {
    pub id: String,
    pub text: String,
    /// Overall recognition confidence in `0.0..=1.0`.
    pub confidence: f64,
    #[serde(default)]
    pub bounding_boxes: Vec<BoundingBox>,
    pub document_type: DocumentType,
    #[serde(default)]
    pub extracted_fields: BTreeMap<String, serde_json::Value>,
    pub image_uri: String,
    pub timestamp: DateTime<Utc>,
}

/// A file attached to a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub file_name: String,
    pub file_path: String,
    pub file_size: u64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A field report authored on the device.
///
/// OCR results captured for the report travel embedded in `ocr_results`;
/// they are never uploaded on their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReport {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub status: ReportStatus,
    pub priority: Priority,
    pub category: ReportCategory,
    pub location: GpsLocation,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub ocr_results: Vec<OcrResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    #[serde(default)]
    pub ai_suggestions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
}

/// Aggregate result of a location batch upload.
///
/// The batch endpoint only reports counts, never which items failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub created: u32,
    pub failed: u32,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
