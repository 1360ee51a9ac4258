// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sample records for tests of this crate and its dependents.
//!
//! Enabled by the `fixtures` feature.

use chrono::{DateTime, TimeZone, Utc};

use crate::model::{
    DocumentType, FieldReport, GpsLocation, OcrResult, Priority, ReportCategory, ReportStatus,
};

/// A fixed timestamp used by all fixtures.
pub fn fixed_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_773_480_600, 0).single().unwrap_or_default()
}

/// A GPS fix with the given id.
pub fn location(id: &str) -> GpsLocation {
    GpsLocation {
        id: id.to_string(),
        user_id: "agent-7".to_string(),
        latitude: 51.5072,
        longitude: -0.1276,
        altitude: Some(11.0),
        accuracy: 5.0,
        timestamp: fixed_time(),
        address: None,
        notes: None,
    }
}

/// A draft report with the given id and title.
pub fn report(id: &str, title: &str) -> FieldReport {
    FieldReport {
        id: id.to_string(),
        user_id: "agent-7".to_string(),
        title: title.to_string(),
        description: format!("{title} (captured in the field)"),
        status: ReportStatus::Draft,
        priority: Priority::Medium,
        category: ReportCategory::Inspection,
        location: location(&format!("{id}-loc")),
        attachments: Vec::new(),
        ocr_results: Vec::new(),
        ai_summary: None,
        ai_suggestions: Vec::new(),
        created_at: fixed_time(),
        updated_at: fixed_time(),
        synced_at: None,
    }
}

/// An OCR result with the given id.
pub fn ocr_result(id: &str) -> OcrResult {
    OcrResult {
        id: id.to_string(),
        text: "INVOICE 2291 TOTAL 140.00".to_string(),
        confidence: 0.87,
        bounding_boxes: Vec::new(),
        document_type: DocumentType::Invoice,
        extracted_fields: Default::default(),
        image_uri: format!("file:///captures/{id}.jpg"),
        timestamp: fixed_time(),
    }
}
