// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use chrono::TimeZone;
use serde_json::json;
use yare::parameterized;

fn ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
}

fn location() -> GpsLocation {
    GpsLocation {
        id: "loc-1".into(),
        user_id: "user-1".into(),
        latitude: 48.8566,
        longitude: 2.3522,
        altitude: None,
        accuracy: 4.5,
        timestamp: ts(),
        address: None,
        notes: Some("gate B".into()),
    }
}

#[test]
fn location_serializes_camel_case_and_skips_absent_options() {
    let value = serde_json::to_value(location()).unwrap();
    assert_eq!(value["userId"], "user-1");
    assert_eq!(value["notes"], "gate B");
    assert!(value.get("altitude").is_none());
    assert!(value.get("address").is_none());
}

#[test]
fn report_deserializes_from_api_shape_with_defaults() {
    let body = json!({
        "id": "srv_9",
        "userId": "user-1",
        "title": "Pump inspection",
        "description": "Seal leaking",
        "status": "in_progress",
        "priority": "urgent",
        "category": "maintenance",
        "location": serde_json::to_value(location()).unwrap(),
        "createdAt": "2026-03-14T09:30:00Z",
        "updatedAt": "2026-03-14T09:30:00Z"
    });

    let report: FieldReport = serde_json::from_value(body).unwrap();
    assert_eq!(report.status, ReportStatus::InProgress);
    assert_eq!(report.priority, Priority::Urgent);
    assert_eq!(report.category, ReportCategory::Maintenance);
    assert!(report.attachments.is_empty());
    assert!(report.ocr_results.is_empty());
    assert!(report.synced_at.is_none());
}

#[parameterized(
    draft = { ReportStatus::Draft, "draft" },
    in_progress = { ReportStatus::InProgress, "in_progress" },
    archived = { ReportStatus::Archived, "archived" },
)]
fn report_status_display_matches_wire_value(status: ReportStatus, expected: &str) {
    assert_eq!(status.to_string(), expected);
    assert_eq!(serde_json::to_value(status).unwrap(), json!(expected));
}

#[parameterized(
    id_card = { DocumentType::IdCard, "id_card" },
    business_card = { DocumentType::BusinessCard, "business_card" },
    license_plate = { DocumentType::LicensePlate, "license_plate" },
)]
fn document_type_wire_values(doc: DocumentType, expected: &str) {
    assert_eq!(serde_json::to_value(doc).unwrap(), json!(expected));
}

#[test]
fn ocr_result_keeps_extracted_fields() {
    let body = json!({
        "id": "ocr_1",
        "text": "TOTAL 12.50",
        "confidence": 0.91,
        "documentType": "receipt",
        "extractedFields": { "total": "12.50" },
        "imageUri": "file:///tmp/receipt.jpg",
        "timestamp": "2026-03-14T09:30:00Z"
    });
    let ocr: OcrResult = serde_json::from_value(body).unwrap();
    assert_eq!(ocr.document_type, DocumentType::Receipt);
    assert_eq!(ocr.extracted_fields["total"], json!("12.50"));
    assert!(ocr.bounding_boxes.is_empty());
}
