// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    storage = { Error::storage("offline_reports", "disk full"), "disk full" },
    locked = { Error::Locked("/tmp/state".into()), "locked" },
    invalid_key = { Error::InvalidKey("../etc".into()), "../etc" },
    corrupted = {
        Error::CorruptedData { key: "sync_errors".into(), reason: "not an array".into() },
        "sync_errors"
    },
)]
fn error_display_contains(err: Error, expected: &str) {
    assert!(err.to_string().contains(expected));
}

#[test]
fn error_from_io() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
    let err: Error = io_err.into();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn error_from_json() {
    let json_err = serde_json::from_str::<Vec<u32>>("{").unwrap_err();
    let err: Error = json_err.into();
    assert!(matches!(err, Error::Json(_)));
}
