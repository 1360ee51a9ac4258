// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// All possible errors that can occur in fieldsync-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage error for key '{key}': {reason}")]
    Storage { key: String, reason: String },

    #[error("state directory is locked: {0}\n  hint: another process is already syncing from this directory")]
    Locked(String),

    #[error("invalid storage key: '{0}'\n  hint: keys are lowercase ascii letters, digits and underscores")]
    InvalidKey(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("corrupted data under key '{key}': {reason}")]
    CorruptedData { key: String, reason: String },
}

impl Error {
    /// Creates a storage error for the given key.
    pub fn storage(key: &str, reason: impl Into<String>) -> Self {
        Error::Storage { key: key.to_string(), reason: reason.into() }
    }
}

/// A specialized Result type for fieldsync-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
