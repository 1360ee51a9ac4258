// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors surfaced by the sync engine.
///
/// Per-record upload failures never appear here: they are recorded on the
/// record itself. Only failures that end a whole pass, or that a caller of
/// the queue must handle, are represented.
#[derive(Debug, Error)]
pub enum Error {
    /// Local persistence failed. Fatal for the current pass.
    #[error("storage error: {0}")]
    Storage(#[from] fieldsync_core::Error),

    /// The server rejected the session credential. Fatal for the current pass.
    #[error("authentication rejected: {0}\n  hint: sign in again to resume syncing")]
    Auth(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no async runtime: {0}\n  hint: start auto-sync from within a tokio runtime")]
    Runtime(String),

    #[error("failed to install log subscriber: {0}")]
    Logging(String),

    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Result type for sync engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
