// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Log subscriber setup for hosts that do not install their own.

use std::fs;
use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

/// Installs a global `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Logs go to `log_path` when it can be opened for appending, otherwise to
/// stderr. Fails if a global subscriber is already installed.
pub fn init(log_path: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file, fallback_reason) = match log_path.map(open_log_file) {
        Some(Ok(file)) => (Some(file), None),
        Some(Err(reason)) => (None, Some(reason)),
        None => (None, None),
    };

    let installed = match file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .try_init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };
    installed.map_err(|e| Error::Logging(e.to_string()))?;

    if let Some(reason) = fallback_reason {
        tracing::warn!("logging to stderr: {}", reason);
    }
    Ok(())
}

fn open_log_file(path: &Path) -> std::result::Result<fs::File, String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("cannot create log directory {}: {}", parent.display(), e))?;
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| format!("cannot open log file {}: {}", path.display(), e))
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
