// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.

use std::path::PathBuf;

/// Environment variable names read by the engine.
pub mod vars {
    pub const FIELDSYNC_API_URL: &str = "FIELDSYNC_API_URL";
    pub const FIELDSYNC_STATE_DIR: &str = "FIELDSYNC_STATE_DIR";
    pub const XDG_STATE_HOME: &str = "XDG_STATE_HOME";
}

/// Returns the value of `FIELDSYNC_API_URL` if set and non-empty.
pub fn api_url() -> Option<String> {
    std::env::var(vars::FIELDSYNC_API_URL).ok().filter(|v| !v.is_empty())
}

/// Returns the value of `FIELDSYNC_STATE_DIR` if set.
pub fn state_dir() -> Option<PathBuf> {
    std::env::var(vars::FIELDSYNC_STATE_DIR).ok().map(PathBuf::from)
}

/// Returns the value of `XDG_STATE_HOME` if set.
pub fn xdg_state_home() -> Option<PathBuf> {
    std::env::var(vars::XDG_STATE_HOME).ok().map(PathBuf::from)
}
