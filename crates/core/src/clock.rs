// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Wall clock abstraction.
//!
//! Sync timestamps (`lastSyncAt`, error log entries, enqueue times) are read
//! through [`ClockSource`] so tests can pin time.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

/// Trait for obtaining the current time.
pub trait ClockSource: Send + Sync {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;

    /// Returns the current time as a UTC timestamp.
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.now_ms()).single().unwrap_or_default()
    }
}

/// System clock implementation backed by `chrono::Utc::now`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: ClockSource + ?Sized> ClockSource for Arc<C> {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }

    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Shared clock handle passed between components.
pub type SharedClock = Arc<dyn ClockSource>;

/// Returns a shared handle to the system clock.
pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
