// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Network reachability.
//!
//! The platform primitive sits behind [`ReachabilityProbe`]. The
//! [`ConnectivityMonitor`] bounds every query by a timeout and fans
//! reachability transitions out to subscribers.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::observer::{Observers, Subscription};

/// Link type reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    None,
    Wifi,
    Cellular,
    Ethernet,
    #[default]
    Unknown,
}

/// Reachability snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkState {
    pub connected: bool,
    pub kind: ConnectionKind,
}

impl NetworkState {
    pub fn online(kind: ConnectionKind) -> Self {
        NetworkState { connected: true, kind }
    }

    pub fn offline() -> Self {
        NetworkState { connected: false, kind: ConnectionKind::None }
    }
}

/// Boxed future returned by [`ReachabilityProbe::probe`].
pub type ProbeFuture<'a> = Pin<Box<dyn Future<Output = Option<NetworkState>> + Send + 'a>>;

/// Platform reachability primitive. `None` means the platform had no answer.
pub trait ReachabilityProbe: Send + Sync {
    fn probe(&self) -> ProbeFuture<'_>;
}

/// Probe whose answer is set by the host (or a test).
#[derive(Debug, Default)]
pub struct ManualProbe {
    state: Mutex<Option<NetworkState>>,
}

impl ManualProbe {
    pub fn new(initial: Option<NetworkState>) -> Self {
        ManualProbe { state: Mutex::new(initial) }
    }

    pub fn online() -> Self {
        Self::new(Some(NetworkState::online(ConnectionKind::Unknown)))
    }

    pub fn offline() -> Self {
        Self::new(Some(NetworkState::offline()))
    }

    pub fn set(&self, state: Option<NetworkState>) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    pub fn set_connected(&self, connected: bool) {
        let state = if connected {
            NetworkState::online(ConnectionKind::Unknown)
        } else {
            NetworkState::offline()
        };
        self.set(Some(state));
    }
}

impl ReachabilityProbe for ManualProbe {
    fn probe(&self) -> ProbeFuture<'_> {
        let state = *self.state.lock().unwrap_or_else(|e| e.into_inner());
        Box::pin(async move { state })
    }
}

/// Probe issuing a `HEAD` request to a health URL.
///
/// Any HTTP response, whatever its status, counts as reachable.
pub struct HttpProbe {
    client: Client,
    url: String,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpProbe { client, url: url.into() })
    }
}

impl ReachabilityProbe for HttpProbe {
    fn probe(&self) -> ProbeFuture<'_> {
        Box::pin(async move {
            match self.client.head(&self.url).send().await {
                Ok(_) => Some(NetworkState::online(ConnectionKind::Unknown)),
                Err(e) => {
                    tracing::debug!("reachability probe to {} failed: {}", self.url, e);
                    Some(NetworkState::offline())
                }
            }
        })
    }
}

const LAST_UNKNOWN: u8 = 0;
const LAST_DISCONNECTED: u8 = 1;
const LAST_CONNECTED: u8 = 2;

fn encode(state: &NetworkState) -> u8 {
    if state.connected {
        LAST_CONNECTED
    } else {
        LAST_DISCONNECTED
    }
}

/// Bounded reachability queries plus transition notifications.
pub struct ConnectivityMonitor {
    probe: Arc<dyn ReachabilityProbe>,
    timeout: Duration,
    last: AtomicU8,
    observers: Observers<NetworkState>,
}

impl ConnectivityMonitor {
    pub fn new(probe: Arc<dyn ReachabilityProbe>, timeout: Duration) -> Self {
        ConnectivityMonitor {
            probe,
            timeout,
            last: AtomicU8::new(LAST_UNKNOWN),
            observers: Observers::new(),
        }
    }

    /// Asks the probe for the current state.
    ///
    /// A probe that does not answer within the timeout, or answers `None`,
    /// reads as disconnected.
    pub async fn current_state(&self) -> NetworkState {
        match tokio::time::timeout(self.timeout, self.probe.probe()).await {
            Ok(Some(state)) => state,
            Ok(None) => {
                tracing::debug!("reachability unknown, assuming offline");
                NetworkState::offline()
            }
            Err(_) => {
                tracing::debug!("reachability probe timed out after {:?}", self.timeout);
                NetworkState::offline()
            }
        }
    }

    /// Callback invoked on every reachability transition.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&NetworkState) + Send + Sync + 'static,
    {
        self.observers.subscribe(callback)
    }

    /// Feeds a reachability event from the platform.
    ///
    /// Subscribers are notified only when `connected` differs from the last
    /// reported value; the first report always notifies. Returns whether a
    /// notification went out.
    pub fn report(&self, state: NetworkState) -> bool {
        let next = encode(&state);
        let previous = self.last.swap(next, Ordering::AcqRel);
        if previous == next {
            return false;
        }
        tracing::info!(connected = state.connected, kind = ?state.kind, "connectivity changed");
        self.observers.notify(&state);
        true
    }

    /// Probes and reports the result, returning it.
    pub async fn refresh(&self) -> NetworkState {
        let state = self.current_state().await;
        self.report(state);
        state
    }
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
