// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote gateway abstraction over the report and location APIs.
//!
//! Provides a trait-based boundary that enables:
//! - An HTTP implementation for production ([`HttpGateway`])
//! - Scripted fakes for unit testing
//!
//! Every operation is independently fallible; a failure says nothing about
//! the next call.

mod http;

pub use http::{CredentialSource, HttpGateway, StaticToken};

use std::future::Future;
use std::pin::Pin;

use fieldsync_core::{BatchOutcome, FieldReport, GpsLocation};

/// Error type for gateway operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Transient transport failure (unreachable host, timeout, 5xx).
    /// Retried on the next pass.
    #[error("network error: {0}")]
    Network(String),

    /// The server rejected the payload.
    #[error("validation error: {0}")]
    Validation(String),

    /// The session credential was refused. Never retried within a pass.
    #[error("auth error: {0}")]
    Auth(String),
}

impl GatewayError {
    /// True for errors that must end the whole pass.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GatewayError::Auth(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, GatewayError::Validation(_))
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Boxed future returned by gateway operations.
pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = GatewayResult<T>> + Send + 'a>>;

/// Network operations the sync orchestrator drives, one set per record kind.
///
/// OCR results have no operation of their own: they are uploaded inside the
/// owning report.
pub trait RemoteGateway: Send + Sync {
    /// Create a report on the server. Returns the server-assigned id.
    fn create_report<'a>(&'a self, report: &'a FieldReport) -> GatewayFuture<'a, String>;

    /// Replace the server copy of a report (last write wins).
    fn update_report<'a>(
        &'a self,
        remote_id: &'a str,
        report: &'a FieldReport,
    ) -> GatewayFuture<'a, FieldReport>;

    /// Upload a batch of GPS fixes in one call.
    fn batch_create_locations<'a>(
        &'a self,
        locations: &'a [GpsLocation],
    ) -> GatewayFuture<'a, BatchOutcome>;
}

impl<G: RemoteGateway + ?Sized> RemoteGateway for std::sync::Arc<G> {
    fn create_report<'a>(&'a self, report: &'a FieldReport) -> GatewayFuture<'a, String> {
        (**self).create_report(report)
    }

    fn update_report<'a>(
        &'a self,
        remote_id: &'a str,
        report: &'a FieldReport,
    ) -> GatewayFuture<'a, FieldReport> {
        (**self).update_report(remote_id, report)
    }

    fn batch_create_locations<'a>(
        &'a self,
        locations: &'a [GpsLocation],
    ) -> GatewayFuture<'a, BatchOutcome> {
        (**self).batch_create_locations(locations)
    }
}
