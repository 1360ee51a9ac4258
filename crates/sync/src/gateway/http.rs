// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP gateway speaking the field API's JSON envelope.
//!
//! Every response body has the shape
//! `{"success": bool, "data": ..., "message": "...", "errors": [...]}`.
//! Status codes are mapped onto [`GatewayError`]:
//!
//! | response                              | error        |
//! |---------------------------------------|--------------|
//! | 401, 403                              | `Auth`       |
//! | 408, 429, 5xx, timeout, connect error | `Network`    |
//! | other 4xx, `success: false`           | `Validation` |
//!
//! An accepted update whose reply is empty or not a full report still
//! counts as applied.

use std::sync::Arc;

use fieldsync_core::{BatchOutcome, FieldReport, GpsLocation};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{GatewayError, GatewayFuture, GatewayResult, RemoteGateway};
use crate::config::SyncConfig;
use crate::error::Result;

/// Supplies the bearer credential attached to every request.
///
/// Token issuance and refresh belong to the host application.
pub trait CredentialSource: Send + Sync {
    /// The current access token, or `None` when signed out.
    fn bearer_token(&self) -> Option<String>;
}

/// A fixed access token.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        StaticToken(token.into())
    }
}

impl CredentialSource for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

impl<F> CredentialSource for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn bearer_token(&self) -> Option<String> {
        self()
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    message: Option<String>,
    #[serde(default)]
    errors: Vec<String>,
}

impl<T> ApiEnvelope<T> {
    fn reason(&self, fallback: &str) -> String {
        match (&self.message, self.errors.is_empty()) {
            (Some(message), true) => message.clone(),
            (Some(message), false) => format!("{}: {}", message, self.errors.join(", ")),
            (None, false) => self.errors.join(", "),
            (None, true) => fallback.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedRecord {
    id: String,
}

#[derive(Serialize)]
struct LocationBatch<'a> {
    locations: &'a [GpsLocation],
}

/// [`RemoteGateway`] over HTTP using `reqwest`.
pub struct HttpGateway {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialSource>,
}

impl HttpGateway {
    /// Build a gateway for `config.api_base_url`, bounding every request by
    /// `config.request_timeout_secs`.
    pub fn new(config: &SyncConfig, credentials: Arc<dyn CredentialSource>) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(HttpGateway {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends `request` and returns the envelope of an accepted response, or
    /// `None` for a 2xx with an empty body.
    async fn exchange<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> GatewayResult<Option<ApiEnvelope<T>>> {
        let response = self.authorize(request).send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        if status.is_success() && body.trim().is_empty() {
            return Ok(None);
        }
        let envelope = serde_json::from_str::<ApiEnvelope<T>>(&body);

        if let Some(error) = classify_status(status, envelope.as_ref().ok()) {
            return Err(error);
        }

        let envelope = envelope
            .map_err(|e| GatewayError::Network(format!("undecodable response ({status}): {e}")))?;
        if !envelope.success {
            return Err(GatewayError::Validation(envelope.reason("request rejected")));
        }
        Ok(Some(envelope))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> GatewayResult<T> {
        let envelope = self
            .exchange::<T>(request)
            .await?
            .ok_or_else(|| GatewayError::Network("empty response body".to_string()))?;
        let reason = envelope.reason("response carried no data");
        envelope.data.ok_or(GatewayError::Validation(reason))
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Network(format!("request timed out: {e}"))
    } else {
        GatewayError::Network(e.to_string())
    }
}

fn classify_status<T>(status: StatusCode, envelope: Option<&ApiEnvelope<T>>) -> Option<GatewayError> {
    if status.is_success() {
        return None;
    }
    let reason = envelope
        .map(|env| env.reason(&status.to_string()))
        .unwrap_or_else(|| status.to_string());

    let error = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Auth(reason),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => GatewayError::Network(reason),
        s if s.is_client_error() => GatewayError::Validation(reason),
        _ => GatewayError::Network(reason),
    };
    Some(error)
}

impl RemoteGateway for HttpGateway {
    fn create_report<'a>(&'a self, report: &'a FieldReport) -> GatewayFuture<'a, String> {
        Box::pin(async move {
            let request = self.client.post(self.url("/reports")).json(report);
            let created: CreatedRecord = self.send(request).await?;
            Ok(created.id)
        })
    }

    fn update_report<'a>(
        &'a self,
        remote_id: &'a str,
        report: &'a FieldReport,
    ) -> GatewayFuture<'a, FieldReport> {
        Box::pin(async move {
            let request = self.client.patch(self.url(&format!("/reports/{remote_id}"))).json(report);
            // Once accepted the update is applied; a reply that is not a full
            // report must not turn it into a retry.
            let accepted = self.exchange::<serde_json::Value>(request).await?;
            let stored = accepted.and_then(|envelope| envelope.data).and_then(|data| {
                match serde_json::from_value::<FieldReport>(data) {
                    Ok(stored) => Some(stored),
                    Err(e) => {
                        tracing::debug!("update of {} accepted, reply is not a report: {}", remote_id, e);
                        None
                    }
                }
            });
            Ok(stored.unwrap_or_else(|| report.clone()))
        })
    }

    fn batch_create_locations<'a>(
        &'a self,
        locations: &'a [GpsLocation],
    ) -> GatewayFuture<'a, BatchOutcome> {
        Box::pin(async move {
            let request = self
                .client
                .post(self.url("/locations/batch"))
                .json(&LocationBatch { locations });
            self.send(request).await
        })
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
