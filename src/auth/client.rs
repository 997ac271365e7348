// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transport to the Typeauth verification endpoint.
//!
//! The validator talks to the service through [`VerificationTransport`] so
//! tests can substitute scripted responses and transport failures.
//! [`HttpTransport`] is the reqwest-backed implementation used in production.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::Serialize;

use super::telemetry::TelemetrySnapshot;

/// JSON body posted to `/authenticate`.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationRequest {
    pub token: String,
    #[serde(rename = "appID")]
    pub app_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<TelemetrySnapshot>,
}

/// A completed HTTP exchange, whatever its status.
///
/// `body` is only read for 2xx responses.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// The request never produced an HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("verification request timed out: {0}")]
    Timeout(String),

    #[error("could not connect to verification service: {0}")]
    Connect(String),

    #[error("verification request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

#[async_trait]
pub trait VerificationTransport: Send + Sync {
    /// POST `body` as JSON to `url`.
    ///
    /// Any HTTP status is `Ok`; `Err` means no response was received.
    async fn post_json(
        &self,
        url: &str,
        body: &VerificationRequest,
    ) -> Result<TransportResponse, TransportError>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    /// Build a transport whose attempts are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl VerificationTransport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &VerificationRequest,
    ) -> Result<TransportResponse, TransportError> {
        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();

        // A non-2xx status is a final answer; its body is never consulted.
        if !response.status().is_success() {
            return Ok(TransportResponse::new(status, Vec::new()));
        }

        let body = response.bytes().await?;
        Ok(TransportResponse::new(status, body.to_vec()))
    }
}
