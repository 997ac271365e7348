// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token validation against the Typeauth service.
//!
//! ## Retry policy
//!
//! Only transport failures are retried, up to `max_retries` attempts with
//! `retry_delay` between them. A non-2xx status or a well-formed "invalid"
//! answer is final and returned immediately.
//!
//! ## Seams
//!
//! The HTTP call ([`VerificationTransport`]), the backoff wait ([`Sleeper`])
//! and the telemetry timestamp ([`Clock`]) are injectable, so the retry loop
//! can be driven in tests without a network or real waiting.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::client::{
    HttpTransport, TransportError, TransportResponse, VerificationRequest, VerificationTransport,
};
use super::outcome::{Denial, ValidationOutcome};
use super::telemetry::{Clock, RequestContext, SystemClock, TelemetrySnapshot};
use crate::config::ValidationConfig;

/// Waits between retry attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Validates bearer tokens for one protected route group.
///
/// Cheap to clone; all clones share the same configuration and seams.
#[derive(Clone)]
pub struct Validator {
    config: Arc<ValidationConfig>,
    transport: Arc<dyn VerificationTransport>,
    sleeper: Arc<dyn Sleeper>,
    clock: Arc<dyn Clock>,
}

impl Validator {
    /// Create a validator that talks to the service over HTTP.
    pub fn new(config: ValidationConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(config.request_timeout())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a validator with a custom transport.
    pub fn with_transport(
        config: ValidationConfig,
        transport: Arc<dyn VerificationTransport>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            sleeper: Arc::new(TokioSleeper),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate `token` for the request described by `context`.
    pub async fn validate(&self, token: &str, context: &RequestContext) -> ValidationOutcome {
        self.validate_with_cancel(token, context, &CancellationToken::new())
            .await
    }

    /// Like [`validate`](Self::validate), but stops retrying once `cancel` fires.
    pub async fn validate_with_cancel(
        &self,
        token: &str,
        context: &RequestContext,
        cancel: &CancellationToken,
    ) -> ValidationOutcome {
        let url = self.config.authenticate_url();
        let body = self.request_body(token, context);
        let max_retries = self.config.max_retries();

        let mut attempts = 0;
        while attempts < max_retries {
            match self.transport.post_json(&url, &body).await {
                Ok(response) => return classify_response(&response),
                Err(e) => {
                    attempts += 1;
                    if attempts >= max_retries {
                        warn!(
                            attempts,
                            error = %e,
                            "Typeauth verification failed after all retries"
                        );
                        return Denial::retries_exhausted().into();
                    }

                    warn!(
                        attempt = attempts,
                        max_retries,
                        delay = ?self.config.retry_delay(),
                        error = %e,
                        "Typeauth verification request failed, retrying"
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            info!(attempts, "Typeauth verification cancelled during backoff");
                            return Denial::cancelled().into();
                        }
                        _ = self.sleeper.sleep(self.config.retry_delay()) => {}
                    }
                }
            }
        }

        // Only reachable with max_retries == 0, which the config builder rejects.
        Denial::unexpected().into()
    }

    fn request_body(&self, token: &str, context: &RequestContext) -> VerificationRequest {
        let telemetry = self
            .config
            .telemetry_enabled()
            .then(|| TelemetrySnapshot::capture(context, self.clock.as_ref()));

        VerificationRequest {
            token: token.to_string(),
            app_id: self.config.app_id().to_string(),
            telemetry,
        }
    }
}

/// Turn a completed HTTP exchange into an outcome.
fn classify_response(response: &TransportResponse) -> ValidationOutcome {
    if !response.is_success() {
        info!(status = response.status, "Typeauth verification returned error status");
        return Denial::status(response.status).into();
    }

    let json = match response.json() {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "Typeauth verification response was not valid JSON");
            return Denial::malformed_response().into();
        }
    };

    let flag = |key: &str| json.get(key).and_then(Value::as_bool) == Some(true);
    if flag("success") && flag("valid") {
        debug!("Typeauth token accepted");
        ValidationOutcome::Authenticated
    } else {
        info!("Typeauth token rejected");
        Denial::authentication_failed().into()
    }
}
