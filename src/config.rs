// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines the per-route-group [`ValidationConfig`] and the
//! environment variables it can be loaded from. A config is built once when
//! the middleware is installed and is read-only afterwards.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `TYPEAUTH_APP_ID` | Tenant whose tokens are accepted | Required |
//! | `TYPEAUTH_BASE_URL` | Verification service base URL | `https://api.typeauth.com` |
//! | `TYPEAUTH_TOKEN_HEADER` | Header carrying `Bearer <token>` | `Authorization` |
//! | `TYPEAUTH_TELEMETRY` | Attach request telemetry (`true`/`false`) | `true` |
//! | `TYPEAUTH_MAX_RETRIES` | Attempts on transport failure (>= 1) | `3` |
//! | `TYPEAUTH_RETRY_DELAY_MS` | Wait between attempts in milliseconds | `1000` |
//! | `TYPEAUTH_REQUEST_TIMEOUT_SECS` | Timeout of a single attempt | `10` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::time::Duration;

use axum::http::HeaderName;
use url::Url;

pub const APP_ID_ENV: &str = "TYPEAUTH_APP_ID";
pub const BASE_URL_ENV: &str = "TYPEAUTH_BASE_URL";
pub const TOKEN_HEADER_ENV: &str = "TYPEAUTH_TOKEN_HEADER";
pub const TELEMETRY_ENV: &str = "TYPEAUTH_TELEMETRY";
pub const MAX_RETRIES_ENV: &str = "TYPEAUTH_MAX_RETRIES";
pub const RETRY_DELAY_MS_ENV: &str = "TYPEAUTH_RETRY_DELAY_MS";
pub const REQUEST_TIMEOUT_SECS_ENV: &str = "TYPEAUTH_REQUEST_TIMEOUT_SECS";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_ENDPOINT_BASE_URL: &str = "https://api.typeauth.com";
pub const DEFAULT_TOKEN_HEADER: &str = "Authorization";
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MILLIS: u64 = 1000;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Immutable settings for one protected route group.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    endpoint_base_url: String,
    app_id: String,
    token_header: HeaderName,
    telemetry_enabled: bool,
    max_retries: u32,
    retry_delay: Duration,
    request_timeout: Duration,
}

impl ValidationConfig {
    /// Start a builder with every optional setting at its default.
    pub fn builder(app_id: impl Into<String>) -> ValidationConfigBuilder {
        ValidationConfigBuilder {
            app_id: app_id.into(),
            endpoint_base_url: DEFAULT_ENDPOINT_BASE_URL.to_string(),
            token_header_name: DEFAULT_TOKEN_HEADER.to_string(),
            telemetry_enabled: true,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_millis: DEFAULT_RETRY_DELAY_MILLIS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Unset and blank variables fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let app_id = get(APP_ID_ENV).ok_or(ConfigError::Missing(APP_ID_ENV))?;
        let mut builder = Self::builder(app_id);

        if let Some(base_url) = get(BASE_URL_ENV) {
            builder = builder.endpoint_base_url(base_url);
        }
        if let Some(header) = get(TOKEN_HEADER_ENV) {
            builder = builder.token_header_name(header);
        }
        if let Some(raw) = get(TELEMETRY_ENV) {
            let enabled = parse_bool(&raw).ok_or(ConfigError::Invalid(TELEMETRY_ENV))?;
            builder = builder.telemetry_enabled(enabled);
        }
        if let Some(raw) = get(MAX_RETRIES_ENV) {
            let retries = raw
                .parse::<u32>()
                .map_err(|_| ConfigError::Invalid(MAX_RETRIES_ENV))?;
            builder = builder.max_retries(retries);
        }
        if let Some(raw) = get(RETRY_DELAY_MS_ENV) {
            let millis = raw
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid(RETRY_DELAY_MS_ENV))?;
            builder = builder.retry_delay_millis(millis);
        }
        if let Some(raw) = get(REQUEST_TIMEOUT_SECS_ENV) {
            let secs = raw
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid(REQUEST_TIMEOUT_SECS_ENV))?;
            builder = builder.request_timeout(Duration::from_secs(secs));
        }

        builder.build()
    }

    pub fn endpoint_base_url(&self) -> &str {
        &self.endpoint_base_url
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn token_header(&self) -> &HeaderName {
        &self.token_header
    }

    pub fn telemetry_enabled(&self) -> bool {
        self.telemetry_enabled
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Full URL of the verification endpoint.
    pub fn authenticate_url(&self) -> String {
        format!("{}/authenticate", self.endpoint_base_url)
    }
}

/// Builder for [`ValidationConfig`]; validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct ValidationConfigBuilder {
    app_id: String,
    endpoint_base_url: String,
    token_header_name: String,
    telemetry_enabled: bool,
    max_retries: u32,
    retry_delay_millis: u64,
    request_timeout: Duration,
}

impl ValidationConfigBuilder {
    pub fn endpoint_base_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_base_url = url.into();
        self
    }

    pub fn token_header_name(mut self, name: impl Into<String>) -> Self {
        self.token_header_name = name.into();
        self
    }

    pub fn telemetry_enabled(mut self, enabled: bool) -> Self {
        self.telemetry_enabled = enabled;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn retry_delay_millis(mut self, millis: u64) -> Self {
        self.retry_delay_millis = millis;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ValidationConfig, ConfigError> {
        let app_id = self.app_id.trim().to_string();
        if app_id.is_empty() {
            return Err(ConfigError::Missing("app_id"));
        }

        if self.max_retries == 0 {
            return Err(ConfigError::Invalid("max_retries"));
        }

        let endpoint_base_url = self.endpoint_base_url.trim().trim_end_matches('/').to_string();
        let parsed =
            Url::parse(&endpoint_base_url).map_err(|_| ConfigError::Invalid("endpoint_base_url"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid("endpoint_base_url"));
        }

        let token_header = HeaderName::from_bytes(self.token_header_name.trim().as_bytes())
            .map_err(|_| ConfigError::Invalid("token_header_name"))?;

        Ok(ValidationConfig {
            endpoint_base_url,
            app_id,
            token_header,
            telemetry_enabled: self.telemetry_enabled,
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_millis),
            request_timeout: self.request_timeout,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
