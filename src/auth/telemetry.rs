// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request telemetry attached to verification calls.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::{
    extract::ConnectInfo,
    http::{header::HOST, request::Parts, HeaderMap},
};
use serde::Serialize;

/// Header set by Cloudflare with the original client address.
pub const CF_CONNECTING_IP: &str = "cf-connecting-ip";
const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Source of wall-clock time in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// The parts of an inbound request the validator may report.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub url: String,
    pub method: String,
    pub headers: HeaderMap,
    pub client_ip: String,
}

impl RequestContext {
    /// Capture the context of an inbound request.
    pub fn from_parts(parts: &Parts) -> Self {
        let connect_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Self {
            url: request_url(parts),
            method: parts.method.to_string(),
            headers: parts.headers.clone(),
            client_ip: client_ip(&parts.headers).or(connect_ip).unwrap_or_default(),
        }
    }
}

/// Telemetry payload sent alongside the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TelemetrySnapshot {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub ipaddress: String,
    pub timestamp: i64,
}

impl TelemetrySnapshot {
    pub fn capture(context: &RequestContext, clock: &dyn Clock) -> Self {
        Self {
            url: context.url.clone(),
            method: context.method.clone(),
            headers: collapse_headers(&context.headers),
            ipaddress: context.client_ip.clone(),
            timestamp: clock.now_millis(),
        }
    }
}

/// Flatten a header map; repeated headers are joined with `", "`.
///
/// Values that are not valid UTF-8 are converted lossily.
pub fn collapse_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .keys()
        .map(|name| {
            let joined = headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            (name.as_str().to_string(), joined)
        })
        .collect()
}

/// Best-effort client address from proxy headers.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header(CF_CONNECTING_IP)
        .or_else(|| {
            header(X_FORWARDED_FOR)
                .and_then(|v| v.split(',').next())
                .map(str::trim)
        })
        .map(str::to_string)
}

fn request_url(parts: &Parts) -> String {
    if parts.uri.scheme().is_some() {
        return parts.uri.to_string();
    }

    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    match parts.headers.get(HOST).and_then(|v| v.to_str().ok()) {
        Some(host) => {
            let scheme = parts
                .headers
                .get(X_FORWARDED_PROTO)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("http");
            format!("{scheme}://{host}{path}")
        }
        None => path.to_string(),
    }
}
