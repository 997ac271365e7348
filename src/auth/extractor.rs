// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer credential extraction and the downstream `Typeauth` extractor.
//!
//! Handlers behind the gate read the authentication result like this:
//!
//! ```rust,ignore
//! async fn my_handler(Typeauth(authenticated): Typeauth) -> impl IntoResponse {
//!     // authenticated is always true here
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, HeaderName},
};

use super::outcome::Denial;
use crate::error::ApiError;

/// Scheme prefix expected in the credential header. Case-sensitive.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Name under which the authentication result is exposed downstream.
pub const CONTEXT_KEY: &str = "typeauth";

/// Pull the token out of a raw header value.
///
/// Returns `None` for an absent value or anything not starting with exactly
/// `"Bearer "`. The token may be empty.
pub fn extract_bearer(value: Option<&str>) -> Option<&str> {
    value?.strip_prefix(BEARER_PREFIX)
}

/// Apply [`extract_bearer`] to the named header. Non-UTF-8 values count as missing.
pub fn bearer_from_headers<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    extract_bearer(headers.get(name).and_then(|v| v.to_str().ok()))
}

/// Authentication result placed in request extensions by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Typeauth(pub bool);

impl<S> FromRequestParts<S> for Typeauth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Typeauth>()
            .copied()
            .ok_or_else(|| Denial::missing_credential().into())
    }
}
