// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer token validation against the Typeauth service.
//!
//! ## Auth Flow
//!
//! 1. Client sends `Authorization: Bearer <token>` (header name configurable)
//! 2. Gate:
//!    - Rejects immediately when no bearer token is present
//!    - POSTs `{ token, appID, telemetry? }` to `{base}/authenticate`
//!    - Retries only when the request never got a response
//!    - Accepts iff the service answers 2xx with `success` and `valid` true
//! 3. Accepted requests carry [`Typeauth`] in their extensions
//!
//! ## Security
//!
//! - Tokens are never logged
//! - Results are not cached; every request is validated
//! - Every failure becomes a `401` with `{ "error": "<message>" }`

pub mod client;
pub mod extractor;
pub mod middleware;
pub mod outcome;
pub mod telemetry;
pub mod validator;

pub use client::{HttpTransport, TransportError, VerificationTransport};
pub use extractor::{extract_bearer, Typeauth};
pub use middleware::{protect, typeauth_middleware};
pub use outcome::{Denial, DenialKind, ValidationOutcome};
pub use telemetry::{Clock, RequestContext, SystemClock, TelemetrySnapshot};
pub use validator::{Sleeper, TokioSleeper, Validator};
