// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Typeauth Gate - bearer token validation middleware for Axum
//!
//! This crate guards axum route groups by validating bearer tokens against
//! the remote Typeauth service before requests reach their handlers.
//!
//! ## Modules
//!
//! - `api` - Demo routes (health check, protected `/v1` group)
//! - `auth` - Token extraction, remote validation and the middleware layer
//! - `config` - Per-route-group validation settings
//! - `error` - JSON error responses

pub mod api;
pub mod auth;
pub mod config;
pub mod error;

pub use auth::{protect, Typeauth, ValidationOutcome, Validator};
pub use config::{ConfigError, ValidationConfig};
