// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Demo HTTP surface: a public health check and one protected route group.

use axum::{http::HeaderName, routing::get, Json, Router};
use serde::Serialize;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::auth::{extractor::CONTEXT_KEY, protect, Typeauth, Validator};

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Echo the authentication result set by the gate.
pub async fn whoami(Typeauth(authenticated): Typeauth) -> Json<serde_json::Value> {
    Json(serde_json::json!({ CONTEXT_KEY: authenticated }))
}

pub fn router(validator: Validator) -> Router {
    let v1_routes = protect(Router::new().route("/whoami", get(whoami)), validator);

    Router::new()
        .route("/health", get(health))
        .nest("/v1", v1_routes)
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
        .layer(CorsLayer::permissive())
}
