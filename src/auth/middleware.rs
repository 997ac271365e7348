// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Extracts the bearer token from the configured header, validates it with
//! the [`Validator`], and either rejects the request with
//! `401 { "error": "<message>" }` or inserts [`Typeauth`] into the request
//! extensions and continues.
//!
//! ```rust,ignore
//! let validator = Validator::new(ValidationConfig::builder("app_123").build()?)?;
//! let protected = auth::protect(Router::new().route("/me", get(me)), validator);
//! ```

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::extractor::{bearer_from_headers, Typeauth};
use super::outcome::Denial;
use super::telemetry::RequestContext;
use super::validator::Validator;
use crate::error::ApiError;

/// Put every route of `router` behind the gate.
pub fn protect<S>(router: Router<S>, validator: Validator) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(validator, typeauth_middleware))
}

/// Authentication middleware function.
///
/// A [`CancellationToken`] found in the request extensions is used to
/// abandon pending retries.
pub async fn typeauth_middleware(
    State(validator): State<Validator>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let token = match bearer_from_headers(&parts.headers, validator.config().token_header()) {
        Some(token) => token.to_string(),
        None => {
            debug!(
                header = %validator.config().token_header(),
                path = %parts.uri.path(),
                "Request without bearer token rejected"
            );
            return ApiError::from(Denial::missing_credential()).into_response();
        }
    };

    let context = RequestContext::from_parts(&parts);
    let cancel = parts
        .extensions
        .get::<CancellationToken>()
        .cloned()
        .unwrap_or_default();

    match validator
        .validate_with_cancel(&token, &context, &cancel)
        .await
        .into_result()
    {
        Ok(authenticated) => {
            parts.extensions.insert(Typeauth(authenticated));
            next.run(Request::from_parts(parts, body)).await
        }
        Err(denial) => {
            info!(
                kind = ?denial.kind(),
                docs = %denial.docs_url(),
                path = %parts.uri.path(),
                "Request denied by Typeauth"
            );
            ApiError::from(denial).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        routing::get,
        Json,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::client::{
        TransportError, TransportResponse, VerificationRequest, VerificationTransport,
    };
    use crate::auth::outcome::CANCELLED_MESSAGE;
    use crate::auth::validator::Sleeper;
    use crate::config::ValidationConfig;

    /// Answers every call with the same status and body.
    struct StubTransport {
        status: u16,
        body: Value,
        calls: AtomicUsize,
        last_token: std::sync::Mutex<Option<String>>,
    }

    impl StubTransport {
        fn new(status: u16, body: Value) -> Arc<Self> {
            Arc::new(Self {
                status,
                body,
                calls: AtomicUsize::new(0),
                last_token: std::sync::Mutex::new(None),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VerificationTransport for StubTransport {
        async fn post_json(
            &self,
            _url: &str,
            body: &VerificationRequest,
        ) -> Result<TransportResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_token.lock().unwrap() = Some(body.token.clone());
            Ok(TransportResponse::new(self.status, self.body.to_string()))
        }
    }

    /// Never gets a response back.
    #[derive(Default)]
    struct RefusingTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl VerificationTransport for RefusingTransport {
        async fn post_json(
            &self,
            _url: &str,
            _body: &VerificationRequest,
        ) -> Result<TransportResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(TransportError::Connect("connection refused".into()))
        }
    }

    struct PendingSleeper;

    #[async_trait]
    impl Sleeper for PendingSleeper {
        async fn sleep(&self, _duration: std::time::Duration) {
            std::future::pending::<()>().await;
        }
    }

    async fn whoami(Typeauth(authenticated): Typeauth) -> Json<Value> {
        Json(json!({ "typeauth": authenticated }))
    }

    fn app(config: ValidationConfig, transport: Arc<StubTransport>) -> Router {
        let validator = Validator::with_transport(config, transport);
        let protected = protect(Router::new().route("/whoami", get(whoami)), validator);
        Router::new()
            .route("/health", get(|| async { "ok" }))
            .nest("/v1", protected)
    }

    fn default_config() -> ValidationConfig {
        ValidationConfig::builder("app_123")
            .retry_delay_millis(0)
            .build()
            .unwrap()
    }

    fn accepting() -> Arc<StubTransport> {
        StubTransport::new(200, json!({ "success": true, "valid": true }))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get_whoami(authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/v1/whoami");
        if let Some(value) = authorization {
            builder = builder.header("Authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn missing_header_is_rejected_without_remote_call() {
        let transport = accepting();
        let (status, body) = send(app(default_config(), transport.clone()), get_whoami(None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Missing token" }));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn wrong_scheme_is_rejected_without_remote_call() {
        for value in ["Basic abc", "bearer abc", "Bearerabc"] {
            let transport = accepting();
            let (status, body) =
                send(app(default_config(), transport.clone()), get_whoami(Some(value))).await;

            assert_eq!(status, StatusCode::UNAUTHORIZED, "value: {value}");
            assert_eq!(body["error"], "Missing token");
            assert_eq!(transport.calls(), 0);
        }
    }

    #[tokio::test]
    async fn valid_token_reaches_handler() {
        let transport = accepting();
        let (status, body) = send(
            app(default_config(), transport.clone()),
            get_whoami(Some("Bearer tok_abc")),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "typeauth": true }));
        assert_eq!(transport.calls(), 1);
        assert_eq!(
            transport.last_token.lock().unwrap().as_deref(),
            Some("tok_abc")
        );
    }

    #[tokio::test]
    async fn invalid_token_is_rejected_with_service_message() {
        let transport = StubTransport::new(200, json!({ "success": false, "valid": false }));
        let (status, body) = send(
            app(default_config(), transport.clone()),
            get_whoami(Some("Bearer tok_abc")),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Typeauth authentication failed" }));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn service_error_status_is_rejected() {
        let transport = StubTransport::new(500, json!({ "message": "boom" }));
        let (status, body) = send(
            app(default_config(), transport.clone()),
            get_whoami(Some("Bearer tok_abc")),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "API request failed with status: 500");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn custom_header_name_is_used() {
        let config = ValidationConfig::builder("app_123")
            .token_header_name("X-Typeauth-Token")
            .build()
            .unwrap();

        let transport = accepting();
        let request = Request::builder()
            .uri("/v1/whoami")
            .header("X-Typeauth-Token", "Bearer tok_custom")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app(config.clone(), transport.clone()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(transport.calls(), 1);

        let transport = accepting();
        let (status, _) = send(app(config, transport.clone()), get_whoami(Some("Bearer tok"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn unprotected_routes_skip_the_gate() {
        let transport = accepting();
        let response = app(default_config(), transport.clone())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn cancellation_token_in_extensions_stops_retries() {
        let transport = Arc::new(RefusingTransport::default());
        let config = ValidationConfig::builder("app_123")
            .max_retries(3)
            .build()
            .unwrap();
        let validator = Validator::with_transport(config, transport.clone())
            .with_sleeper(Arc::new(PendingSleeper));
        let app = protect(Router::new().route("/whoami", get(whoami)), validator);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let request = Request::builder()
            .uri("/whoami")
            .header("Authorization", "Bearer tok_abc")
            .extension(cancel)
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(app, request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": CANCELLED_MESSAGE }));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }
}
