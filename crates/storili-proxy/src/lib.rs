//! Public edge proxy that hands out short-lived session credentials.
//!
//! Clients name a story (or an allowlisted agent); the proxy resolves it
//! through an [`AccessPolicy`](policy::AccessPolicy) loaded once at startup
//! and asks the platform for a credential with the server-held API key. The
//! key and the platform's full response never reach the caller.

pub mod api;
pub mod config;
pub mod policy;

use api::ProxyError;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use policy::AccessPolicy;
use serde_json::{json, Value};
use std::any::Any;
use std::sync::Arc;
use storili_platform::{CredentialKind, TokenIssuer};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Maximum request body size (16 KiB). Token requests are a few bytes.
const MAX_REQUEST_BODY_BYTES: usize = 16 * 1024;

/// State shared across all request handlers. Read-only after startup.
pub struct ProxyState<T> {
    pub policy: AccessPolicy,
    pub issuer: Arc<T>,
    /// Credential handed back to callers.
    pub kind: CredentialKind,
}

impl<T> ProxyState<T> {
    pub fn new(policy: AccessPolicy, issuer: Arc<T>, kind: CredentialKind) -> Self {
        Self {
            policy,
            issuer,
            kind,
        }
    }
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("request handler panicked");
    ProxyError::Internal.into_response()
}

/// Builds the application router.
///
/// The CORS layer answers every `OPTIONS` request as a preflight, so the
/// token route only routes `POST` itself.
pub fn app<T: TokenIssuer + 'static>(state: ProxyState<T>) -> Router {
    Router::new()
        .route(
            "/",
            post(api::issue_handler::<T>).fallback(api::method_not_allowed),
        )
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(Extension(Arc::new(state)))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(AnyOrigin)
                .allow_methods([Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE]),
        )
}
