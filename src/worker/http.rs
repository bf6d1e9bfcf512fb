// ABOUTME: HTTP invocation surface — OPTIONS/POST handling per spec.md §6
// ABOUTME: Grounded on the teacher's routes/dashboard.rs Router-per-concern style

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{run_invocation, WorkerDeps};

/// Advisory body field signalling a self-hand-off continuation; present only
/// on the request a yielded invocation fires at itself (spec.md §6
/// "`POST` body is ignored except when signalling a self-hand-off").
#[derive(Debug, Default, Deserialize)]
struct InvocationRequest {
    #[serde(default)]
    #[allow(dead_code)]
    continuation: bool,
}

async fn health() -> &'static str {
    "ok"
}

/// `POST /invoke`: claim and drive one job (spec.md §6). The body is parsed
/// best-effort and otherwise ignored — a missing or malformed body is not an
/// error, since the only field the contract defines is advisory.
async fn invoke(State(deps): State<Arc<WorkerDeps>>, body: axum::body::Bytes) -> Response {
    let _request: InvocationRequest = serde_json::from_slice(&body).unwrap_or_default();
    let response = run_invocation(&deps).await;
    info!(success = response.success, status = ?response.status, "invocation complete");
    (StatusCode::OK, Json(response)).into_response()
}

/// `OPTIONS *`: permissive CORS preflight answer (spec.md §6 "`OPTIONS` →
/// 204 with permissive CORS headers").
async fn cors_preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Build the worker's router. `/invoke` answers `POST` and `OPTIONS`;
/// axum's `MethodRouter` answers any other method with its default 405
/// (spec.md §6).
#[must_use]
pub fn router(deps: Arc<WorkerDeps>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/invoke", post(invoke).options(cors_preflight))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(deps)
}

/// Default permissive CORS header set, kept as a named constant for callers
/// that build their own response outside the router (spec.md §6).
pub const CORS_ALLOW_ORIGIN: HeaderValue = HeaderValue::from_static("*");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_allow_origin_is_wildcard() {
        assert_eq!(CORS_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    }
}
