//! Liveness and metrics endpoints.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode};

/// Liveness probe.
///
/// ```text
/// GET /health
/// ```
///
/// Does not touch the record store.
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Prometheus exposition.
///
/// ```text
/// GET /metrics
/// ```
///
/// Returns 404 when no recorder was installed.
#[allow(clippy::unused_async)]
pub async fn metrics(State(state): State<AppState>) -> (StatusCode, String) {
    match state.metrics() {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics disabled".to_string()),
    }
}
