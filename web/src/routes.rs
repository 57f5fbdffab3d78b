//! Router configuration.

use crate::handlers::{health, records, sse};
use crate::state::AppState;
use axum::{Router, extract::Request, http::HeaderName, routing::get};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// Header carrying the per-request identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the complete Axum router.
///
/// Routes:
/// - `GET /health`
/// - `GET /metrics`
/// - `GET /v1/records`
/// - `GET /v1/records/parallel`
/// - `GET /v1/records/sse/name`
/// - `GET /v1/records/:id`
///
/// Every request gets an `x-request-id` (kept if the client sent one),
/// recorded in its trace span and echoed on the response.
pub fn build_router(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let api_routes = Router::new()
        .route("/records", get(records::list_records))
        .route("/records/parallel", get(sse::fan_out))
        .route("/records/sse/name", get(sse::heartbeat))
        .route("/records/:id", get(records::get_record));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .nest("/v1", api_routes)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(request_span))
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
}

/// Span for one request, tagged with its request id.
fn request_span(request: &Request) -> tracing::Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}
