//! Record-stream HTTP server.
//!
//! Seeds an in-memory catalog, builds the pipelines and serves them through
//! the web router.

pub mod config;

use axum::Router;
use config::Config;
use metrics_exporter_prometheus::PrometheusHandle;
use record_stream_core::store::InMemoryRecordStore;
use record_stream_runtime::Pipelines;
use record_stream_web::{AppState, build_router};
use std::sync::Arc;

/// Build the application router from `config`.
///
/// `metrics` enables the `/metrics` endpoint.
#[must_use]
pub fn build_app(config: &Config, metrics: Option<PrometheusHandle>) -> Router {
    let store = InMemoryRecordStore::articles(config.catalog_size);
    tracing::info!(records = store.len(), "Catalog seeded");

    let pipelines = Pipelines::new(Arc::new(store), config.pipeline.clone());
    let state = AppState::new(pipelines);
    let state = match metrics {
        Some(handle) => state.with_metrics(handle),
        None => state,
    };
    build_router(state)
}
