//! Application state for Axum handlers.

use metrics_exporter_prometheus::PrometheusHandle;
use record_stream_runtime::Pipelines;

/// Application state shared across all HTTP handlers.
///
/// Cheap to clone: every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    pipelines: Pipelines,
    metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create state serving `pipelines`, without a metrics endpoint.
    #[must_use]
    pub const fn new(pipelines: Pipelines) -> Self {
        Self {
            pipelines,
            metrics: None,
        }
    }

    /// Serve Prometheus exposition from `handle` on `/metrics`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Pipeline builder.
    #[must_use]
    pub const fn pipelines(&self) -> &Pipelines {
        &self.pipelines
    }

    /// Installed metrics recorder, if any.
    #[must_use]
    pub const fn metrics(&self) -> Option<&PrometheusHandle> {
        self.metrics.as_ref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("pipelines", &self.pipelines)
            .field("metrics_enabled", &self.metrics.is_some())
            .finish()
    }
}
