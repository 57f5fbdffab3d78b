//! Prometheus metrics for the record pipelines.
//!
//! Counters go through the `metrics` facade. Without an installed recorder
//! every call is a no-op, so pipelines record unconditionally.
//!
//! # Example
//!
//! ```rust,no_run
//! use record_stream_runtime::metrics;
//!
//! # fn example() -> Result<(), metrics::MetricsError> {
//! let handle = metrics::install_prometheus()?;
//! metrics::record_tick();
//! println!("{}", handle.render());
//! # Ok(())
//! # }
//! ```

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use record_stream_core::diagnostics::PipelineKind;
use record_stream_core::error::PipelineError;
use thiserror::Error;

/// Records delivered to consumers, labelled by `pipeline`.
pub const RECORDS_EMITTED: &str = "record_stream_records_emitted_total";

/// Terminal pipeline errors, labelled by `kind`.
pub const PIPELINE_ERRORS: &str = "record_stream_pipeline_errors_total";

/// Ticks produced by interval emitters.
pub const TICKS_EMITTED: &str = "record_stream_ticks_emitted_total";

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to install the Prometheus recorder
    #[error("Failed to install metrics recorder: {0}")]
    Install(String),
}

/// Install the Prometheus recorder as the global recorder.
///
/// # Errors
///
/// Returns `MetricsError::Install` if a recorder is already installed.
pub fn install_prometheus() -> Result<PrometheusHandle, MetricsError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::Install(e.to_string()))?;
    describe();
    tracing::info!("Prometheus recorder installed");
    Ok(handle)
}

/// Register metric descriptions with the installed recorder.
pub fn describe() {
    describe_counter!(RECORDS_EMITTED, "Total number of records delivered to consumers");
    describe_counter!(PIPELINE_ERRORS, "Total number of pipelines ended by an error");
    describe_counter!(TICKS_EMITTED, "Total number of interval ticks emitted");
}

/// Count one record delivered by a `kind` pipeline.
pub fn record_emitted(kind: PipelineKind) {
    counter!(RECORDS_EMITTED, "pipeline" => kind.as_str()).increment(1);
}

/// Count one terminal error.
pub fn record_error(err: &PipelineError) {
    counter!(PIPELINE_ERRORS, "kind" => err.kind()).increment(1);
}

/// Count one tick.
pub fn record_tick() {
    counter!(TICKS_EMITTED).increment(1);
}
