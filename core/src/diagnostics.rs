//! Per-pipeline diagnostic sink.
//!
//! Pipelines report what they do through an injected [`DiagnosticSink`]
//! instead of writing to shared global state. The default sink,
//! [`TracingSink`], turns events into `tracing` records at debug level; tests
//! inject a recording sink to assert on the sequence of events.

use crate::record::RecordId;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Which pipeline an event belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    /// Filtered, sorted, paginated query.
    Paginated,
    /// Parallel fan-out query.
    FanOut,
    /// Interval push stream.
    Heartbeat,
}

impl PipelineKind {
    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paginated => "paginated",
            Self::FanOut => "fan_out",
            Self::Heartbeat => "heartbeat",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something observable that happened inside a pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PipelineEvent {
    /// A record passed the filter stage.
    Accepted {
        /// Record that passed.
        id: RecordId,
    },
    /// A record was held back by the rate shaper.
    Delayed {
        /// Record being delayed.
        id: RecordId,
        /// Lane the record is travelling through, if partitioned.
        lane: Option<usize>,
        /// Applied delay.
        delay: Duration,
    },
    /// The ordering window buffered the filtered set and selected a page.
    Windowed {
        /// Records buffered for sorting.
        buffered: usize,
        /// Records selected for the page.
        selected: usize,
    },
    /// A lane finished its share of the work.
    LaneCompleted {
        /// Lane index.
        lane: usize,
        /// Records forwarded by the lane.
        forwarded: u64,
    },
    /// An interval tick was emitted.
    Tick {
        /// Tick sequence number.
        seq: u64,
    },
    /// The pipeline completed normally.
    Completed,
    /// The pipeline terminated with an error.
    Failed {
        /// Rendered error.
        error: String,
    },
}

/// Receiver of pipeline diagnostics.
///
/// Implementations must be cheap and non-blocking; they are called inline on
/// the pipeline's hot path.
pub trait DiagnosticSink: Send + Sync {
    /// Record one event for pipeline `kind`.
    fn record(&self, kind: PipelineKind, event: PipelineEvent);
}

/// Shared handle to a sink.
pub type SharedSink = Arc<dyn DiagnosticSink>;

/// Sink that forwards events to `tracing` at debug level.
#[derive(Copy, Clone, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, kind: PipelineKind, event: PipelineEvent) {
        match event {
            PipelineEvent::Accepted { id } => {
                tracing::debug!(pipeline = %kind, record_id = %id, "Record accepted");
            }
            PipelineEvent::Delayed { id, lane, delay } => {
                tracing::debug!(
                    pipeline = %kind,
                    record_id = %id,
                    lane = ?lane,
                    delay = ?delay,
                    "Record delayed"
                );
            }
            PipelineEvent::Windowed { buffered, selected } => {
                tracing::debug!(pipeline = %kind, buffered, selected, "Page selected");
            }
            PipelineEvent::LaneCompleted { lane, forwarded } => {
                tracing::debug!(pipeline = %kind, lane, forwarded, "Lane completed");
            }
            PipelineEvent::Tick { seq } => {
                tracing::debug!(pipeline = %kind, seq, "Tick emitted");
            }
            PipelineEvent::Completed => {
                tracing::debug!(pipeline = %kind, "Completed");
            }
            PipelineEvent::Failed { error } => {
                tracing::warn!(pipeline = %kind, error = %error, "Pipeline failed");
            }
        }
    }
}

/// Sink that drops every event.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn record(&self, _kind: PipelineKind, _event: PipelineEvent) {}
}
