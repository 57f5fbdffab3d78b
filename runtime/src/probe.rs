//! Diagnostic probe carried through the stages of one pipeline.

use record_stream_core::diagnostics::{PipelineEvent, PipelineKind, SharedSink, TracingSink};
use std::fmt;
use std::sync::Arc;

/// A pipeline's view of its injected [`DiagnosticSink`](record_stream_core::DiagnosticSink).
///
/// Cloned into every stage of the pipeline it was created for; never shared
/// across pipelines.
#[derive(Clone)]
pub struct Probe {
    kind: PipelineKind,
    sink: SharedSink,
}

impl Probe {
    /// Create a probe for pipeline `kind` reporting into `sink`.
    #[must_use]
    pub fn new(kind: PipelineKind, sink: SharedSink) -> Self {
        Self { kind, sink }
    }

    /// Probe that logs through `tracing`.
    #[must_use]
    pub fn tracing(kind: PipelineKind) -> Self {
        Self::new(kind, Arc::new(TracingSink))
    }

    /// The pipeline this probe reports for.
    #[must_use]
    pub const fn kind(&self) -> PipelineKind {
        self.kind
    }

    /// Report an event.
    pub fn emit(&self, event: PipelineEvent) {
        self.sink.record(self.kind, event);
    }
}

impl fmt::Debug for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Probe")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
