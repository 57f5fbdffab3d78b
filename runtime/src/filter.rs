//! Filter stage.

use crate::RecordStream;
use crate::probe::Probe;
use futures::{future, StreamExt};
use record_stream_core::diagnostics::PipelineEvent;
use record_stream_core::filter::FilterConfig;

/// Applies a [`FilterConfig`] to an upstream sequence.
///
/// Stateless and order-preserving. Rejected records are dropped before any
/// later stage sees them, so they are never delayed. Errors pass through.
#[derive(Clone, Debug)]
pub struct FilterStage {
    config: FilterConfig,
}

impl FilterStage {
    /// Create a stage for `config`.
    #[must_use]
    pub const fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// The predicate configuration.
    #[must_use]
    pub const fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Wrap `upstream`.
    #[must_use]
    pub fn apply(self, upstream: RecordStream, probe: Probe) -> RecordStream {
        let config = self.config;
        upstream
            .filter(move |item| {
                let keep = match item {
                    Ok(record) => {
                        let keep = config.matches(record);
                        if keep {
                            probe.emit(PipelineEvent::Accepted { id: record.id() });
                        }
                        keep
                    }
                    Err(_) => true,
                };
                future::ready(keep)
            })
            .boxed()
    }
}
