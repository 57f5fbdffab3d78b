//! Rate shaper stage.
//!
//! Simulates slow production by holding every forwarded record for a fixed
//! delay. The wait is a `tokio::time::sleep` registered with the runtime's
//! timer, so the worker thread is free to drive other lanes and requests while
//! a record is held. Dropping the stream drops the pending sleep, which
//! releases its timer entry.

use crate::RecordStream;
use crate::partition::LaneStage;
use crate::probe::Probe;
use futures::future::{self, BoxFuture};
use futures::StreamExt;
use record_stream_core::diagnostics::PipelineEvent;
use record_stream_core::error::PipelineResult;
use record_stream_core::record::Record;
use std::time::Duration;

/// Fixed per-record delay.
///
/// A zero delay is a pass-through: no timer is registered.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RateShaper {
    delay: Duration,
}

impl RateShaper {
    /// Create a shaper holding each record for `delay`.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// The configured delay.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Whether this shaper forwards records untouched.
    #[must_use]
    pub const fn is_passthrough(&self) -> bool {
        self.delay.is_zero()
    }

    /// Delay every record of `upstream`, one at a time, in order.
    ///
    /// The last record is delayed like any other before the stream completes.
    /// Errors are forwarded immediately.
    #[must_use]
    pub fn shape(self, upstream: RecordStream, probe: Probe) -> RecordStream {
        if self.is_passthrough() {
            return upstream;
        }
        upstream
            .then(move |item| {
                let hold = match &item {
                    Ok(record) => Some(self.hold(record, None, &probe)),
                    Err(_) => None,
                };
                async move {
                    if let Some(hold) = hold {
                        hold.await;
                    }
                    item
                }
            })
            .boxed()
    }

    /// Timer future for one record.
    fn hold(self, record: &Record, lane: Option<usize>, probe: &Probe) -> tokio::time::Sleep {
        probe.emit(PipelineEvent::Delayed {
            id: record.id(),
            lane,
            delay: self.delay,
        });
        tokio::time::sleep(self.delay)
    }
}

impl LaneStage for RateShaper {
    fn process(
        &self,
        lane: usize,
        record: Record,
        probe: &Probe,
    ) -> BoxFuture<'static, PipelineResult<Record>> {
        if self.is_passthrough() {
            return Box::pin(future::ready(Ok(record)));
        }
        let hold = self.hold(&record, Some(lane), probe);
        Box::pin(async move {
            hold.await;
            Ok(record)
        })
    }
}
