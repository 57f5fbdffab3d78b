//! Interval emitter for push delivery.
//!
//! Ticks are produced lazily: the timer for tick `k + 1` is only awaited once
//! the consumer has pulled tick `k`. A consumer slower than the period
//! therefore delays emission instead of losing ticks, and missed periods are
//! not replayed as a burst.

use crate::probe::Probe;
use futures::stream::BoxStream;
use futures::StreamExt;
use record_stream_core::diagnostics::PipelineEvent;
use std::fmt;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Reference period between ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Reference suffix appended to each tick label.
pub const DEFAULT_TICK_MARKER: &str = "<br>";

/// Prefix of each tick label.
pub const TICK_PREFIX: &str = "artname";

/// Shortest accepted period.
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// One emitted unit of the push stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tick {
    /// Sequence number, starting at 0.
    pub seq: u64,
    /// Rendered label, `artname<seq><marker>`.
    pub label: String,
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Infinite, cancellable tick stream.
///
/// # Examples
///
/// ```
/// use record_stream_runtime::interval::IntervalEmitter;
/// use std::time::Duration;
///
/// let emitter = IntervalEmitter::new(Duration::from_secs(1), "<br>");
/// assert_eq!(emitter.label(3), "artname3<br>");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntervalEmitter {
    period: Duration,
    marker: String,
}

impl IntervalEmitter {
    /// Create an emitter ticking every `period`.
    ///
    /// Periods shorter than one millisecond are raised to one millisecond.
    #[must_use]
    pub fn new(period: Duration, marker: impl Into<String>) -> Self {
        Self {
            period: period.max(MIN_TICK_INTERVAL),
            marker: marker.into(),
        }
    }

    /// Period between ticks.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Render the label of tick `seq`.
    #[must_use]
    pub fn label(&self, seq: u64) -> String {
        format!("{TICK_PREFIX}{seq}{}", self.marker)
    }

    /// Start ticking. The first tick arrives one full period after the first
    /// poll. Dropping the stream stops the timer.
    #[must_use]
    pub fn ticks(&self, probe: Probe) -> BoxStream<'static, Tick> {
        let emitter = self.clone();
        async_stream::stream! {
            let mut timer = time::interval_at(Instant::now() + emitter.period, emitter.period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut seq = 0_u64;
            loop {
                timer.tick().await;
                probe.emit(PipelineEvent::Tick { seq });
                crate::metrics::record_tick();
                yield Tick {
                    seq,
                    label: emitter.label(seq),
                };
                seq += 1;
            }
        }
        .boxed()
    }
}

impl Default for IntervalEmitter {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL, DEFAULT_TICK_MARKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use record_stream_core::diagnostics::PipelineKind;

    #[test]
    fn label_format() {
        let emitter = IntervalEmitter::default();
        assert_eq!(emitter.label(0), "artname0<br>");
        assert_eq!(emitter.label(12), "artname12<br>");
    }

    #[test]
    fn zero_period_is_clamped() {
        let emitter = IntervalEmitter::new(Duration::ZERO, "");
        assert_eq!(emitter.period(), Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_after_one_period() {
        let emitter = IntervalEmitter::default();
        let mut ticks = emitter.ticks(Probe::tracing(PipelineKind::Heartbeat));
        let start = Instant::now();

        let first = ticks.next().await;
        assert_eq!(first.map(|t| t.seq), Some(0));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(1), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(1100), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_consumer_loses_nothing() {
        let emitter = IntervalEmitter::new(Duration::from_millis(100), "");
        let mut ticks = emitter.ticks(Probe::tracing(PipelineKind::Heartbeat));

        let mut seen = Vec::new();
        for _ in 0..5 {
            let tick = ticks.next().await;
            seen.push(tick.map(|t| t.seq));
            // Consumer is three periods slower than the producer.
            time::sleep(Duration::from_millis(300)).await;
        }
        assert_eq!(seen, vec![Some(0), Some(1), Some(2), Some(3), Some(4)]);
    }
}
