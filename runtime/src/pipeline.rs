//! Pipeline composition.
//!
//! [`Pipelines`] wires the stages together for each delivery pattern:
//!
//! ```text
//! paginated:  source ─> filter ─> shaper ─> window ─> subscription
//! fan-out:    source ─> filter ─> partitioner[lanes: shaper] ─> subscription
//! heartbeat:  interval emitter ─> subscription
//! ```
//!
//! Every call builds a fresh, lazy pipeline. Nothing runs until the returned
//! [`Subscription`] receives demand.

use crate::demand::Subscription;
use crate::filter::FilterStage;
use crate::interval::{DEFAULT_TICK_INTERVAL, DEFAULT_TICK_MARKER, IntervalEmitter, Tick};
use crate::partition::{Partitioner, default_lanes};
use crate::probe::Probe;
use crate::shaper::RateShaper;
use crate::source::RecordSource;
use crate::window::OrderingWindow;
use crate::{RecordStream, metrics};
use futures::stream;
use futures::StreamExt;
use record_stream_core::diagnostics::{PipelineEvent, PipelineKind, SharedSink, TracingSink};
use record_stream_core::error::{PipelineError, PipelineResult};
use record_stream_core::filter::FilterConfig;
use record_stream_core::query::{FanOutQuery, PageQuery};
use record_stream_core::record::{Record, RecordId};
use record_stream_core::store::RecordStore;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

/// Default ceiling for the per-record delay: any non-negative delay is
/// accepted.
pub const DEFAULT_MAX_DELAY: Duration = Duration::MAX;

/// Runtime-facing configuration shared by every pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Number of fan-out lanes.
    pub lanes: NonZeroUsize,
    /// Period of the interval emitter.
    pub tick_interval: Duration,
    /// Suffix of each tick label.
    pub tick_marker: String,
    /// Largest accepted `delay` parameter. Unbounded by default.
    pub max_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lanes: default_lanes(),
            tick_interval: DEFAULT_TICK_INTERVAL,
            tick_marker: DEFAULT_TICK_MARKER.to_string(),
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

/// Builds pipelines over one record store.
///
/// Cheap to clone; meant to live in shared application state.
#[derive(Clone)]
pub struct Pipelines {
    store: Arc<dyn RecordStore>,
    source: RecordSource,
    config: Arc<PipelineConfig>,
    sink: SharedSink,
}

impl Pipelines {
    /// Create pipelines over `store`, reporting to a [`TracingSink`].
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, config: PipelineConfig) -> Self {
        Self {
            source: RecordSource::new(Arc::clone(&store)),
            store,
            config: Arc::new(config),
            sink: Arc::new(TracingSink),
        }
    }

    /// Replace the diagnostic sink.
    #[must_use]
    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    /// The shared configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn probe(&self, kind: PipelineKind) -> Probe {
        Probe::new(kind, Arc::clone(&self.sink))
    }

    /// Filtered, sorted, paginated records.
    ///
    /// The delay is applied to every filtered record before sorting, so the
    /// first page record is only available after `delay * filtered_count`.
    #[must_use]
    pub fn paginated(&self, query: &PageQuery) -> Subscription<Record> {
        let probe = self.probe(PipelineKind::Paginated);
        tracing::debug!(
            name_filter = ?query.name_filter,
            page = query.page,
            size = query.size,
            delay = ?query.delay,
            "Building paginated pipeline"
        );

        let filtered = FilterStage::new(FilterConfig::paginated(query.name_filter.clone()))
            .apply(self.source.open(), probe.clone());
        let shaped = RateShaper::new(query.delay).shape(filtered, probe.clone());
        let page = OrderingWindow::for_query(query).apply(shaped, probe.clone());

        Subscription::new(observed(page, probe))
    }

    /// Records matching the name filter, shaped across parallel lanes.
    ///
    /// Unordered. Lanes are only spawned once the subscription is first
    /// polled with demand.
    #[must_use]
    pub fn fan_out(&self, query: &FanOutQuery) -> Subscription<Record> {
        let probe = self.probe(PipelineKind::FanOut);
        let filter = FilterConfig::fan_out(query.name_filter.clone());
        tracing::debug!(
            name_filter = ?query.name_filter,
            delay = ?query.delay,
            lanes = self.config.lanes.get(),
            "Building fan-out pipeline"
        );

        if filter.rejects_everything() {
            return Subscription::new(observed(stream::empty().boxed(), probe));
        }

        let filtered = FilterStage::new(filter).apply(self.source.open(), probe.clone());
        let partitioner = Partitioner::new(self.config.lanes, RateShaper::new(query.delay));
        let lane_probe = probe.clone();
        let merged = stream::once(async move { partitioner.apply(filtered, lane_probe) })
            .flatten()
            .boxed();

        Subscription::new(observed(merged, probe))
    }

    /// Infinite tick stream at the configured period.
    #[must_use]
    pub fn heartbeat(&self) -> Subscription<Tick> {
        let emitter = IntervalEmitter::new(self.config.tick_interval, self.config.tick_marker.clone());
        let ticks = emitter.ticks(self.probe(PipelineKind::Heartbeat)).map(Ok).boxed();
        Subscription::new(ticks)
    }

    /// Look up a single record.
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` if no record has `id`, or `StoreUnavailable`
    /// if the store fails.
    pub async fn find(&self, id: RecordId) -> PipelineResult<Record> {
        let found = self.store.find_by_id(id).await;
        let result = found
            .map_err(PipelineError::from)
            .and_then(|record| record.ok_or(PipelineError::RecordNotFound { id }));
        if let Err(err) = &result {
            metrics::record_error(err);
        }
        result
    }
}

impl std::fmt::Debug for Pipelines {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipelines")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Count deliveries, report completion or failure, and stop after the first
/// error.
fn observed(stream: RecordStream, probe: Probe) -> RecordStream {
    async_stream::stream! {
        let mut stream = stream;
        while let Some(item) = stream.next().await {
            match item {
                Ok(record) => {
                    metrics::record_emitted(probe.kind());
                    yield Ok(record);
                }
                Err(err) => {
                    metrics::record_error(&err);
                    tracing::warn!(pipeline = %probe.kind(), error = %err, "Pipeline failed");
                    probe.emit(PipelineEvent::Failed { error: err.to_string() });
                    yield Err(err);
                    return;
                }
            }
        }
        probe.emit(PipelineEvent::Completed);
    }
    .boxed()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use record_stream_core::store::InMemoryRecordStore;

    fn pipelines(n: u32) -> Pipelines {
        let config = PipelineConfig {
            lanes: NonZeroUsize::new(4).unwrap(),
            ..PipelineConfig::default()
        };
        Pipelines::new(Arc::new(InMemoryRecordStore::articles(n)), config)
    }

    fn ids(records: &[Record]) -> Vec<i64> {
        records.iter().map(|r| r.id().value()).collect()
    }

    #[tokio::test]
    async fn paginated_third_page() {
        let query = PageQuery {
            name_filter: Some("article".into()),
            page: 2,
            size: 10,
            ..PageQuery::default()
        };
        let page = pipelines(100).paginated(&query).collect_all().await.unwrap();
        assert_eq!(ids(&page), (20..30).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn paginated_without_filter_is_first_page() {
        let page = pipelines(100)
            .paginated(&PageQuery::default())
            .collect_all()
            .await
            .unwrap();
        assert_eq!(ids(&page), (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn fan_out_matches_digit_two() {
        let query = FanOutQuery {
            name_filter: Some("2".into()),
            ..FanOutQuery::default()
        };
        let records = pipelines(100).fan_out(&query).collect_all().await.unwrap();
        assert_eq!(records.len(), 19);
        assert!(records.iter().all(|r| r.name().contains('2')));
    }

    #[tokio::test]
    async fn fan_out_without_filter_is_empty() {
        let records = pipelines(100)
            .fan_out(&FanOutQuery::default())
            .collect_all()
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn find_existing_and_missing() {
        let pipelines = pipelines(5);
        let found = pipelines.find(RecordId::new(3)).await.unwrap();
        assert_eq!(found.name(), "article3");

        let missing = pipelines.find(RecordId::new(99)).await.unwrap_err();
        assert_eq!(missing.to_string(), "Record not found by id= 99");
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_uses_configured_marker() {
        let config = PipelineConfig {
            tick_marker: "|".into(),
            ..PipelineConfig::default()
        };
        let pipelines = Pipelines::new(Arc::new(InMemoryRecordStore::default()), config);
        let mut ticks = pipelines.heartbeat();
        ticks.request(2);
        assert_eq!(ticks.next().await.unwrap().unwrap().label, "artname0|");
        assert_eq!(ticks.next().await.unwrap().unwrap().label, "artname1|");
    }
}
