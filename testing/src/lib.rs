//! # Record Stream Testing
//!
//! Testing utilities and fixtures for record-stream pipelines.
//!
//! This crate provides:
//! - Catalog fixtures
//! - Failing collaborators for error paths
//! - A recording diagnostic sink
//! - Property-based testing strategies
//!
//! ## Example
//!
//! ```
//! use record_stream_testing::fixtures::article_store;
//!
//! let store = article_store(100);
//! assert_eq!(store.len(), 100);
//! ```

/// Catalog fixtures.
pub mod fixtures {
    use record_stream_core::record::Record;
    use record_stream_core::store::InMemoryRecordStore;

    /// `count` active records `article0..article{count-1}`, ids `0..count`.
    #[must_use]
    pub fn article_store(count: u32) -> InMemoryRecordStore {
        InMemoryRecordStore::articles(count)
    }

    /// Records exercising every filter branch.
    ///
    /// | id | name | active |
    /// |---|---|---|
    /// | 1 | article1 | yes |
    /// | 2 | article2 | no |
    /// | 3 | other3 | yes |
    /// | 4 | article4 | yes |
    /// | 5 | other5 | no |
    /// | 12 | article12 | yes |
    #[must_use]
    pub fn mixed_records() -> Vec<Record> {
        vec![
            Record::new(1, "article1", true),
            Record::new(2, "article2", false),
            Record::new(3, "other3", true),
            Record::new(4, "article4", true),
            Record::new(5, "other5", false),
            Record::new(12, "article12", true),
        ]
    }

    /// Store holding [`mixed_records`].
    #[must_use]
    pub fn mixed_store() -> InMemoryRecordStore {
        InMemoryRecordStore::from_records(mixed_records())
    }
}

/// Mock collaborators.
pub mod mocks {
    use futures::future::{self, BoxFuture};
    use futures::stream::{self, StreamExt};
    use record_stream_core::diagnostics::{DiagnosticSink, PipelineEvent, PipelineKind};
    use record_stream_core::error::{PipelineError, PipelineResult, StoreError};
    use record_stream_core::record::{Record, RecordId};
    use record_stream_core::store::{LookupFuture, RecordScan, RecordStore};
    use record_stream_runtime::partition::LaneStage;
    use record_stream_runtime::probe::Probe;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex, PoisonError};
    use std::time::Duration;

    /// Store that serves `healthy` records and then fails.
    ///
    /// With no healthy records, the scan fails immediately.
    #[derive(Clone, Debug, Default)]
    pub struct UnavailableStore {
        healthy: Vec<Record>,
    }

    impl UnavailableStore {
        /// Store failing on first access.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Store yielding `healthy` before failing.
        #[must_use]
        pub const fn after(healthy: Vec<Record>) -> Self {
            Self { healthy }
        }

        fn error() -> StoreError {
            StoreError::Unavailable("connection refused".into())
        }
    }

    impl RecordStore for UnavailableStore {
        fn scan_all(&self) -> RecordScan {
            stream::iter(self.healthy.clone().into_iter().map(Ok))
                .chain(stream::once(future::ready(Err(Self::error()))))
                .boxed()
        }

        fn find_by_id(&self, _id: RecordId) -> LookupFuture {
            Box::pin(future::ready(Err(Self::error())))
        }
    }

    /// Lane stage that fails on one record and delays the others.
    #[derive(Debug)]
    pub struct FailingLaneStage {
        fail_on: RecordId,
        delay: Duration,
        processed: Arc<AtomicUsize>,
    }

    impl FailingLaneStage {
        /// Fail when `fail_on` reaches a lane; hold other records for `delay`.
        #[must_use]
        pub fn new(fail_on: impl Into<RecordId>, delay: Duration) -> Self {
            Self {
                fail_on: fail_on.into(),
                delay,
                processed: Arc::new(AtomicUsize::new(0)),
            }
        }

        /// Shared counter of records that completed processing.
        #[must_use]
        pub fn processed(&self) -> Arc<AtomicUsize> {
            Arc::clone(&self.processed)
        }
    }

    impl LaneStage for FailingLaneStage {
        fn process(
            &self,
            _lane: usize,
            record: Record,
            _probe: &Probe,
        ) -> BoxFuture<'static, PipelineResult<Record>> {
            if record.id() == self.fail_on {
                let reason = format!("record {} is poisoned", record.id());
                return Box::pin(future::ready(Err(PipelineError::invalid("record", reason))));
            }
            let delay = self.delay;
            let processed = Arc::clone(&self.processed);
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                processed.fetch_add(1, Ordering::SeqCst);
                Ok(record)
            })
        }
    }

    /// Diagnostic sink that keeps every event in memory.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        events: Mutex<Vec<(PipelineKind, PipelineEvent)>>,
    }

    impl RecordingSink {
        /// Create an empty sink.
        #[must_use]
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Every event recorded so far, in order.
        #[must_use]
        pub fn events(&self) -> Vec<(PipelineKind, PipelineEvent)> {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Number of recorded events matching `predicate`.
        pub fn count(&self, predicate: impl Fn(&PipelineEvent) -> bool) -> usize {
            self.events().iter().filter(|(_, e)| predicate(e)).count()
        }
    }

    impl DiagnosticSink for RecordingSink {
        fn record(&self, kind: PipelineKind, event: PipelineEvent) {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((kind, event));
        }
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// Valid `(page, size)` pairs, including pages past the end of a
    /// 100-record catalog.
    pub fn page_and_size() -> impl Strategy<Value = (u64, u64)> {
        (0_u64..30, 1_u64..40)
    }

    /// Optional name filters drawn from digits and catalog prefixes.
    pub fn name_filter() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            "[0-9]{1,2}".prop_map(Some),
            Just(Some("article".to_string())),
            Just(Some("missing".to_string())),
        ]
    }
}

/// Install a `tracing` subscriber writing through the test harness.
///
/// Safe to call from every test; only the first call takes effect.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("record_stream=debug")
        .try_init();
}

pub use fixtures::{article_store, mixed_store};
pub use mocks::{FailingLaneStage, RecordingSink, UnavailableStore};

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use record_stream_core::store::RecordStore;

    #[tokio::test]
    async fn unavailable_store_fails_after_healthy_records() {
        let store = UnavailableStore::after(fixtures::mixed_records());
        let items: Vec<_> = store.scan_all().collect().await;
        assert_eq!(items.len(), 7);
        assert!(items.last().unwrap().is_err());
    }

    #[test]
    fn mixed_store_is_ordered_by_id() {
        assert_eq!(mixed_store().len(), 6);
    }
}
