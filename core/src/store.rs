//! Record store collaborator.
//!
//! The pipeline only reads from the store. It needs an ordered full scan and
//! a lookup by identifier; storage itself is not its concern.
//!
//! # Implementations
//!
//! - [`InMemoryRecordStore`]: read-only snapshot held in a `BTreeMap`
//! - `UnavailableStore` (in `record-stream-testing`): always fails, for error paths

use crate::error::StoreError;
use crate::record::{Record, RecordId};
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::BTreeMap;
use std::future::Future;
use std::ops::Bound;
use std::pin::Pin;
use std::sync::Arc;

/// Ordered stream of records as produced by [`RecordStore::scan_all`].
pub type RecordScan = BoxStream<'static, Result<Record, StoreError>>;

/// Boxed future returned by [`RecordStore::find_by_id`].
pub type LookupFuture = Pin<Box<dyn Future<Output = Result<Option<Record>, StoreError>> + Send>>;

/// Read-only record store.
///
/// # Dyn Compatibility
///
/// Methods return boxed futures and streams so the store can be shared as
/// `Arc<dyn RecordStore>` between request handlers and pipelines.
pub trait RecordStore: Send + Sync {
    /// Scan every record in ascending identifier order.
    ///
    /// The returned stream is lazy and `'static`; it owns whatever it needs
    /// to outlive the borrow of `self`. A failing collaborator yields
    /// `Err(StoreError::Unavailable)` and then ends.
    fn scan_all(&self) -> RecordScan;

    /// Look up a single record.
    fn find_by_id(&self, id: RecordId) -> LookupFuture;
}

/// In-memory snapshot of the catalog.
///
/// Records are kept in a `BTreeMap` keyed by id, so the scan order always
/// matches identifier order. Cloning is cheap (shared snapshot).
///
/// # Examples
///
/// ```
/// use record_stream_core::record::Record;
/// use record_stream_core::store::InMemoryRecordStore;
///
/// let store = InMemoryRecordStore::from_records(vec![
///     Record::new(2, "b", true),
///     Record::new(1, "a", true),
/// ]);
/// assert_eq!(store.len(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryRecordStore {
    records: Arc<BTreeMap<RecordId, Record>>,
}

impl InMemoryRecordStore {
    /// Build a store from records. A later record with a duplicate id replaces
    /// the earlier one.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let records = records.into_iter().map(|r| (r.id(), r)).collect();
        Self {
            records: Arc::new(records),
        }
    }

    /// Build the demo catalog: `count` active records named `article0..`.
    #[must_use]
    pub fn articles(count: u32) -> Self {
        Self::from_records(
            (0..count).map(|i| Record::new(i64::from(i), format!("article{i}"), true)),
        )
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn scan_all(&self) -> RecordScan {
        let snapshot = Arc::clone(&self.records);
        // Resume after the last emitted key so the stream owns no borrow.
        stream::unfold(None, move |last: Option<RecordId>| {
            let next = match last {
                None => snapshot.values().next(),
                Some(id) => snapshot
                    .range((Bound::Excluded(id), Bound::Unbounded))
                    .next()
                    .map(|(_, record)| record),
            }
            .cloned();
            async move {
                next.map(|record| {
                    let id = record.id();
                    (Ok(record), Some(id))
                })
            }
        })
        .boxed()
    }

    fn find_by_id(&self, id: RecordId) -> LookupFuture {
        let record = self.records.get(&id).cloned();
        Box::pin(async move { Ok(record) })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scan_is_ordered_by_id() {
        let store = InMemoryRecordStore::from_records(vec![
            Record::new(3, "c", true),
            Record::new(1, "a", false),
            Record::new(2, "b", true),
        ]);

        let ids: Vec<i64> = store
            .scan_all()
            .map(|r| r.unwrap().id().value())
            .collect()
            .await;

        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn scan_is_restartable() {
        let store = InMemoryRecordStore::articles(5);
        let first: Vec<_> = store.scan_all().collect().await;
        let second: Vec<_> = store.scan_all().collect().await;
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
    }

    #[tokio::test]
    async fn find_by_id_hits_and_misses() {
        let store = InMemoryRecordStore::articles(10);
        let hit = store.find_by_id(RecordId::new(7)).await.unwrap();
        assert_eq!(hit.unwrap().name(), "article7");

        let miss = store.find_by_id(RecordId::new(70)).await.unwrap();
        assert!(miss.is_none());
    }

    #[test]
    fn articles_are_all_active() {
        let store = InMemoryRecordStore::articles(100);
        assert_eq!(store.len(), 100);
        assert!(store.records.values().all(Record::is_active));
        assert!(InMemoryRecordStore::default().is_empty());
    }
}
