//! Record source stage.

use crate::RecordStream;
use futures::StreamExt;
use record_stream_core::error::PipelineError;
use record_stream_core::store::RecordStore;
use std::sync::Arc;

/// Lazy, restartable scan over a [`RecordStore`].
///
/// Nothing touches the store until the stream returned by [`open`](Self::open)
/// is first polled. Dropping the stream abandons the scan. A store failure is
/// reported once as [`PipelineError::StoreUnavailable`] and ends the stream.
#[derive(Clone)]
pub struct RecordSource {
    store: Arc<dyn RecordStore>,
}

impl RecordSource {
    /// Create a source over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Start a fresh scan in ascending identifier order.
    #[must_use]
    pub fn open(&self) -> RecordStream {
        let store = Arc::clone(&self.store);
        async_stream::stream! {
            let mut scan = store.scan_all();
            while let Some(item) = scan.next().await {
                match item {
                    Ok(record) => yield Ok(record),
                    Err(err) => {
                        yield Err(PipelineError::from(err));
                        return;
                    }
                }
            }
        }
        .boxed()
    }
}

impl std::fmt::Debug for RecordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordSource").finish_non_exhaustive()
    }
}
