//! Ordering window stage.
//!
//! # Resource Cost
//!
//! A total sort needs the whole filtered set, so this stage buffers every
//! record that reaches it before emitting the first one. Memory is
//! proportional to the filtered count, not to the page size, and the stage
//! ignores downstream demand until the buffer is complete. When the rate
//! shaper runs upstream, the first page record arrives only after
//! `delay * filtered_count` of wall-clock time.

use crate::RecordStream;
use crate::probe::Probe;
use futures::{stream, StreamExt};
use record_stream_core::diagnostics::PipelineEvent;
use record_stream_core::query::PageQuery;
use record_stream_core::record::Record;

/// Sort by identifier, then skip `page * size` and take `size`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OrderingWindow {
    offset: u64,
    size: u64,
}

impl OrderingWindow {
    /// Window for page `page` of `size` records.
    #[must_use]
    pub const fn new(page: u64, size: u64) -> Self {
        Self {
            offset: page.saturating_mul(size),
            size,
        }
    }

    /// Window described by a validated query.
    #[must_use]
    pub const fn for_query(query: &PageQuery) -> Self {
        Self::new(query.page, query.size)
    }

    /// Number of sorted records skipped.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Maximum number of records emitted.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Select the page from an already buffered set.
    ///
    /// An offset past the end yields an empty page.
    #[must_use]
    pub fn select(&self, mut buffered: Vec<Record>) -> Vec<Record> {
        buffered.sort_unstable_by_key(Record::id);
        let offset = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let size = usize::try_from(self.size).unwrap_or(usize::MAX);
        buffered.into_iter().skip(offset).take(size).collect()
    }

    /// Buffer `upstream`, sort it and emit the selected page.
    ///
    /// The first upstream error is emitted instead of a page. A zero-sized
    /// window completes immediately without polling upstream.
    #[must_use]
    pub fn apply(self, upstream: RecordStream, probe: Probe) -> RecordStream {
        if self.size == 0 {
            return stream::empty().boxed();
        }
        async_stream::stream! {
            let mut upstream = upstream;
            let mut buffered = Vec::new();
            while let Some(item) = upstream.next().await {
                match item {
                    Ok(record) => buffered.push(record),
                    Err(err) => {
                        yield Err(err);
                        return;
                    }
                }
            }
            // Release the upstream stages before emitting.
            drop(upstream);

            let total = buffered.len();
            let page = self.select(buffered);
            probe.emit(PipelineEvent::Windowed {
                buffered: total,
                selected: page.len(),
            });
            for record in page {
                yield Ok(record);
            }
        }
        .boxed()
    }
}
