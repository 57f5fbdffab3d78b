//! Parallel fan-out stage.
//!
//! # Architecture
//!
//! ```text
//!                    ┌─ inbox(1) ─> lane 0 ─┐
//! upstream ─> dispatcher ─ inbox(1) ─> lane 1 ─┼─> merge(N) ─> consumer
//!      round-robin   └─ inbox(1) ─> lane N ─┘
//! ```
//!
//! - The dispatcher assigns records to lanes round-robin by arrival order, so
//!   load is balanced whatever the filter selectivity.
//! - Every channel is bounded. A slow consumer fills the merge channel, which
//!   suspends the lanes, which fills their inboxes, which suspends the
//!   dispatcher, which stops pulling upstream.
//! - Lanes and the dispatcher are tasks in a `JoinSet` owned by the merged
//!   stream. Dropping the stream aborts them all, including any pending lane
//!   timers.
//! - The first lane error aborts every sibling and is reported once as
//!   [`PipelineError::LaneFailure`]. A lane that panics is reported the same
//!   way, with [`PipelineError::LaneAborted`] as the cause.

use crate::RecordStream;
use crate::probe::Probe;
use futures::future::BoxFuture;
use futures::{Stream, StreamExt};
use record_stream_core::diagnostics::PipelineEvent;
use record_stream_core::error::{PipelineError, PipelineResult};
use record_stream_core::record::Record;
use std::num::NonZeroUsize;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::{Id, JoinSet};

/// Records a lane may hold before the dispatcher waits on it.
const LANE_INBOX_CAPACITY: usize = 1;

/// Work performed by each lane on every record it receives.
///
/// # Dyn Compatibility
///
/// Returns a boxed `'static` future so the stage can run inside a spawned
/// lane task.
pub trait LaneStage: Send + Sync + 'static {
    /// Process one record on `lane`.
    ///
    /// An error fails the lane and, with it, the whole fan-out.
    fn process(
        &self,
        lane: usize,
        record: Record,
        probe: &Probe,
    ) -> BoxFuture<'static, PipelineResult<Record>>;
}

/// Number of lanes used when none is configured: one per available core.
#[must_use]
pub fn default_lanes() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}

/// Splits a sequence across a fixed number of lanes.
pub struct Partitioner<L> {
    lanes: NonZeroUsize,
    stage: Arc<L>,
}

impl<L: LaneStage> Partitioner<L> {
    /// Create a partitioner running `stage` on each of `lanes` lanes.
    #[must_use]
    pub fn new(lanes: NonZeroUsize, stage: L) -> Self {
        Self {
            lanes,
            stage: Arc::new(stage),
        }
    }

    /// Configured lane count.
    #[must_use]
    pub const fn lanes(&self) -> usize {
        self.lanes.get()
    }

    /// Fan `upstream` out and merge the lanes into one unordered stream.
    ///
    /// Must be called from within a Tokio runtime: the dispatcher and the
    /// lanes are spawned immediately.
    #[must_use]
    pub fn apply(&self, upstream: RecordStream, probe: Probe) -> RecordStream {
        let lane_count = self.lanes.get();
        let (merged_tx, merged_rx) = mpsc::channel(lane_count);
        let mut tasks = JoinSet::new();
        let mut lane_ids = HashMap::with_capacity(lane_count);
        let mut inboxes = Vec::with_capacity(lane_count);

        for lane in 0..lane_count {
            let (inbox_tx, inbox_rx) = mpsc::channel(LANE_INBOX_CAPACITY);
            inboxes.push(inbox_tx);
            let handle = tasks.spawn(run_lane(
                lane,
                inbox_rx,
                Arc::clone(&self.stage),
                merged_tx.clone(),
                probe.clone(),
            ));
            lane_ids.insert(handle.id(), lane);
        }
        tasks.spawn(dispatch(upstream, inboxes, merged_tx));

        tracing::debug!(lanes = lane_count, "Fan-out started");

        MergedLanes {
            merged: merged_rx,
            tasks,
            lane_ids,
            finished: false,
        }
        .boxed()
    }
}

impl<L> std::fmt::Debug for Partitioner<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Partitioner")
            .field("lanes", &self.lanes)
            .finish_non_exhaustive()
    }
}

/// Pull upstream and hand records to lanes round-robin.
async fn dispatch(
    mut upstream: RecordStream,
    inboxes: Vec<mpsc::Sender<Record>>,
    merged: mpsc::Sender<PipelineResult<Record>>,
) {
    let mut next_lane = 0;
    while let Some(item) = upstream.next().await {
        match item {
            Ok(record) => {
                if inboxes[next_lane].send(record).await.is_err() {
                    // Lane is gone: the fan-out is failing or cancelled.
                    return;
                }
                next_lane = (next_lane + 1) % inboxes.len();
            }
            Err(err) => {
                let _ = merged.send(Err(err)).await;
                return;
            }
        }
    }
}

/// Run `stage` over every record assigned to `lane`, in arrival order.
async fn run_lane<L: LaneStage>(
    lane: usize,
    mut inbox: mpsc::Receiver<Record>,
    stage: Arc<L>,
    merged: mpsc::Sender<PipelineResult<Record>>,
    probe: Probe,
) {
    let mut forwarded = 0_u64;
    while let Some(record) = inbox.recv().await {
        let outcome = stage
            .process(lane, record, &probe)
            .await
            .map_err(|source| PipelineError::lane(lane, source));
        let failed = outcome.is_err();
        if merged.send(outcome).await.is_err() || failed {
            return;
        }
        forwarded += 1;
    }
    probe.emit(PipelineEvent::LaneCompleted { lane, forwarded });
}

/// Consumer side of the merge point.
struct MergedLanes {
    merged: mpsc::Receiver<PipelineResult<Record>>,
    tasks: JoinSet<()>,
    /// Lane index of every lane task. The dispatcher is not listed.
    lane_ids: HashMap<Id, usize>,
    finished: bool,
}

impl MergedLanes {
    /// Abort every task and end the stream with `err`.
    fn fail(&mut self, err: PipelineError) -> Poll<Option<PipelineResult<Record>>> {
        self.tasks.abort_all();
        self.finished = true;
        Poll::Ready(Some(Err(err)))
    }

    /// Reap finished tasks, returning the first abnormal exit.
    fn poll_reap(&mut self, cx: &mut Context<'_>) -> Poll<Option<PipelineError>> {
        loop {
            match self.tasks.poll_join_next(cx) {
                Poll::Ready(Some(Ok(()))) => {}
                Poll::Ready(Some(Err(err))) if !err.is_cancelled() => {
                    let cause = PipelineError::LaneAborted(err.to_string());
                    let err = match self.lane_ids.get(&err.id()) {
                        Some(&lane) => PipelineError::lane(lane, cause),
                        None => cause,
                    };
                    return Poll::Ready(Some(err));
                }
                Poll::Ready(Some(Err(_))) => {}
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Stream for MergedLanes {
    type Item = PipelineResult<Record>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        if this.finished {
            return Poll::Ready(None);
        }

        if let Poll::Ready(Some(err)) = this.poll_reap(cx) {
            return this.fail(err);
        }

        match this.merged.poll_recv(cx) {
            Poll::Ready(Some(Ok(record))) => Poll::Ready(Some(Ok(record))),
            Poll::Ready(Some(Err(err))) => this.fail(err),
            // Every sender is gone. Wait until every task is reaped so a
            // panicking lane is not mistaken for completion.
            Poll::Ready(None) => match this.poll_reap(cx) {
                Poll::Ready(Some(err)) => this.fail(err),
                Poll::Ready(None) => {
                    this.finished = true;
                    Poll::Ready(None)
                }
                Poll::Pending => Poll::Pending,
            },
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for MergedLanes {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(tasks = self.tasks.len(), "Fan-out cancelled, aborting lanes");
        }
        self.tasks.abort_all();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::shaper::RateShaper;
    use futures::stream;
    use record_stream_core::diagnostics::PipelineKind;
    use std::collections::BTreeSet;
    use std::time::Duration;

    fn lanes(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn records(n: i64) -> RecordStream {
        stream::iter((0..n).map(|i| Ok(Record::new(i, format!("article{i}"), true)))).boxed()
    }

    #[tokio::test]
    async fn every_record_arrives_exactly_once() {
        let partitioner = Partitioner::new(lanes(4), RateShaper::default());
        let out: Vec<i64> = partitioner
            .apply(records(50), Probe::tracing(PipelineKind::FanOut))
            .map(|r| r.unwrap().id().value())
            .collect()
            .await;

        assert_eq!(out.len(), 50);
        let unique: BTreeSet<_> = out.into_iter().collect();
        assert_eq!(unique, (0..50).collect());
    }

    #[tokio::test(start_paused = true)]
    async fn lanes_delay_concurrently() {
        let partitioner = Partitioner::new(lanes(4), RateShaper::new(Duration::from_millis(100)));
        let start = tokio::time::Instant::now();
        let out: Vec<_> = partitioner
            .apply(records(8), Probe::tracing(PipelineKind::FanOut))
            .collect()
            .await;

        assert_eq!(out.len(), 8);
        // Two records per lane; sequential shaping would take 800ms.
        assert!(start.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn upstream_error_is_surfaced_once() {
        let items = vec![
            Ok(Record::new(1, "a", true)),
            Err(PipelineError::from(
                record_stream_core::error::StoreError::Unavailable("down".into()),
            )),
        ];
        let partitioner = Partitioner::new(lanes(2), RateShaper::default());
        let out: Vec<_> = partitioner
            .apply(stream::iter(items).boxed(), Probe::tracing(PipelineKind::FanOut))
            .collect()
            .await;

        let errors = out.iter().filter(|r| r.is_err()).count();
        assert_eq!(errors, 1);
        assert!(matches!(out.last(), Some(Err(PipelineError::StoreUnavailable(_)))));
    }

    #[tokio::test]
    async fn empty_upstream_completes() {
        let partitioner = Partitioner::new(lanes(3), RateShaper::default());
        let out: Vec<_> = partitioner
            .apply(records(0), Probe::tracing(PipelineKind::FanOut))
            .collect()
            .await;
        assert!(out.is_empty());
    }

    /// Panics on one record id, passes everything else through.
    struct PanicOn(i64);

    impl LaneStage for PanicOn {
        fn process(
            &self,
            _lane: usize,
            record: Record,
            _probe: &Probe,
        ) -> BoxFuture<'static, PipelineResult<Record>> {
            let poisoned = record.id().value() == self.0;
            Box::pin(async move {
                if poisoned {
                    panic!("poisoned record");
                }
                Ok(record)
            })
        }
    }

    #[tokio::test]
    async fn panicking_lane_is_reported_with_its_index() {
        // Round-robin sends record 1 to lane 1.
        let partitioner = Partitioner::new(lanes(2), PanicOn(1));
        let out: Vec<_> = partitioner
            .apply(records(6), Probe::tracing(PipelineKind::FanOut))
            .collect()
            .await;

        let errors: Vec<_> = out.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(errors.len(), 1);
        match errors[0] {
            PipelineError::LaneFailure { lane, source } => {
                assert_eq!(*lane, 1);
                assert!(matches!(**source, PipelineError::LaneAborted(_)));
            }
            other => panic!("expected a lane failure, got {other:?}"),
        }
        assert!(out.last().unwrap().is_err());
    }

    #[test]
    fn default_lanes_is_positive() {
        assert!(default_lanes().get() >= 1);
    }
}
