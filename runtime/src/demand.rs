//! Demand-driven consumption of a pipeline.
//!
//! A [`Subscription`] sits between a pipeline and its consumer. Upstream is
//! only polled while the consumer has outstanding demand; with demand
//! exhausted the subscription parks on a [`Notify`] until more is requested or
//! the subscription is cancelled.
//!
//! # Example
//!
//! ```
//! use futures::{stream, StreamExt};
//! use record_stream_runtime::demand::Subscription;
//!
//! # tokio_test::block_on(async {
//! let mut sub = Subscription::new(stream::iter([Ok(1), Ok(2), Ok(3)]).boxed());
//! sub.request(2);
//! assert_eq!(sub.next().await, Some(Ok(1)));
//! assert_eq!(sub.next().await, Some(Ok(2)));
//! sub.cancel();
//! assert_eq!(sub.next().await, None);
//! # });
//! ```

use futures::stream::BoxStream;
use futures::StreamExt;
use record_stream_core::error::PipelineResult;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Notify;

/// Demand value meaning "no limit".
pub const UNBOUNDED: u64 = u64::MAX;

#[derive(Debug, Default)]
struct DemandState {
    outstanding: AtomicU64,
    cancelled: AtomicBool,
    demand: Notify,
    cancel: Notify,
}

impl DemandState {
    /// Consume one unit of demand, if any is outstanding.
    fn try_take(&self) -> bool {
        self.outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| match n {
                0 => None,
                UNBOUNDED => Some(UNBOUNDED),
                n => Some(n - 1),
            })
            .is_ok()
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    async fn cancelled(&self) {
        while !self.is_cancelled() {
            self.cancel.notified().await;
        }
    }
}

/// Consumer-side handle used to signal demand or cancel.
///
/// Cloneable and `Send`, so demand can be signalled from another task than
/// the one consuming.
#[derive(Clone, Debug)]
pub struct DemandHandle {
    state: Arc<DemandState>,
}

impl DemandHandle {
    /// Signal readiness for `n` more elements.
    ///
    /// Demand accumulates and saturates at [`UNBOUNDED`].
    pub fn request(&self, n: u64) {
        if n == 0 {
            return;
        }
        let _ = self
            .state
            .outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_add(n))
            });
        self.state.demand.notify_one();
    }

    /// Lift every limit on demand.
    pub fn request_unbounded(&self) {
        self.request(UNBOUNDED);
    }

    /// Stop the subscription. The upstream is dropped on the next call to
    /// [`Subscription::next`], or immediately if one is pending.
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::Release);
        self.state.cancel.notify_one();
        self.state.demand.notify_one();
    }

    /// Demand not yet consumed.
    #[must_use]
    pub fn outstanding(&self) -> u64 {
        self.state.outstanding.load(Ordering::Acquire)
    }

    /// Whether [`cancel`](Self::cancel) was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }
}

/// A pipeline under consumer-controlled demand.
///
/// Never pulls more elements from upstream than the cumulative demand. The
/// first error ends the subscription.
pub struct Subscription<T> {
    upstream: Option<BoxStream<'static, PipelineResult<T>>>,
    state: Arc<DemandState>,
    delivered: u64,
}

impl<T: Send + 'static> Subscription<T> {
    /// Wrap `upstream` with zero initial demand.
    #[must_use]
    pub fn new(upstream: BoxStream<'static, PipelineResult<T>>) -> Self {
        Self {
            upstream: Some(upstream),
            state: Arc::new(DemandState::default()),
            delivered: 0,
        }
    }

    /// A handle for signalling demand from elsewhere.
    #[must_use]
    pub fn handle(&self) -> DemandHandle {
        DemandHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Shorthand for `self.handle().request(n)`.
    pub fn request(&self, n: u64) {
        self.handle().request(n);
    }

    /// Shorthand for `self.handle().cancel()`.
    pub fn cancel(&self) {
        self.handle().cancel();
    }

    /// Elements handed to the consumer so far.
    #[must_use]
    pub const fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Next element, once demand allows it.
    ///
    /// Returns `None` when upstream completed, after an error was delivered,
    /// or once the subscription is cancelled.
    pub async fn next(&mut self) -> Option<PipelineResult<T>> {
        let state = Arc::clone(&self.state);
        loop {
            if state.is_cancelled() {
                self.close();
                return None;
            }
            if self.upstream.is_none() {
                return None;
            }
            if state.try_take() {
                break;
            }
            state.demand.notified().await;
        }

        let upstream = self.upstream.as_mut()?;
        let item = tokio::select! {
            biased;
            () = state.cancelled() => None,
            item = upstream.next() => item,
        };

        match item {
            Some(Ok(value)) => {
                self.delivered += 1;
                Some(Ok(value))
            }
            Some(Err(err)) => {
                self.close();
                Some(Err(err))
            }
            None => {
                self.close();
                None
            }
        }
    }

    /// Request unbounded demand and drain into a `Vec`.
    ///
    /// A cancelled subscription yields what was gathered before the
    /// cancellation.
    ///
    /// # Errors
    ///
    /// Returns the first upstream error.
    pub async fn collect_all(mut self) -> PipelineResult<Vec<T>> {
        self.handle().request_unbounded();
        let mut out = Vec::new();
        while let Some(item) = self.next().await {
            out.push(item?);
        }
        Ok(out)
    }

    /// Bridge to a plain stream where each pull by the downstream signals one
    /// unit of demand, after an initial `prefetch` (at least one).
    #[must_use]
    pub fn into_stream(self, prefetch: u64) -> BoxStream<'static, PipelineResult<T>> {
        let mut sub = self;
        sub.request(prefetch.max(1));
        async_stream::stream! {
            while let Some(item) = sub.next().await {
                yield item;
                sub.request(1);
            }
        }
        .boxed()
    }

    fn close(&mut self) {
        if self.upstream.take().is_some() {
            tracing::trace!(delivered = self.delivered, "Subscription closed");
        }
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("open", &self.upstream.is_some())
            .field("delivered", &self.delivered)
            .field("state", &self.state)
            .finish()
    }
}
