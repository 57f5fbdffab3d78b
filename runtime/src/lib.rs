//! # Record Stream Runtime
//!
//! Streaming stages and their composition into demand-driven pipelines.
//!
//! ## Stages
//!
//! - **Source**: lazy ordered scan of the record store
//! - **Filter**: active flag and optional name substring
//! - **Shaper**: fixed per-record delay on the async timer
//! - **Window**: total sort by identifier, then one page
//! - **Partitioner**: bounded round-robin fan-out over parallel lanes
//! - **Interval**: infinite tick stream for push delivery
//!
//! Each stage consumes and returns a [`RecordStream`]. Backpressure is
//! structural: stages only pull upstream when polled, and every channel
//! between tasks is bounded. [`demand::Subscription`] puts the whole pipeline
//! under explicit consumer demand.
//!
//! ## Example
//!
//! ```
//! use record_stream_core::query::PageQuery;
//! use record_stream_core::store::InMemoryRecordStore;
//! use record_stream_runtime::pipeline::{PipelineConfig, Pipelines};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let pipelines = Pipelines::new(
//!     Arc::new(InMemoryRecordStore::articles(100)),
//!     PipelineConfig::default(),
//! );
//! let page = pipelines.paginated(&PageQuery::default()).collect_all().await.unwrap();
//! assert_eq!(page.len(), 10);
//! # });
//! ```

use futures::stream::BoxStream;
use record_stream_core::error::PipelineResult;
use record_stream_core::record::Record;

/// Consumer-controlled demand over a pipeline
pub mod demand;

/// Filter stage
pub mod filter;

/// Interval emitter for push delivery
pub mod interval;

/// Prometheus metrics for observability
pub mod metrics;

/// Parallel fan-out stage
pub mod partition;

/// Pipeline composition per delivery pattern
pub mod pipeline;

/// Per-pipeline diagnostics handle
pub mod probe;

/// Fixed-delay rate shaper
pub mod shaper;

/// Record source over the store
pub mod source;

/// Sort-then-page ordering window
pub mod window;

/// The stream type every record stage consumes and produces.
pub type RecordStream = BoxStream<'static, PipelineResult<Record>>;

pub use demand::{DemandHandle, Subscription};
pub use filter::FilterStage;
pub use interval::{IntervalEmitter, Tick};
pub use partition::{LaneStage, Partitioner};
pub use pipeline::{PipelineConfig, Pipelines};
pub use probe::Probe;
pub use shaper::RateShaper;
pub use source::RecordSource;
pub use window::OrderingWindow;
