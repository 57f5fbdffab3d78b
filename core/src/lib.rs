//! # Record Stream Core
//!
//! Core types and collaborator traits for the record-stream pipeline.
//!
//! This crate holds everything the pipeline stages agree on but does not run
//! anything itself:
//!
//! - **Record**: the immutable catalog entry and its ordered identifier
//! - **Queries**: validated per-request parameters
//! - **Filters**: the tagged predicate configuration for each endpoint
//! - **Store**: the read-only collaborator the pipeline scans
//! - **Errors**: the pipeline error taxonomy
//! - **Diagnostics**: the injectable per-pipeline sink
//!
//! ## Example
//!
//! ```
//! use record_stream_core::filter::FilterConfig;
//! use record_stream_core::store::InMemoryRecordStore;
//!
//! let store = InMemoryRecordStore::articles(100);
//! let filter = FilterConfig::fan_out(Some("2".into()));
//! assert_eq!(store.len(), 100);
//! assert!(!filter.rejects_everything());
//! ```

pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod query;
pub mod record;
pub mod store;

pub use diagnostics::{DiagnosticSink, NoopSink, PipelineEvent, PipelineKind, SharedSink, TracingSink};
pub use error::{PipelineError, PipelineResult, StoreError};
pub use filter::{AbsentNamePolicy, FilterConfig};
pub use query::{FanOutQuery, PageQuery};
pub use record::{Record, RecordId};
pub use store::{InMemoryRecordStore, RecordStore};
