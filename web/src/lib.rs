//! Axum HTTP surface for record-stream pipelines.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         HTTP shell (Axum)               │  ← query parsing, status codes
//! │  - JSON array and SSE framing           │  ← request ids, tracing
//! ├─────────────────────────────────────────┤
//! │         Pipelines (runtime)             │
//! │  - demand-driven subscriptions          │  ← backpressure from the socket
//! │  - source, filter, shaper, window, lanes│
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Request Flow
//!
//! 1. **Validate** the query string into a typed query (400 on failure)
//! 2. **Build** a fresh pipeline for the request
//! 3. **Pull** the first element, mapping an early error to a status code
//! 4. **Stream** the rest, one element per body poll
//! 5. **Cancel** the pipeline when the client disconnects
//!
//! # Example
//!
//! ```
//! use record_stream_core::store::InMemoryRecordStore;
//! use record_stream_runtime::{PipelineConfig, Pipelines};
//! use record_stream_web::{AppState, build_router};
//! use std::sync::Arc;
//!
//! let pipelines = Pipelines::new(
//!     Arc::new(InMemoryRecordStore::articles(100)),
//!     PipelineConfig::default(),
//! );
//! let app: axum::Router = build_router(AppState::new(pipelines));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use routes::{REQUEST_ID_HEADER, build_router};
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
