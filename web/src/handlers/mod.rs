//! HTTP handlers.

pub mod health;
pub mod records;
pub mod sse;

use record_stream_core::error::PipelineResult;
use record_stream_core::query::{FanOutQuery, PageQuery};
use serde::Deserialize;
use std::time::Duration;

/// Raw query string of the record endpoints.
///
/// Values are validated into [`PageQuery`] or [`FanOutQuery`] before any
/// pipeline is built.
#[derive(Debug, Default, Deserialize)]
pub struct RecordParams {
    /// Name substring filter.
    #[serde(rename = "qName")]
    pub q_name: Option<String>,
    /// Zero-based page index.
    pub page: Option<i64>,
    /// Page size.
    pub size: Option<i64>,
    /// Per-record delay in milliseconds.
    pub delay: Option<i64>,
}

impl RecordParams {
    /// Validate as a paginated query.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for out-of-range values.
    pub fn into_page_query(self, max_delay: Duration) -> PipelineResult<PageQuery> {
        let defaults = PageQuery::default();
        PageQuery::parse(
            self.q_name,
            self.page.unwrap_or_else(|| saturating_i64(defaults.page)),
            self.size.unwrap_or_else(|| saturating_i64(defaults.size)),
            self.delay.unwrap_or(0),
            max_delay,
        )
    }

    /// Validate as a fan-out query. `page` and `size` are ignored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for an out-of-range delay.
    pub fn into_fan_out_query(self, max_delay: Duration) -> PipelineResult<FanOutQuery> {
        FanOutQuery::parse(self.q_name, self.delay.unwrap_or(0), max_delay)
    }
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
