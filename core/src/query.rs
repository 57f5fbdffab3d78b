//! Per-request query parameters.
//!
//! Raw values arrive as signed integers so that out-of-range input can be
//! rejected with [`PipelineError::InvalidParameter`] before any pipeline stage
//! is built. Validated queries only carry values the stages accept.

use crate::error::{PipelineError, PipelineResult};
use std::time::Duration;

/// Default page index.
pub const DEFAULT_PAGE: u64 = 0;

/// Default page size.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Validate a raw `delay` value in milliseconds.
///
/// # Errors
///
/// Returns `InvalidParameter` if `delay_ms` is negative or above `max_delay`.
/// Pass [`Duration::MAX`] to accept any non-negative delay.
pub fn validate_delay(delay_ms: i64, max_delay: Duration) -> PipelineResult<Duration> {
    let millis = u64::try_from(delay_ms)
        .map_err(|_| PipelineError::invalid("delay", format!("must be >= 0, got {delay_ms}")))?;
    let delay = Duration::from_millis(millis);
    if delay > max_delay {
        return Err(PipelineError::invalid(
            "delay",
            format!("must be <= {} ms, got {millis}", max_delay.as_millis()),
        ));
    }
    Ok(delay)
}

/// Validated parameters of the paginated query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageQuery {
    /// Optional substring the record name must contain.
    pub name_filter: Option<String>,
    /// Zero-based page index.
    pub page: u64,
    /// Number of records per page.
    pub size: u64,
    /// Per-element delay applied before sorting.
    pub delay: Duration,
}

impl PageQuery {
    /// Validate raw request values.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a negative `page`, a non-positive
    /// `size`, or a `delay` outside `0..=max_delay`.
    ///
    /// # Examples
    ///
    /// ```
    /// use record_stream_core::query::PageQuery;
    /// use std::time::Duration;
    ///
    /// let query = PageQuery::parse(Some("article".into()), 2, 10, 0, Duration::from_secs(1)).unwrap();
    /// assert_eq!(query.offset(), 20);
    ///
    /// assert!(PageQuery::parse(None, -1, 10, 0, Duration::from_secs(1)).is_err());
    /// assert!(PageQuery::parse(None, 0, 0, 0, Duration::from_secs(1)).is_err());
    /// ```
    pub fn parse(
        name_filter: Option<String>,
        page: i64,
        size: i64,
        delay_ms: i64,
        max_delay: Duration,
    ) -> PipelineResult<Self> {
        let page = u64::try_from(page)
            .map_err(|_| PipelineError::invalid("page", format!("must be >= 0, got {page}")))?;
        let size = u64::try_from(size)
            .ok()
            .filter(|s| *s > 0)
            .ok_or_else(|| PipelineError::invalid("size", format!("must be > 0, got {size}")))?;
        let delay = validate_delay(delay_ms, max_delay)?;

        Ok(Self {
            name_filter,
            page,
            size,
            delay,
        })
    }

    /// Number of sorted records skipped before the page starts.
    ///
    /// Saturates instead of overflowing; an over-range offset simply yields
    /// an empty page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            name_filter: None,
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
            delay: Duration::ZERO,
        }
    }
}

/// Validated parameters of the fan-out query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FanOutQuery {
    /// Substring the record name must contain. Absent matches nothing.
    pub name_filter: Option<String>,
    /// Per-element delay applied inside each lane.
    pub delay: Duration,
}

impl FanOutQuery {
    /// Validate raw request values.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a `delay` outside `0..=max_delay`.
    pub fn parse(
        name_filter: Option<String>,
        delay_ms: i64,
        max_delay: Duration,
    ) -> PipelineResult<Self> {
        Ok(Self {
            name_filter,
            delay: validate_delay(delay_ms, max_delay)?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const MAX: Duration = Duration::from_secs(60);

    #[test]
    fn page_query_accepts_defaults() {
        let query = PageQuery::parse(None, 0, 10, 0, MAX).unwrap();
        assert_eq!(query, PageQuery::default());
    }

    #[test]
    fn page_query_rejects_negative_page() {
        let err = PageQuery::parse(None, -1, 10, 0, MAX).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidParameter { name: "page", .. }));
    }

    #[test]
    fn page_query_rejects_non_positive_size() {
        for size in [0, -5] {
            let err = PageQuery::parse(None, 0, size, 0, MAX).unwrap_err();
            assert!(matches!(err, PipelineError::InvalidParameter { name: "size", .. }));
        }
    }

    #[test]
    fn negative_delay_is_rejected() {
        let err = FanOutQuery::parse(Some("2".into()), -10, MAX).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidParameter { name: "delay", .. }));
    }

    #[test]
    fn delay_above_ceiling_is_rejected() {
        let err = validate_delay(61_000, MAX).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidParameter { name: "delay", .. }));
        assert_eq!(validate_delay(60_000, MAX).unwrap(), MAX);
    }

    #[test]
    fn empty_name_is_kept_as_present() {
        let query = FanOutQuery::parse(Some(String::new()), 0, MAX).unwrap();
        assert_eq!(query.name_filter.as_deref(), Some(""));

        let query = FanOutQuery::parse(None, 0, MAX).unwrap();
        assert_eq!(query.name_filter, None);
    }

    #[test]
    fn unbounded_ceiling_accepts_any_delay() {
        let delay = validate_delay(i64::MAX, Duration::MAX).unwrap();
        assert_eq!(delay, Duration::from_millis(i64::MAX.unsigned_abs()));
    }

    #[test]
    fn offset_saturates() {
        let query = PageQuery::parse(None, i64::MAX, i64::MAX, 0, MAX).unwrap();
        assert_eq!(query.offset(), u64::MAX);
    }
}
