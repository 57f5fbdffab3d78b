//! Error taxonomy for the record pipeline.
//!
//! Every error terminates the pipeline that produced it and is observed
//! exactly once by the consumer.

use crate::record::RecordId;
use thiserror::Error;

/// Errors raised by a record store collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("Record store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by a pipeline to its consumer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The requested record does not exist.
    ///
    /// Surfaced as a not-found response. Never retried.
    #[error("Record not found by id= {id}")]
    RecordNotFound {
        /// The identifier that was looked up.
        id: RecordId,
    },

    /// A query parameter was out of range.
    ///
    /// Raised before any pipeline stage is constructed.
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name as it appears on the wire.
        name: &'static str,
        /// Human-readable constraint that was violated.
        reason: String,
    },

    /// A partitioned lane failed.
    ///
    /// Sibling lanes are cancelled before this error reaches the consumer.
    #[error("Lane {lane} failed: {source}")]
    LaneFailure {
        /// Index of the failing lane.
        lane: usize,
        /// What went wrong inside the lane.
        source: Box<PipelineError>,
    },

    /// The record store collaborator failed.
    ///
    /// The pipeline does not retry; retry policy belongs to the collaborator.
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    /// A fan-out task ended abnormally (panicked or was aborted from outside).
    ///
    /// A lane's abnormal exit reaches the consumer wrapped in
    /// [`LaneFailure`](Self::LaneFailure) so the lane index is kept.
    #[error("Lane task aborted: {0}")]
    LaneAborted(String),
}

impl PipelineError {
    /// Build an `InvalidParameter` error.
    #[must_use]
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Wrap an error raised inside `lane`.
    #[must_use]
    pub fn lane(lane: usize, source: Self) -> Self {
        Self::LaneFailure {
            lane,
            source: Box::new(source),
        }
    }

    /// Short, stable label used for metrics and error codes.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RecordNotFound { .. } => "record_not_found",
            Self::InvalidParameter { .. } => "invalid_parameter",
            Self::LaneFailure { .. } | Self::LaneAborted(_) => "lane_failure",
            Self::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

/// Result alias used across the pipeline.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message() {
        let err = PipelineError::RecordNotFound {
            id: RecordId::new(404),
        };
        assert_eq!(err.to_string(), "Record not found by id= 404");
        assert_eq!(err.kind(), "record_not_found");
    }

    #[test]
    fn lane_failure_wraps_source() {
        let err = PipelineError::lane(2, PipelineError::invalid("delay", "must be >= 0"));
        assert_eq!(
            err.to_string(),
            "Lane 2 failed: Invalid parameter `delay`: must be >= 0"
        );
        assert_eq!(err.kind(), "lane_failure");
    }

    #[test]
    fn store_error_converts() {
        let err: PipelineError = StoreError::Unavailable("connection refused".into()).into();
        assert_eq!(err.to_string(), "Record store unavailable: connection refused");
        assert_eq!(err.kind(), "store_unavailable");
    }
}
