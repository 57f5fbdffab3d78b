//! Custom Axum extractors.
//!
//! - `RecordQuery`: query string of the record endpoints, rejected as JSON
//!
//! # Examples
//!
//! ```ignore
//! use record_stream_web::extractors::RecordQuery;
//!
//! async fn handler(RecordQuery(params): RecordQuery) -> WebResult<Response> {
//!     let query = params.into_page_query(max_delay)?;
//!     // ...
//! }
//! ```

use crate::error::AppError;
use crate::handlers::RecordParams;
use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};

/// Query string of the record endpoints.
///
/// A value that does not deserialize (e.g. `page=abc`) is rejected with the
/// same `{ "code", "message" }` body as an out-of-range value, instead of
/// Axum's plain-text rejection.
#[derive(Debug)]
pub struct RecordQuery(pub RecordParams);

#[async_trait]
impl<S> FromRequestParts<S> for RecordQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<RecordParams>::from_request_parts(parts, state).await {
            Ok(Query(params)) => Ok(Self(params)),
            Err(rejection) => {
                tracing::debug!(error = %rejection, "Rejected query string");
                Err(AppError::bad_request(rejection.body_text()))
            }
        }
    }
}
