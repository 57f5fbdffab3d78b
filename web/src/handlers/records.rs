//! Record query endpoints returning JSON.

use crate::WebResult;
use crate::extractors::RecordQuery;
use crate::state::AppState;
use axum::{
    BoxError, Json,
    body::{Body, Bytes},
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use futures::stream::BoxStream;
use record_stream_core::error::PipelineResult;
use record_stream_core::record::{Record, RecordId};

/// Filtered, sorted, paginated records as a streamed JSON array.
///
/// ```text
/// GET /v1/records?qName=article&page=2&size=10&delay=0
/// ```
///
/// The first record is pulled before the response head is sent, so a store
/// failure maps to a status code. A later failure truncates the body.
///
/// # Errors
///
/// - 400 for a malformed or out-of-range `page`, `size` or `delay`
/// - 503 if the record store is unavailable
pub async fn list_records(
    State(state): State<AppState>,
    RecordQuery(params): RecordQuery,
) -> WebResult<Response> {
    let query = params.into_page_query(state.pipelines().config().max_delay)?;
    let mut records = state.pipelines().paginated(&query).into_stream(1);
    let first = records.next().await.transpose()?;

    let body = Body::from_stream(json_array(first, records));
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// A single record.
///
/// ```text
/// GET /v1/records/{id}
/// ```
///
/// # Errors
///
/// - 404 `Record not found by id= <id>`
/// - 503 if the record store is unavailable
pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> WebResult<Json<Record>> {
    let record = state.pipelines().find(RecordId::new(id)).await?;
    Ok(Json(record))
}

/// Frame `first` and `rest` as `[r0,r1,...]`, one chunk per record.
fn json_array(
    first: Option<Record>,
    mut rest: BoxStream<'static, PipelineResult<Record>>,
) -> BoxStream<'static, Result<Bytes, BoxError>> {
    async_stream::stream! {
        yield Ok(Bytes::from_static(b"["));
        if let Some(first) = first {
            yield encode(&first, false);
            while let Some(item) = rest.next().await {
                match item {
                    Ok(record) => yield encode(&record, true),
                    Err(err) => {
                        tracing::warn!(error = %err, "Paginated response truncated");
                        yield Err(err.into());
                        return;
                    }
                }
            }
        }
        yield Ok(Bytes::from_static(b"]"));
    }
    .boxed()
}

fn encode(record: &Record, separator: bool) -> Result<Bytes, BoxError> {
    let mut chunk = Vec::with_capacity(64);
    if separator {
        chunk.push(b',');
    }
    serde_json::to_writer(&mut chunk, record)?;
    Ok(Bytes::from(chunk))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures::stream;

    async fn render(first: Option<Record>, rest: Vec<Record>) -> String {
        let chunks: Vec<Bytes> = json_array(first, stream::iter(rest.into_iter().map(Ok)).boxed())
            .map(Result::unwrap)
            .collect()
            .await;
        String::from_utf8(chunks.concat()).unwrap()
    }

    #[tokio::test]
    async fn empty_array() {
        assert_eq!(render(None, vec![]).await, "[]");
    }

    #[tokio::test]
    async fn records_are_comma_separated() {
        let body = render(
            Some(Record::new(1, "a", true)),
            vec![Record::new(2, "b", true)],
        )
        .await;
        let parsed: Vec<Record> = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(body.contains("\"activeFlag\":true"));
    }
}
