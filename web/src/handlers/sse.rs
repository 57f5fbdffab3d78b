//! Server-sent event endpoints.

use crate::WebResult;
use crate::extractors::RecordQuery;
use crate::error::{AppError, ErrorBody};
use crate::state::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use record_stream_core::error::PipelineError;
use record_stream_core::record::Record;
use std::convert::Infallible;

/// Stream of SSE events.
pub type EventStream = BoxStream<'static, Result<Event, Infallible>>;

/// Records matching `qName`, processed across parallel lanes.
///
/// ```text
/// GET /v1/records/parallel?qName=2&delay=100
/// ```
///
/// One `data:` event per record, in completion order. Without `qName`
/// nothing matches and the stream ends immediately. A failure after the
/// first record is sent as a final `event: error`.
///
/// # Errors
///
/// - 400 for a malformed or out-of-range `delay`
/// - 500 if a lane fails before the first record
/// - 503 if the record store is unavailable
pub async fn fan_out(
    State(state): State<AppState>,
    RecordQuery(params): RecordQuery,
) -> WebResult<Sse<EventStream>> {
    let query = params.into_fan_out_query(state.pipelines().config().max_delay)?;
    let mut records = state.pipelines().fan_out(&query).into_stream(1);
    let Some(first) = records.next().await.transpose()? else {
        return Ok(Sse::new(stream::empty().boxed()));
    };

    // The subscription ends after its first error, so at most one error
    // event is sent.
    let rest = records.map(|item| {
        Ok(match item {
            Ok(record) => record_event(&record),
            Err(err) => error_event(&err),
        })
    });
    let events = stream::once(async move { Ok(record_event(&first)) })
        .chain(rest)
        .boxed();
    Ok(Sse::new(events))
}

/// Infinite tick stream, one event per period.
///
/// ```text
/// GET /v1/records/sse/name
/// ```
///
/// Each event carries `artname<seq><marker>`. Closing the connection stops
/// the timer.
#[allow(clippy::unused_async)]
pub async fn heartbeat(State(state): State<AppState>) -> Sse<EventStream> {
    let ticks = state
        .pipelines()
        .heartbeat()
        .into_stream(1)
        .map(|tick| {
            Ok(match tick {
                Ok(tick) => Event::default().data(tick.label),
                Err(err) => error_event(&err),
            })
        })
        .boxed();
    Sse::new(ticks)
}

fn record_event(record: &Record) -> Event {
    match serde_json::to_string(record) {
        Ok(json) => Event::default().data(json),
        Err(err) => {
            tracing::error!(error = %err, record_id = %record.id(), "Record serialization failed");
            Event::default().event("error").data(r#"{"code":"SERIALIZATION"}"#)
        }
    }
}

fn error_event(err: &PipelineError) -> Event {
    tracing::warn!(error = %err, "Streaming response failed");
    let app = AppError::from(err.clone());
    let body = ErrorBody {
        code: app.code(),
        message: app.message(),
    };
    let data = serde_json::to_string(&body).unwrap_or_else(|_| app.code().to_string());
    Event::default().event("error").data(data)
}
