//! Integration tests for the sequential pipelines: paginated query, single
//! lookup, and the interval push stream.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use record_stream_core::diagnostics::{PipelineEvent, PipelineKind};
use record_stream_core::error::PipelineError;
use record_stream_core::filter::FilterConfig;
use record_stream_core::query::{FanOutQuery, PageQuery};
use record_stream_core::record::{Record, RecordId};
use record_stream_core::store::InMemoryRecordStore;
use record_stream_runtime::{PipelineConfig, Pipelines};
use record_stream_testing::{RecordingSink, UnavailableStore, article_store, mixed_store, properties};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn pipelines_over(store: InMemoryRecordStore) -> Pipelines {
    Pipelines::new(Arc::new(store), PipelineConfig::default())
}

fn page(name: Option<&str>, page: u64, size: u64) -> PageQuery {
    PageQuery {
        name_filter: name.map(str::to_string),
        page,
        size,
        delay: Duration::ZERO,
    }
}

fn ids(records: &[Record]) -> Vec<i64> {
    records.iter().map(|r| r.id().value()).collect()
}

#[tokio::test]
async fn third_page_of_articles() {
    let records = pipelines_over(article_store(100))
        .paginated(&page(Some("article"), 2, 10))
        .collect_all()
        .await
        .unwrap();

    assert_eq!(records.len(), 10);
    assert!(records.iter().all(|r| r.name().contains("article")));
    assert_eq!(ids(&records), (20..30).collect::<Vec<_>>());
}

#[tokio::test]
async fn page_past_the_end_is_empty() {
    let records = pipelines_over(article_store(100))
        .paginated(&page(Some("article"), 11, 10))
        .collect_all()
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn absent_name_pages_every_active_record() {
    let records = pipelines_over(mixed_store())
        .paginated(&page(None, 0, 10))
        .collect_all()
        .await
        .unwrap();
    assert_eq!(ids(&records), vec![1, 3, 4, 12]);
}

#[tokio::test]
async fn absent_name_fans_out_nothing() {
    let records = pipelines_over(mixed_store())
        .fan_out(&FanOutQuery::default())
        .collect_all()
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn empty_name_fans_out_every_active_record() {
    let query = FanOutQuery {
        name_filter: Some(String::new()),
        delay: Duration::ZERO,
    };
    let mut records = pipelines_over(mixed_store())
        .fan_out(&query)
        .collect_all()
        .await
        .unwrap();
    records.sort_by_key(Record::id);
    assert_eq!(ids(&records), vec![1, 3, 4, 12]);
}

#[tokio::test]
async fn inactive_records_never_appear() {
    let records = pipelines_over(mixed_store())
        .paginated(&page(Some("article"), 0, 10))
        .collect_all()
        .await
        .unwrap();
    assert_eq!(ids(&records), vec![1, 4, 12]);
}

#[tokio::test(start_paused = true)]
async fn delay_is_paid_per_filtered_record_before_the_page() {
    let query = PageQuery {
        delay: Duration::from_millis(100),
        ..page(Some("article"), 0, 2)
    };
    let mut sub = pipelines_over(mixed_store()).paginated(&query);
    sub.request(1);

    let start = Instant::now();
    let first = sub.next().await.unwrap().unwrap();
    let elapsed = start.elapsed();

    assert_eq!(first.id(), RecordId::new(1));
    // Three records pass the filter and each is held before sorting.
    assert!(elapsed >= Duration::from_millis(300), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(400), "elapsed {elapsed:?}");
}

#[tokio::test]
async fn store_failure_is_reported_once() {
    let sink = RecordingSink::new();
    let pipelines = Pipelines::new(
        Arc::new(UnavailableStore::after(record_stream_testing::fixtures::mixed_records())),
        PipelineConfig::default(),
    )
    .with_sink(sink.clone());

    let result = pipelines.paginated(&page(None, 0, 10)).collect_all().await;

    assert!(matches!(result, Err(PipelineError::StoreUnavailable(_))));
    assert_eq!(sink.count(|e| matches!(e, PipelineEvent::Failed { .. })), 1);
    assert_eq!(sink.count(|e| matches!(e, PipelineEvent::Completed)), 0);
}

#[tokio::test]
async fn lookup_errors() {
    let missing = pipelines_over(article_store(3)).find(RecordId::new(42)).await;
    assert_eq!(missing, Err(PipelineError::RecordNotFound { id: RecordId::new(42) }));

    let down = Pipelines::new(Arc::new(UnavailableStore::new()), PipelineConfig::default())
        .find(RecordId::new(1))
        .await;
    assert!(matches!(down, Err(PipelineError::StoreUnavailable(_))));
}

#[tokio::test]
async fn diagnostics_go_to_the_injected_sink() {
    let sink = RecordingSink::new();
    let pipelines = pipelines_over(article_store(30)).with_sink(sink.clone());

    let records = pipelines
        .paginated(&page(Some("article"), 1, 5))
        .collect_all()
        .await
        .unwrap();
    assert_eq!(records.len(), 5);

    let events = sink.events();
    assert!(events.iter().all(|(kind, _)| *kind == PipelineKind::Paginated));
    assert_eq!(sink.count(|e| matches!(e, PipelineEvent::Accepted { .. })), 30);
    assert!(events.contains(&(
        PipelineKind::Paginated,
        PipelineEvent::Windowed {
            buffered: 30,
            selected: 5
        }
    )));
    assert_eq!(events.last().map(|(_, e)| e), Some(&PipelineEvent::Completed));
}

#[tokio::test(start_paused = true)]
async fn heartbeat_ticks_once_per_period_until_cancelled() {
    let pipelines = pipelines_over(InMemoryRecordStore::default());
    let mut ticks = pipelines.heartbeat();
    ticks.handle().request_unbounded();

    let deadline = Instant::now() + Duration::from_millis(5_500);
    let mut seen = Vec::new();
    while let Ok(Some(tick)) = tokio::time::timeout_at(deadline, ticks.next()).await {
        seen.push(tick.unwrap().seq);
    }

    assert!((4..=6).contains(&seen.len()), "saw {} ticks", seen.len());
    assert!(seen.windows(2).all(|w| w[0] < w[1]));

    ticks.cancel();
    assert!(ticks.next().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn heartbeat_labels() {
    let pipelines = pipelines_over(InMemoryRecordStore::default());
    let mut ticks = pipelines.heartbeat();
    ticks.request(3);
    let mut labels = Vec::new();
    for _ in 0..3 {
        labels.push(ticks.next().await.unwrap().unwrap().label);
    }
    assert_eq!(labels, vec!["artname0<br>", "artname1<br>", "artname2<br>"]);
}

fn catalog() -> Vec<Record> {
    (0..100)
        .map(|i| Record::new(i, format!("article{i}"), i % 3 != 0))
        .collect()
}

proptest! {
    #[test]
    fn pages_are_bounded_sorted_and_filtered(
        (page_index, size) in properties::page_and_size(),
        name in properties::name_filter(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let query = PageQuery { name_filter: name.clone(), page: page_index, size, delay: Duration::ZERO };
        let pipelines = pipelines_over(InMemoryRecordStore::from_records(catalog()));
        let records = runtime
            .block_on(pipelines.paginated(&query).collect_all())
            .unwrap();

        let filter = FilterConfig::paginated(name);
        let expected: Vec<i64> = catalog()
            .iter()
            .filter(|r| filter.matches(r))
            .map(|r| r.id().value())
            .skip(usize::try_from(page_index * size).unwrap())
            .take(usize::try_from(size).unwrap())
            .collect();

        prop_assert!(records.len() as u64 <= size);
        prop_assert!(ids(&records).windows(2).all(|w| w[0] < w[1]));
        prop_assert!(records.iter().all(|r| filter.matches(r)));
        prop_assert_eq!(ids(&records), expected);
    }
}
