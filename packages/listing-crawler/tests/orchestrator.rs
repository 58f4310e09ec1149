use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use listing_crawler::error::{StoreResult, TransportResult};
use listing_crawler::testing::{
    numbered_stubs, search_page_html, test_config, FixedAgent, MockTransport, RecordingDelay,
};
use listing_crawler::{
    catalog, Checkpoint, CheckpointStatus, CrawlOrchestrator, CrawlerConfig, FetchRequest,
    FetchResponse, ListingId, ListingRecord, ListingStore, MemoryStore, ProgressStore, Query,
    QueryPlan, Role, SearchResultsMarkup, SiteClient, StoreError, StoredCheckpoint,
    StoredListing, Transport, UpsertOutcome,
};

fn plan(config: &CrawlerConfig) -> QueryPlan {
    let roles = vec![Role::new("Chef", 1.0), Role::new("Barista", 1.0)];
    QueryPlan::build(roles, catalog::default_locations(), config).unwrap()
}

fn page_url(config: &CrawlerConfig, role: &str, city: &str, offset: usize) -> String {
    let location = catalog::default_locations()
        .into_iter()
        .find(|l| l.city == city)
        .unwrap();
    Query::new(role, location, 0)
        .page_url(&config.search_url, offset)
        .to_string()
}

fn orchestrator(
    config: &CrawlerConfig,
    mock: &MockTransport,
    delay: &RecordingDelay,
    store: &Arc<MemoryStore>,
) -> CrawlOrchestrator {
    let client = SiteClient::new(
        Arc::new(mock.clone()),
        Arc::new(FixedAgent("test-agent".to_string())),
        delay.pacer(),
        config.max_rate_limit_retries,
    );
    CrawlOrchestrator::new(
        config,
        client,
        Arc::new(SearchResultsMarkup::new()),
        store.clone(),
        store.clone(),
    )
}

/// Every query in the plan answers with an empty results page.
fn empty_site(config: &CrawlerConfig) -> MockTransport {
    let mut mock = MockTransport::new();
    for role in ["Chef", "Barista"] {
        for city in ["Sydney", "Melbourne", "Brisbane"] {
            mock = mock.with_page(page_url(config, role, city, 0), search_page_html(&[]));
        }
    }
    mock
}

fn settled_rows(rows: &[StoredCheckpoint], role: &str) -> Vec<(String, usize, CheckpointStatus)> {
    rows.iter()
        .filter(|r| r.role == role && r.status.is_settled())
        .map(|r| (r.location.clone(), r.collected_count, r.status))
        .collect()
}

#[tokio::test]
async fn test_failing_location_does_not_stop_siblings() {
    let config = test_config();
    let mock = empty_site(&config)
        .with_page(
            page_url(&config, "Chef", "Sydney", 0),
            search_page_html(&numbered_stubs(1..=2)),
        )
        .with_page(
            page_url(&config, "Chef", "Melbourne", 0),
            search_page_html(&numbered_stubs(3..=3)),
        )
        .with_failures(page_url(&config, "Chef", "Brisbane", 0), 10);
    let delay = RecordingDelay::new();
    let store = Arc::new(MemoryStore::new());

    let summary = orchestrator(&config, &mock, &delay, &store)
        .run(&plan(&config))
        .await
        .unwrap();

    assert_eq!(summary.roles_run, 2);
    assert_eq!(summary.queries_completed, 5);
    assert_eq!(summary.queries_failed, 1);
    assert_eq!(summary.listings_inserted, 3);
    assert_eq!(summary.store_failures, 0);
    assert_eq!(store.count().await.unwrap(), 3);

    let rows = store.checkpoints().await;
    let mut chef = settled_rows(&rows, "Chef");
    chef.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        chef,
        vec![
            ("Brisbane".to_string(), 0, CheckpointStatus::Error),
            ("Melbourne".to_string(), 1, CheckpointStatus::Completed),
            ("Sydney".to_string(), 2, CheckpointStatus::Completed),
        ]
    );

    // in_progress rows for every location precede the role's settled rows
    let first_chef_settled = rows
        .iter()
        .position(|r| r.role == "Chef" && r.status.is_settled())
        .unwrap();
    assert!(rows[..first_chef_settled]
        .iter()
        .all(|r| r.status == CheckpointStatus::InProgress));
    assert_eq!(first_chef_settled, 3);
}

#[tokio::test]
async fn test_abandoned_query_keeps_partial_listings() {
    let config = test_config().with_page_size(2);
    let mock = empty_site(&config)
        .with_page(
            page_url(&config, "Chef", "Sydney", 0),
            search_page_html(&numbered_stubs(1..=2)),
        )
        .with_failures(page_url(&config, "Chef", "Sydney", 2), 10);
    let delay = RecordingDelay::new();
    let store = Arc::new(MemoryStore::new());

    let summary = orchestrator(&config, &mock, &delay, &store)
        .run(&plan(&config))
        .await
        .unwrap();

    assert_eq!(summary.queries_failed, 1);
    assert_eq!(summary.listings_inserted, 2);

    let rows = store.checkpoints().await;
    assert!(settled_rows(&rows, "Chef").contains(&(
        "Sydney".to_string(),
        2,
        CheckpointStatus::Error
    )));
    assert!(store.get(&ListingId::new("2").unwrap()).await.unwrap().is_some());
}

#[tokio::test]
async fn test_same_listing_twice_in_one_run_is_one_row() {
    let config = test_config();
    let mock = empty_site(&config)
        .with_page(
            page_url(&config, "Chef", "Sydney", 0),
            search_page_html(&numbered_stubs(42..=42)),
        )
        .with_page(
            page_url(&config, "Barista", "Sydney", 0),
            search_page_html(&numbered_stubs(42..=42)),
        );
    let delay = RecordingDelay::new();
    let store = Arc::new(MemoryStore::new());
    let id = ListingId::new("42").unwrap();

    let summary = orchestrator(&config, &mock, &delay, &store)
        .run(&plan(&config))
        .await
        .unwrap();

    assert_eq!(summary.listings_inserted, 1);
    assert_eq!(summary.listings_refreshed, 1);
    assert_eq!(store.count().await.unwrap(), 1);

    let stored = store.get(&id).await.unwrap().unwrap();
    assert!(stored.last_seen_at >= stored.first_seen_at);
    // the Barista pass wrote last
    assert!(stored.record.source_query_url.contains("Barista"));
}

#[tokio::test]
async fn test_resume_skips_finished_role() {
    let config = test_config();
    let mock = empty_site(&config);
    let delay = RecordingDelay::new();
    let store = Arc::new(MemoryStore::new());

    for city in ["Sydney", "Melbourne", "Brisbane"] {
        store
            .append(&Checkpoint::new(city, "Chef", 0, CheckpointStatus::InProgress))
            .await
            .unwrap();
    }
    for city in ["Sydney", "Melbourne", "Brisbane"] {
        store
            .append(&Checkpoint::new(city, "Chef", 5, CheckpointStatus::Completed))
            .await
            .unwrap();
    }

    let summary = orchestrator(&config, &mock, &delay, &store)
        .run(&plan(&config))
        .await
        .unwrap();

    assert_eq!(summary.roles_run, 1);
    assert_eq!(mock.calls_to(&page_url(&config, "Chef", "Sydney", 0)), 0);
    assert_eq!(mock.calls_to(&page_url(&config, "Barista", "Sydney", 0)), 1);
}

#[tokio::test]
async fn test_resume_reruns_interrupted_role() {
    let config = test_config();
    let mock = empty_site(&config);
    let delay = RecordingDelay::new();
    let store = Arc::new(MemoryStore::new());

    for city in ["Sydney", "Melbourne", "Brisbane"] {
        store
            .append(&Checkpoint::new(city, "Barista", 0, CheckpointStatus::InProgress))
            .await
            .unwrap();
    }
    store
        .append(&Checkpoint::new("Sydney", "Barista", 5, CheckpointStatus::Completed))
        .await
        .unwrap();

    let summary = orchestrator(&config, &mock, &delay, &store)
        .run(&plan(&config))
        .await
        .unwrap();

    // every location of the interrupted role runs again
    assert_eq!(summary.roles_run, 1);
    assert_eq!(summary.queries_completed, 3);
    for city in ["Sydney", "Melbourne", "Brisbane"] {
        assert_eq!(mock.calls_to(&page_url(&config, "Barista", city, 0)), 1);
    }
}

#[tokio::test]
async fn test_pause_between_roles_only() {
    let config = test_config();
    let mock = empty_site(&config);
    let delay = RecordingDelay::new();
    let store = Arc::new(MemoryStore::new());

    orchestrator(&config, &mock, &delay, &store)
        .run(&plan(&config))
        .await
        .unwrap();

    // empty pages fetch no details, so every 1-2s window is a between-roles pause
    assert_eq!(delay.count(config.pacing.between_roles), 1);
}

/// Answers like the wrapped mock after a fixed delay.
struct SlowTransport {
    inner: MockTransport,
    latency: Duration,
}

#[async_trait]
impl Transport for SlowTransport {
    async fn get(&self, request: &FetchRequest) -> TransportResult<FetchResponse> {
        tokio::time::sleep(self.latency).await;
        self.inner.get(request).await
    }
}

/// Refuses every listing write.
struct RejectingListings;

#[async_trait]
impl ListingStore for RejectingListings {
    async fn upsert(&self, _record: &ListingRecord) -> StoreResult<UpsertOutcome> {
        Err(StoreError::Corrupt("disk full".to_string()))
    }

    async fn get(&self, _listing_id: &ListingId) -> StoreResult<Option<StoredListing>> {
        Ok(None)
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(0)
    }

    async fn recent(
        &self,
        _city: Option<&str>,
        _since: DateTime<Utc>,
        _limit: usize,
    ) -> StoreResult<Vec<StoredListing>> {
        Ok(Vec::new())
    }
}

#[tokio::test(start_paused = true)]
async fn test_locations_of_a_role_run_concurrently() {
    let config = test_config();
    let roles = vec![Role::new("Chef", 1.0)];
    let plan = QueryPlan::build(roles, catalog::default_locations(), &config).unwrap();
    let transport = SlowTransport {
        inner: empty_site(&config),
        latency: Duration::from_secs(10),
    };
    let delay = RecordingDelay::new();
    let store = Arc::new(MemoryStore::new());
    let client = SiteClient::new(
        Arc::new(transport),
        Arc::new(FixedAgent("test-agent".to_string())),
        delay.pacer(),
        config.max_rate_limit_retries,
    );
    let orchestrator = CrawlOrchestrator::new(
        &config,
        client,
        Arc::new(SearchResultsMarkup::new()),
        store.clone(),
        store.clone(),
    );

    let started = tokio::time::Instant::now();
    let summary = orchestrator.run(&plan).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(summary.queries_completed, 3);
    // three 10s page fetches overlap instead of adding up to 30s
    assert!(elapsed >= Duration::from_secs(10));
    assert!(elapsed < Duration::from_secs(20), "role took {elapsed:?}");
}

#[tokio::test]
async fn test_checkpoint_counts_collected_listings_when_writes_fail() {
    let config = test_config();
    let mock = empty_site(&config).with_page(
        page_url(&config, "Chef", "Sydney", 0),
        search_page_html(&numbered_stubs(1..=2)),
    );
    let delay = RecordingDelay::new();
    let progress = Arc::new(MemoryStore::new());
    let client = SiteClient::new(
        Arc::new(mock),
        Arc::new(FixedAgent("test-agent".to_string())),
        delay.pacer(),
        config.max_rate_limit_retries,
    );
    let orchestrator = CrawlOrchestrator::new(
        &config,
        client,
        Arc::new(SearchResultsMarkup::new()),
        Arc::new(RejectingListings),
        progress.clone(),
    );

    let summary = orchestrator.run(&plan(&config)).await.unwrap();

    assert_eq!(summary.listings_inserted, 0);
    assert_eq!(summary.store_failures, 2);
    let rows = progress.checkpoints().await;
    assert!(settled_rows(&rows, "Chef").contains(&(
        "Sydney".to_string(),
        2,
        CheckpointStatus::Completed
    )));
}
