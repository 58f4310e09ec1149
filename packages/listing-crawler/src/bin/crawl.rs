//! Listing Crawler
//!
//! Runs the default role × location plan once against the configured
//! search site and exits. Re-running resumes from the last checkpoint.

use std::num::NonZeroU32;
use std::sync::Arc;

use anyhow::{Context, Result};
use listing_crawler::{
    catalog, AgentProvider, CrawlOrchestrator, CrawlerConfig, FixedAgent, HttpTransport, Pacer,
    QueryPlan, RandomDelay, RotatingAgents, SearchResultsMarkup, SiteClient, SqliteStore, Transport,
    TransportExt,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,listing_crawler=debug,sqlx=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let config = CrawlerConfig::from_env().context("Failed to load configuration")?;
    tracing::info!(
        database_url = %config.database_url,
        search_url = %config.search_url,
        proxy = config.proxy.is_some(),
        "Starting listing crawler"
    );

    let store = Arc::new(
        SqliteStore::new(&config.database_url)
            .await
            .context("Failed to open listing database")?,
    );

    let http = HttpTransport::new(config.request_timeout, config.proxy.as_ref())
        .context("Failed to build HTTP client")?;
    let transport: Arc<dyn Transport> =
        match config.max_requests_per_minute.and_then(NonZeroU32::new) {
            Some(per_minute) => {
                tracing::info!(per_minute = per_minute.get(), "Request quota enabled");
                Arc::new(http.rate_limited(per_minute))
            }
            None => Arc::new(http),
        };

    let agents: Arc<dyn AgentProvider> = match &config.user_agent {
        Some(agent) => Arc::new(FixedAgent(agent.clone())),
        None => Arc::new(RotatingAgents::default()),
    };

    let pacer = Pacer::new(Arc::new(RandomDelay), config.pacing);
    let client = SiteClient::new(transport, agents, pacer, config.max_rate_limit_retries);

    let plan = QueryPlan::build(
        catalog::default_roles(),
        catalog::default_locations(),
        &config,
    )
    .context("Failed to build query plan")?;

    let orchestrator = CrawlOrchestrator::new(
        &config,
        client,
        Arc::new(SearchResultsMarkup::new()),
        store.clone(),
        store,
    );

    let summary = orchestrator.run(&plan).await.context("Crawl failed")?;
    tracing::info!(
        summary = %serde_json::to_string(&summary).context("Failed to serialize run summary")?,
        "Run summary"
    );

    Ok(())
}
