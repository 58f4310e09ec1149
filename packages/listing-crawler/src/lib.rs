//! Resumable Job-Listing Crawler
//!
//! Crawls a job search site across a weighted (role × location) plan and
//! upserts every listing it finds into a local SQLite database. Progress is
//! checkpointed per query so an interrupted run picks up where it left off.
//!
//! # Usage
//!
//! ```rust,ignore
//! use listing_crawler::{catalog, CrawlOrchestrator, CrawlerConfig, QueryPlan, SqliteStore};
//!
//! let config = CrawlerConfig::from_env()?;
//! let store = Arc::new(SqliteStore::new(&config.database_url).await?);
//! let plan = QueryPlan::build(catalog::default_roles(), catalog::default_locations(), &config)?;
//!
//! let orchestrator = CrawlOrchestrator::new(&config, client, markup, store.clone(), store);
//! let summary = orchestrator.run(&plan).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Seams for transport, markup, pacing and storage
//! - [`types`] - Queries, listings and checkpoints
//! - [`executor`] - Pagination state machine for one query
//! - [`orchestrator`] - Resumable driver over the whole plan
//! - [`storage`] - SQLite and in-memory stores
//! - [`transport`] - reqwest transport and a rate-limited wrapper
//! - [`testing`] - Mock transport, recording delays and HTML fixtures

pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod fetch;
pub mod identity;
pub mod markup;
pub mod normalize;
pub mod orchestrator;
pub mod pacing;
pub mod plan;
pub mod progress;
pub mod security;
pub mod storage;
pub mod testing;
pub mod traits;
pub mod transport;
pub mod types;

// Re-export core types at crate root
pub use config::CrawlerConfig;
pub use error::{CrawlError, FetchError, QueryError, StoreError, TransportError};
pub use executor::QueryExecutor;
pub use fetch::{DetailFetcher, ListingPage, ListingPageFetcher, SiteClient};
pub use identity::extract_listing_id;
pub use markup::SearchResultsMarkup;
pub use normalize::normalize_description;
pub use orchestrator::{CrawlOrchestrator, RunSummary};
pub use pacing::{DelayWindow, FixedAgent, Pacer, Pacing, RandomDelay, RotatingAgents};
pub use plan::{PlannedRole, QueryPlan};
pub use progress::ProgressTracker;
pub use security::{ProxyConfig, SecretString};
pub use storage::{MemoryStore, SqliteStore};
pub use traits::{
    AgentProvider, DelayPolicy, FetchRequest, FetchResponse, ListingStore, MarkupExtractor,
    ProgressStore, Transport,
};
pub use transport::{HttpTransport, RateLimitedTransport, TransportExt};
pub use types::*;
