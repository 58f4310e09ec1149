use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::error::{StoreResult, TransportResult};
use crate::pacing::DelayWindow;
use crate::types::*;

// ============================================================================
// TRANSPORT: Network access (proxy routing lives inside the implementation)
// ============================================================================

/// A single GET issued by a fetcher.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub user_agent: String,
}

/// A successful (2xx) response.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET. 429 must surface as `TransportError::RateLimited`,
    /// other non-success statuses as `TransportError::Status`.
    async fn get(&self, request: &FetchRequest) -> TransportResult<FetchResponse>;
}

// ============================================================================
// MARKUP: HTML → structured fields (site-specific)
// ============================================================================

pub trait MarkupExtractor: Send + Sync {
    /// Listing stubs on a search-results page, in page order.
    /// `None` when the results container is missing.
    fn search_results(&self, html: &str) -> Option<Vec<ListingStub>>;

    /// Raw description block of a detail page.
    fn description(&self, html: &str) -> Option<String>;
}

// ============================================================================
// PACING: Injectable randomness
// ============================================================================

pub trait DelayPolicy: Send + Sync {
    /// Pick a duration inside `window`.
    fn pick(&self, window: DelayWindow) -> Duration;
}

pub trait AgentProvider: Send + Sync {
    /// User agent for the next request.
    fn user_agent(&self) -> String;
}

// ============================================================================
// STORAGE: Listings (upsert keyed by identity)
// ============================================================================

#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Insert a new listing or refresh an existing one. `first_seen_at` is
    /// only ever written by the insert.
    async fn upsert(&self, record: &ListingRecord) -> StoreResult<UpsertOutcome>;

    async fn get(&self, listing_id: &ListingId) -> StoreResult<Option<StoredListing>>;

    async fn count(&self) -> StoreResult<usize>;

    /// Most recently seen listings, optionally for one city.
    async fn recent(
        &self,
        city: Option<&str>,
        since: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<StoredListing>>;
}

// ============================================================================
// STORAGE: Progress (append-only checkpoint log)
// ============================================================================

#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Append a row; never touches existing rows.
    async fn append(&self, checkpoint: &Checkpoint) -> StoreResult<StoredCheckpoint>;

    /// Most recent row with status `in_progress`.
    async fn last_in_progress(&self) -> StoreResult<Option<StoredCheckpoint>>;

    /// Rows appended after `seq`, oldest first.
    async fn since(&self, seq: i64) -> StoreResult<Vec<StoredCheckpoint>>;
}
