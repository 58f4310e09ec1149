//! Typed errors for the listing crawler.
//!
//! Library code uses `thiserror`; the binary and environment loading use
//! `anyhow` at the edges.

use thiserror::Error;

use crate::types::ListingRecord;

/// Failures surfaced by a [`Transport`](crate::traits::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The site answered 429 Too Many Requests
    #[error("rate limited: {url}")]
    RateLimited { url: String },

    /// Any other non-success status
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Connection, TLS, timeout or body read failure
    #[error("request failed for {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl TransportError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, TransportError::RateLimited { .. })
    }
}

/// Errors returned by the listing page fetcher. All of them are retryable
/// from the point of view of the query executor.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Still rate limited after the bounded number of backoffs
    #[error("still rate limited after {attempts} backoffs: {url}")]
    RateLimitExhausted { url: String, attempts: u32 },

    /// Transport failure other than rate limiting
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// A query that could not run to completion.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Page retries were exhausted; `partial` holds the records emitted
    /// before the failing page.
    #[error("{role} in {city} abandoned at offset {offset} after {attempts} attempts: {source}")]
    Abandoned {
        role: String,
        city: String,
        offset: usize,
        attempts: u32,
        #[source]
        source: FetchError,
        partial: Vec<ListingRecord>,
    },
}

impl QueryError {
    /// Consume the error, keeping the records collected before it happened.
    pub fn into_partial(self) -> Vec<ListingRecord> {
        match self {
            QueryError::Abandoned { partial, .. } => partial,
        }
    }
}

/// Storage failures from either store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database driver error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A persisted row could not be decoded
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Errors that end a crawl run.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The resume point could not be read
    #[error("failed to read crawl progress: {0}")]
    Progress(#[source] StoreError),

    /// The query plan is unusable
    #[error("invalid plan: {reason}")]
    InvalidPlan { reason: String },

    /// The crawler configuration is unusable
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },
}

/// Result type alias for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Result type alias for page fetches.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for crawl runs.
pub type Result<T> = std::result::Result<T, CrawlError>;
