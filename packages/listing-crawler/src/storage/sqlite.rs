//! SQLite storage implementation.
//!
//! One database holds both the `listings` table and the append-only
//! `crawl_progress` log. Timestamps are stored as fixed-width RFC 3339 text
//! (microseconds, `Z` suffix) so they compare correctly as strings.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{ListingStore, ProgressStore};
use crate::types::{
    Checkpoint, CheckpointStatus, ListingId, ListingRecord, StoredCheckpoint, StoredListing,
    UpsertOutcome,
};

/// SQLite-backed listing and progress store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `database_url`.
    ///
    /// # Example URLs
    /// - `sqlite://listings.db` - File-based database
    /// - `sqlite::memory:` - Prefer [`SqliteStore::in_memory`]
    pub async fn new(database_url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// An ephemeral store for tests. Every pooled connection to
    /// `:memory:` is its own database, so the pool holds exactly one.
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// Use an existing pool, creating tables if they are missing.
    pub async fn with_pool(pool: SqlitePool) -> StoreResult<Self> {
        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    async fn create_tables(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS listings (
                listing_id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                employer TEXT NOT NULL,
                city TEXT NOT NULL,
                country TEXT NOT NULL,
                description TEXT NOT NULL,
                detail_url TEXT NOT NULL,
                source_query_url TEXT NOT NULL,
                source_site TEXT NOT NULL,
                first_seen_at TEXT NOT NULL,
                last_seen_at TEXT NOT NULL,
                seen_count INTEGER NOT NULL DEFAULT 1
            );

            CREATE INDEX IF NOT EXISTS idx_listings_city ON listings(city);
            CREATE INDEX IF NOT EXISTS idx_listings_last_seen_at ON listings(last_seen_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS crawl_progress (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                location TEXT NOT NULL,
                role TEXT NOT NULL,
                collected_count INTEGER NOT NULL,
                observed_at TEXT NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('in_progress', 'completed', 'error'))
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("invalid timestamp {raw:?}: {e}")))
}

// Row types for sqlx queries
#[derive(Debug, FromRow)]
struct ListingRow {
    listing_id: String,
    title: String,
    employer: String,
    city: String,
    country: String,
    description: String,
    detail_url: String,
    source_query_url: String,
    source_site: String,
    first_seen_at: String,
    last_seen_at: String,
}

impl ListingRow {
    fn into_stored(self) -> StoreResult<StoredListing> {
        let listing_id = ListingId::new(self.listing_id)
            .ok_or_else(|| StoreError::Corrupt("empty listing_id".to_string()))?;

        Ok(StoredListing {
            first_seen_at: parse_timestamp(&self.first_seen_at)?,
            last_seen_at: parse_timestamp(&self.last_seen_at)?,
            record: ListingRecord {
                listing_id,
                title: self.title,
                employer: self.employer,
                city: self.city,
                country: self.country,
                description: self.description,
                detail_url: self.detail_url,
                source_query_url: self.source_query_url,
                source_site: self.source_site,
            },
        })
    }
}

#[derive(Debug, FromRow)]
struct CheckpointRow {
    seq: i64,
    location: String,
    role: String,
    collected_count: i64,
    observed_at: String,
    status: String,
}

impl CheckpointRow {
    fn into_stored(self) -> StoreResult<StoredCheckpoint> {
        let status = CheckpointStatus::parse(&self.status)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown status {:?}", self.status)))?;

        Ok(StoredCheckpoint {
            seq: self.seq,
            location: self.location,
            role: self.role,
            collected_count: self.collected_count.max(0) as usize,
            observed_at: parse_timestamp(&self.observed_at)?,
            status,
        })
    }
}

const LISTING_COLUMNS: &str = "listing_id, title, employer, city, country, description, detail_url, source_query_url, source_site, first_seen_at, last_seen_at";

const CHECKPOINT_COLUMNS: &str = "seq, location, role, collected_count, observed_at, status";

#[async_trait]
impl ListingStore for SqliteStore {
    async fn upsert(&self, record: &ListingRecord) -> StoreResult<UpsertOutcome> {
        let now = timestamp(Utc::now());

        // seen_count = 1 only on the row's first insert
        let (seen_count,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO listings (
                listing_id, title, employer, city, country, description,
                detail_url, source_query_url, source_site, first_seen_at, last_seen_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(listing_id) DO UPDATE SET
                title = excluded.title,
                employer = excluded.employer,
                city = excluded.city,
                country = excluded.country,
                description = excluded.description,
                detail_url = excluded.detail_url,
                source_query_url = excluded.source_query_url,
                source_site = excluded.source_site,
                last_seen_at = MAX(listings.last_seen_at, excluded.last_seen_at),
                seen_count = listings.seen_count + 1
            RETURNING seen_count
            "#,
        )
        .bind(record.listing_id.as_str())
        .bind(&record.title)
        .bind(&record.employer)
        .bind(&record.city)
        .bind(&record.country)
        .bind(&record.description)
        .bind(&record.detail_url)
        .bind(&record.source_query_url)
        .bind(&record.source_site)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        let outcome = if seen_count == 1 {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Refreshed
        };
        debug!(listing_id = %record.listing_id, ?outcome, "Upserted listing");
        Ok(outcome)
    }

    async fn get(&self, listing_id: &ListingId) -> StoreResult<Option<StoredListing>> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE listing_id = ?"
        ))
        .bind(listing_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ListingRow::into_stored).transpose()
    }

    async fn count(&self) -> StoreResult<usize> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM listings")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0 as usize)
    }

    async fn recent(
        &self,
        city: Option<&str>,
        since: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<StoredListing>> {
        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            r#"
            SELECT {LISTING_COLUMNS} FROM listings
            WHERE (?1 IS NULL OR city = ?1) AND last_seen_at >= ?2
            ORDER BY last_seen_at DESC, listing_id DESC
            LIMIT ?3
            "#
        ))
        .bind(city)
        .bind(timestamp(since))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ListingRow::into_stored).collect()
    }
}

#[async_trait]
impl ProgressStore for SqliteStore {
    async fn append(&self, checkpoint: &Checkpoint) -> StoreResult<StoredCheckpoint> {
        let row = sqlx::query_as::<_, CheckpointRow>(&format!(
            r#"
            INSERT INTO crawl_progress (location, role, collected_count, observed_at, status)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {CHECKPOINT_COLUMNS}
            "#
        ))
        .bind(&checkpoint.location)
        .bind(&checkpoint.role)
        .bind(checkpoint.collected_count as i64)
        .bind(timestamp(Utc::now()))
        .bind(checkpoint.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        row.into_stored()
    }

    async fn last_in_progress(&self) -> StoreResult<Option<StoredCheckpoint>> {
        let row = sqlx::query_as::<_, CheckpointRow>(&format!(
            "SELECT {CHECKPOINT_COLUMNS} FROM crawl_progress WHERE status = ? ORDER BY seq DESC LIMIT 1"
        ))
        .bind(CheckpointStatus::InProgress.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(CheckpointRow::into_stored).transpose()
    }

    async fn since(&self, seq: i64) -> StoreResult<Vec<StoredCheckpoint>> {
        let rows = sqlx::query_as::<_, CheckpointRow>(&format!(
            "SELECT {CHECKPOINT_COLUMNS} FROM crawl_progress WHERE seq > ? ORDER BY seq"
        ))
        .bind(seq)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CheckpointRow::into_stored).collect()
    }
}
