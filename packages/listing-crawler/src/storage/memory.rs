//! In-memory storage implementation for testing and dry runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::StoreResult;
use crate::traits::{ListingStore, ProgressStore};
use crate::types::{
    Checkpoint, CheckpointStatus, ListingId, ListingRecord, StoredCheckpoint, StoredListing,
    UpsertOutcome,
};

/// In-memory listings and progress log.
///
/// Data is lost on drop.
#[derive(Default)]
pub struct MemoryStore {
    listings: RwLock<HashMap<ListingId, StoredListing>>,
    checkpoints: RwLock<Vec<StoredCheckpoint>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every checkpoint row, oldest first.
    pub async fn checkpoints(&self) -> Vec<StoredCheckpoint> {
        self.checkpoints.read().await.clone()
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn upsert(&self, record: &ListingRecord) -> StoreResult<UpsertOutcome> {
        let now = Utc::now();
        let mut listings = self.listings.write().await;

        match listings.get_mut(&record.listing_id) {
            Some(existing) => {
                existing.record = record.clone();
                existing.last_seen_at = existing.last_seen_at.max(now);
                Ok(UpsertOutcome::Refreshed)
            }
            None => {
                listings.insert(
                    record.listing_id.clone(),
                    StoredListing {
                        record: record.clone(),
                        first_seen_at: now,
                        last_seen_at: now,
                    },
                );
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    async fn get(&self, listing_id: &ListingId) -> StoreResult<Option<StoredListing>> {
        Ok(self.listings.read().await.get(listing_id).cloned())
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.listings.read().await.len())
    }

    async fn recent(
        &self,
        city: Option<&str>,
        since: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<StoredListing>> {
        let listings = self.listings.read().await;
        let mut matching: Vec<StoredListing> = listings
            .values()
            .filter(|l| city.map_or(true, |c| l.record.city == c))
            .filter(|l| l.last_seen_at >= since)
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            b.last_seen_at
                .cmp(&a.last_seen_at)
                .then_with(|| b.record.listing_id.cmp(&a.record.listing_id))
        });
        matching.truncate(limit);
        Ok(matching)
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn append(&self, checkpoint: &Checkpoint) -> StoreResult<StoredCheckpoint> {
        let mut checkpoints = self.checkpoints.write().await;
        let seq = checkpoints.last().map_or(1, |last| last.seq + 1);

        let stored = StoredCheckpoint {
            seq,
            location: checkpoint.location.clone(),
            role: checkpoint.role.clone(),
            collected_count: checkpoint.collected_count,
            observed_at: Utc::now(),
            status: checkpoint.status,
        };
        checkpoints.push(stored.clone());
        Ok(stored)
    }

    async fn last_in_progress(&self) -> StoreResult<Option<StoredCheckpoint>> {
        Ok(self
            .checkpoints
            .read()
            .await
            .iter()
            .rev()
            .find(|c| c.status == CheckpointStatus::InProgress)
            .cloned())
    }

    async fn since(&self, seq: i64) -> StoreResult<Vec<StoredCheckpoint>> {
        Ok(self
            .checkpoints
            .read()
            .await
            .iter()
            .filter(|c| c.seq > seq)
            .cloned()
            .collect())
    }
}
