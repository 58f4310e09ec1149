//! Top-level crawl driver.
//!
//! Roles run strictly in plan order starting from the resume point; the
//! locations of one role run concurrently. Individual query or store
//! failures are checkpointed and counted, never fatal.

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::CrawlerConfig;
use crate::error::{CrawlError, Result};
use crate::executor::QueryExecutor;
use crate::fetch::SiteClient;
use crate::pacing::Pacer;
use crate::plan::QueryPlan;
use crate::progress::ProgressTracker;
use crate::traits::{ListingStore, MarkupExtractor, ProgressStore};
use crate::types::{CheckpointStatus, ListingRecord, Query, UpsertOutcome};

/// Counters for one orchestrator run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub roles_run: usize,
    pub queries_completed: usize,
    pub queries_failed: usize,
    pub listings_inserted: usize,
    pub listings_refreshed: usize,
    /// Listing upserts and checkpoint writes that failed
    pub store_failures: usize,
}

impl RunSummary {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            ..Default::default()
        }
    }

    fn absorb(&mut self, outcome: QueryOutcome) {
        if outcome.completed {
            self.queries_completed += 1;
        } else {
            self.queries_failed += 1;
        }
        self.listings_inserted += outcome.inserted;
        self.listings_refreshed += outcome.refreshed;
        self.store_failures += outcome.store_failures;
    }
}

/// What one location's query contributed.
#[derive(Debug, Default)]
struct QueryOutcome {
    completed: bool,
    inserted: usize,
    refreshed: usize,
    store_failures: usize,
}

pub struct CrawlOrchestrator {
    executor: QueryExecutor,
    listings: Arc<dyn ListingStore>,
    progress: ProgressTracker,
    pacer: Pacer,
}

impl CrawlOrchestrator {
    pub fn new(
        config: &CrawlerConfig,
        client: SiteClient,
        markup: Arc<dyn MarkupExtractor>,
        listings: Arc<dyn ListingStore>,
        progress: Arc<dyn ProgressStore>,
    ) -> Self {
        let pacer = client.pacer().clone();
        Self {
            executor: QueryExecutor::from_config(config, client, markup),
            listings,
            progress: ProgressTracker::new(progress),
            pacer,
        }
    }

    /// Run the plan once, from the resume point to the last role.
    ///
    /// Only a failure to read the resume point ends the run early.
    pub async fn run(&self, plan: &QueryPlan) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let span = info_span!("crawl_run", %run_id);

        async move {
            let start = self
                .progress
                .resume_index(plan)
                .await
                .map_err(CrawlError::Progress)?;

            info!(
                roles = plan.len(),
                locations = plan.locations().len(),
                start,
                "Starting crawl"
            );

            let mut summary = RunSummary::new(run_id);
            for (run_position, index) in (start..plan.len()).enumerate() {
                if run_position > 0 {
                    self.pacer.between_roles().await;
                }
                self.run_role(plan, index, &mut summary).await;
                summary.roles_run += 1;
            }

            info!(
                roles_run = summary.roles_run,
                queries_completed = summary.queries_completed,
                queries_failed = summary.queries_failed,
                listings_inserted = summary.listings_inserted,
                listings_refreshed = summary.listings_refreshed,
                store_failures = summary.store_failures,
                "Crawl finished"
            );
            Ok(summary)
        }
        .instrument(span)
        .await
    }

    async fn run_role(&self, plan: &QueryPlan, index: usize, summary: &mut RunSummary) {
        let queries = plan.queries_for(index);
        let Some(planned) = plan.roles().get(index) else {
            return;
        };
        info!(
            role = %planned.role.title,
            weight = planned.role.weight,
            target_per_location = planned.target_per_location,
            "Starting role"
        );

        for query in &queries {
            if let Err(e) = self
                .progress
                .record(&query.location.city, &query.role, 0, CheckpointStatus::InProgress)
                .await
            {
                error!(role = %query.role, city = %query.location.city, error = %e, "Failed to record checkpoint");
                summary.store_failures += 1;
            }
        }

        let outcomes = join_all(queries.iter().map(|query| {
            let span = info_span!("query", role = %query.role, city = %query.location.city);
            self.run_query(query).instrument(span)
        }))
        .await;

        for outcome in outcomes {
            summary.absorb(outcome);
        }
    }

    /// Run one query, persist what it collected and settle its checkpoint.
    ///
    /// The checkpoint count is the number of records the query collected,
    /// whether or not every upsert succeeded.
    async fn run_query(&self, query: &Query) -> QueryOutcome {
        let (records, status) = match self.executor.run(query).await {
            Ok(records) => (records, CheckpointStatus::Completed),
            Err(e) => {
                error!(error = %e, "Query abandoned");
                (e.into_partial(), CheckpointStatus::Error)
            }
        };

        let mut outcome = self.persist(&records).await;
        outcome.completed = status == CheckpointStatus::Completed;

        if let Err(e) = self
            .progress
            .record(&query.location.city, &query.role, records.len(), status)
            .await
        {
            error!(error = %e, "Failed to record checkpoint");
            outcome.store_failures += 1;
        }

        info!(
            status = %status,
            inserted = outcome.inserted,
            refreshed = outcome.refreshed,
            "Query settled"
        );
        outcome
    }

    async fn persist(&self, records: &[ListingRecord]) -> QueryOutcome {
        let mut outcome = QueryOutcome::default();

        for record in records {
            match self.listings.upsert(record).await {
                Ok(UpsertOutcome::Inserted) => outcome.inserted += 1,
                Ok(UpsertOutcome::Refreshed) => outcome.refreshed += 1,
                Err(e) => {
                    error!(listing_id = %record.listing_id, error = %e, "Failed to store listing");
                    outcome.store_failures += 1;
                }
            }
        }
        outcome
    }
}
