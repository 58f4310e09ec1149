//! Pagination driver for a single (role, location) query.
//!
//! ```text
//! Paging{offset} ──page──▶ Batching{stubs, next_offset} ──▶ Paging{offset + page_size}
//!       │  ▲                         │
//!  error└──┘ (same offset)           └──short page / target reached──▶ Done
//! ```
//!
//! Only a page with no cards at all ends paging from `Paging`. A full page
//! whose cards all lack an identity still advances to the next offset.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::CrawlerConfig;
use crate::error::QueryError;
use crate::fetch::{DetailFetcher, ListingPageFetcher, SiteClient};
use crate::identity::extract_listing_id;
use crate::pacing::Pacer;
use crate::traits::MarkupExtractor;
use crate::types::{ListingRecord, ListingStub, Query};

#[derive(Debug)]
enum ExecutorState {
    Paging {
        offset: usize,
    },
    Batching {
        stubs: Vec<ListingStub>,
        /// `None` when this was the last page
        next_offset: Option<usize>,
    },
    Done,
}

/// Runs one query to completion, returning every record it collected.
pub struct QueryExecutor {
    pages: ListingPageFetcher,
    details: DetailFetcher,
    pacer: Pacer,
    batch_size: usize,
    max_page_retries: u32,
    source_site: String,
}

impl QueryExecutor {
    pub fn new(
        pages: ListingPageFetcher,
        details: DetailFetcher,
        pacer: Pacer,
        config: &CrawlerConfig,
    ) -> Self {
        Self {
            pages,
            details,
            pacer,
            batch_size: config.batch_size.max(1),
            max_page_retries: config.max_page_retries.max(1),
            source_site: config.source_site.clone(),
        }
    }

    /// Build both fetchers over a shared client.
    pub fn from_config(
        config: &CrawlerConfig,
        client: SiteClient,
        markup: Arc<dyn MarkupExtractor>,
    ) -> Self {
        let pacer = client.pacer().clone();
        let pages = ListingPageFetcher::new(
            client.clone(),
            markup.clone(),
            config.search_url.clone(),
            config.page_size,
        );
        let details = DetailFetcher::new(client, markup);
        Self::new(pages, details, pacer, config)
    }

    /// Collect up to `query.target_count` records.
    ///
    /// A page that keeps failing abandons the query; the error carries the
    /// records collected before it.
    pub async fn run(&self, query: &Query) -> Result<Vec<ListingRecord>, QueryError> {
        let source_query_url = self.pages.search_url(query).to_string();
        let target = query.target_count;
        let mut records: Vec<ListingRecord> = Vec::new();
        let mut failures = 0u32;
        let mut state = ExecutorState::Paging { offset: 0 };

        loop {
            state = match state {
                ExecutorState::Done => break,

                ExecutorState::Paging { .. } if records.len() >= target => ExecutorState::Done,

                ExecutorState::Paging { offset } => match self.pages.fetch_page(query, offset).await {
                    Ok(page) => {
                        failures = 0;
                        if page.is_exhausted() {
                            debug!(role = %query.role, city = %query.location.city, offset, "No more results");
                            ExecutorState::Done
                        } else {
                            let next_offset = if page.short {
                                None
                            } else {
                                Some(offset + self.pages.page_size())
                            };
                            ExecutorState::Batching {
                                stubs: page.stubs,
                                next_offset,
                            }
                        }
                    }
                    Err(e) => {
                        failures += 1;
                        if failures >= self.max_page_retries {
                            return Err(QueryError::Abandoned {
                                role: query.role.clone(),
                                city: query.location.city.clone(),
                                offset,
                                attempts: failures,
                                source: e,
                                partial: records,
                            });
                        }
                        warn!(
                            role = %query.role,
                            city = %query.location.city,
                            offset,
                            attempt = failures,
                            error = %e,
                            "Page fetch failed, backing off"
                        );
                        self.pacer.transport_backoff().await;
                        ExecutorState::Paging { offset }
                    }
                },

                ExecutorState::Batching { stubs, next_offset } => {
                    self.collect_batches(query, &stubs, &source_query_url, &mut records)
                        .await;
                    match next_offset {
                        Some(offset) if records.len() < target => ExecutorState::Paging { offset },
                        _ => ExecutorState::Done,
                    }
                }
            };
        }

        info!(
            role = %query.role,
            city = %query.location.city,
            collected = records.len(),
            target,
            "Query finished"
        );
        Ok(records)
    }

    /// Fetch details for `stubs` in batches, stopping at the target.
    async fn collect_batches(
        &self,
        query: &Query,
        stubs: &[ListingStub],
        source_query_url: &str,
        records: &mut Vec<ListingRecord>,
    ) {
        let target = query.target_count;

        for batch in stubs.chunks(self.batch_size) {
            let remaining = target.saturating_sub(records.len());
            if remaining == 0 {
                return;
            }

            let identified: Vec<_> = batch
                .iter()
                .filter_map(|stub| extract_listing_id(&stub.detail_url).map(|id| (id, stub)))
                .take(remaining)
                .collect();

            let descriptions = join_all(
                identified
                    .iter()
                    .map(|(_, stub)| self.details.fetch_description(&stub.detail_url)),
            )
            .await;

            for ((listing_id, stub), description) in identified.into_iter().zip(descriptions) {
                records.push(ListingRecord::from_stub(
                    stub.clone(),
                    listing_id,
                    description,
                    query,
                    source_query_url,
                    &self.source_site,
                ));
            }

            info!(
                role = %query.role,
                city = %query.location.city,
                collected = records.len(),
                target,
                "Collected listings"
            );

            if records.len() >= target {
                return;
            }
            self.pacer.between_batches().await;
        }
    }
}
