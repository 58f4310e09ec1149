//! One page of search results for a query.

use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use crate::error::FetchResult;
use crate::fetch::SiteClient;
use crate::identity::extract_listing_id;
use crate::traits::MarkupExtractor;
use crate::types::{ListingStub, Query};

/// Stubs from one results page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListingPage {
    /// Stubs with a usable identity, in page order
    pub stubs: Vec<ListingStub>,
    /// Cards on the page before stubs without an identity were dropped
    pub cards: usize,
    /// Fewer cards than a full page came back; no further pages exist
    pub short: bool,
}

impl ListingPage {
    pub fn is_empty(&self) -> bool {
        self.stubs.is_empty()
    }

    /// The site returned no cards at all, so the results have run out.
    pub fn is_exhausted(&self) -> bool {
        self.cards == 0
    }
}

pub struct ListingPageFetcher {
    client: SiteClient,
    markup: Arc<dyn MarkupExtractor>,
    search_url: Url,
    page_size: usize,
}

impl ListingPageFetcher {
    pub fn new(
        client: SiteClient,
        markup: Arc<dyn MarkupExtractor>,
        search_url: Url,
        page_size: usize,
    ) -> Self {
        Self {
            client,
            markup,
            search_url,
            page_size,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Search URL of `query` without an offset.
    pub fn search_url(&self, query: &Query) -> Url {
        query.search_url(&self.search_url)
    }

    /// Fetch the results page starting at `offset`.
    ///
    /// Rate limiting is retried on the same offset inside the client; any
    /// error returned here is retryable by the caller.
    pub async fn fetch_page(&self, query: &Query, offset: usize) -> FetchResult<ListingPage> {
        let url = query.page_url(&self.search_url, offset);
        let html = self.client.get(url.as_str()).await?;

        let Some(cards) = self.markup.search_results(&html) else {
            warn!(
                role = %query.role,
                city = %query.location.city,
                offset,
                "Results list missing, treating page as empty"
            );
            return Ok(ListingPage {
                stubs: Vec::new(),
                cards: 0,
                short: true,
            });
        };

        let card_count = cards.len();
        let short = card_count < self.page_size;
        let stubs: Vec<ListingStub> = cards
            .into_iter()
            .filter(|stub| {
                let keep = extract_listing_id(&stub.detail_url).is_some();
                if !keep {
                    debug!(url = %stub.detail_url, "Dropping stub without listing id");
                }
                keep
            })
            .collect();

        debug!(
            role = %query.role,
            city = %query.location.city,
            offset,
            cards = card_count,
            stubs = stubs.len(),
            short,
            "Fetched results page"
        );

        Ok(ListingPage {
            stubs,
            cards: card_count,
            short,
        })
    }
}
