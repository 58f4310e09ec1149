//! Fetchers for search-result pages and listing detail pages.
//!
//! Both go through [`SiteClient`], which owns the transport, the user-agent
//! source and the bounded 429 backoff loop.

pub mod detail;
pub mod listing_page;

pub use detail::DetailFetcher;
pub use listing_page::{ListingPage, ListingPageFetcher};

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::pacing::Pacer;
use crate::traits::{AgentProvider, FetchRequest, Transport};

/// Transport plus the request discipline shared by every fetch.
#[derive(Clone)]
pub struct SiteClient {
    transport: Arc<dyn Transport>,
    agents: Arc<dyn AgentProvider>,
    pacer: Pacer,
    max_rate_limit_retries: u32,
}

impl SiteClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        agents: Arc<dyn AgentProvider>,
        pacer: Pacer,
        max_rate_limit_retries: u32,
    ) -> Self {
        Self {
            transport,
            agents,
            pacer,
            max_rate_limit_retries,
        }
    }

    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    /// GET `url`, backing off and retrying the same URL on 429 up to
    /// `max_rate_limit_retries` times. Other transport errors are returned
    /// as-is.
    pub async fn get(&self, url: &str) -> FetchResult<String> {
        let mut backoffs = 0u32;

        loop {
            let request = FetchRequest {
                url: url.to_string(),
                user_agent: self.agents.user_agent(),
            };

            match self.transport.get(&request).await {
                Ok(response) => {
                    debug!(url, status = response.status, bytes = response.body.len(), "Fetched");
                    return Ok(response.body);
                }
                Err(e) if e.is_rate_limited() => {
                    if backoffs >= self.max_rate_limit_retries {
                        warn!(url, attempts = backoffs, "Rate limit retries exhausted");
                        return Err(FetchError::RateLimitExhausted {
                            url: url.to_string(),
                            attempts: backoffs,
                        });
                    }
                    backoffs += 1;
                    warn!(url, attempt = backoffs, "Rate limited, backing off");
                    self.pacer.rate_limit_backoff().await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl std::fmt::Debug for SiteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteClient")
            .field("pacer", &self.pacer)
            .field("max_rate_limit_retries", &self.max_rate_limit_retries)
            .finish()
    }
}
