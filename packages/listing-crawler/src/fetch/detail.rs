//! Long-form description for one listing.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::fetch::SiteClient;
use crate::normalize::normalize_description;
use crate::traits::MarkupExtractor;

pub struct DetailFetcher {
    client: SiteClient,
    markup: Arc<dyn MarkupExtractor>,
}

impl DetailFetcher {
    pub fn new(client: SiteClient, markup: Arc<dyn MarkupExtractor>) -> Self {
        Self { client, markup }
    }

    /// Normalized description text, or `""` when it cannot be fetched.
    pub async fn fetch_description(&self, url: &str) -> String {
        self.client.pacer().politeness().await;

        let html = match self.client.get(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url, error = %e, "Detail fetch failed, keeping empty description");
                return String::new();
            }
        };

        match self.markup.description(&html) {
            Some(text) => normalize_description(&text),
            None => {
                debug!(url, "No description block on detail page");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::SearchResultsMarkup;
    use crate::pacing::Pacing;
    use crate::testing::{detail_page_html, view_url, FixedAgent, MockTransport, RecordingDelay};

    fn fetcher(mock: &MockTransport, delay: &RecordingDelay) -> DetailFetcher {
        let client = SiteClient::new(
            Arc::new(mock.clone()),
            Arc::new(FixedAgent("test-agent".to_string())),
            delay.pacer(),
            10,
        );
        DetailFetcher::new(client, Arc::new(SearchResultsMarkup::new()))
    }

    #[tokio::test]
    async fn test_description_is_normalized() {
        let mock = MockTransport::new().with_page(
            view_url(1),
            detail_page_html("Join our teamWe offer 5days leave.Apply now  Show more Show less"),
        );
        let delay = RecordingDelay::new();

        let text = fetcher(&mock, &delay).fetch_description(&view_url(1)).await;

        assert_eq!(text, "Join our team We offer 5 days leave. Apply now");
        assert_eq!(delay.count(Pacing::default().politeness), 1);
    }

    #[tokio::test]
    async fn test_failure_yields_empty_description() {
        let mock = MockTransport::new().with_failures(view_url(1), 1);
        let delay = RecordingDelay::new();

        assert_eq!(fetcher(&mock, &delay).fetch_description(&view_url(1)).await, "");
        // 404 for an unknown page
        assert_eq!(fetcher(&mock, &delay).fetch_description(&view_url(2)).await, "");
    }

    #[tokio::test]
    async fn test_missing_block_yields_empty_description() {
        let mock = MockTransport::new().with_page(view_url(1), "<html><body>Gone</body></html>");
        let delay = RecordingDelay::new();

        assert_eq!(fetcher(&mock, &delay).fetch_description(&view_url(1)).await, "");
    }

    #[tokio::test]
    async fn test_rate_limit_retries_same_url() {
        let mock = MockTransport::new()
            .with_rate_limits(view_url(1), 1)
            .with_page(view_url(1), detail_page_html("Build pipelines"));
        let delay = RecordingDelay::new();

        let text = fetcher(&mock, &delay).fetch_description(&view_url(1)).await;

        assert_eq!(text, "Build pipelines");
        assert_eq!(mock.called_urls(), vec![view_url(1), view_url(1)]);
        assert_eq!(delay.count(Pacing::default().politeness), 1);
        assert_eq!(delay.count(Pacing::default().rate_limit_backoff), 1);
    }
}
