//! Testing utilities including mock implementations.
//!
//! These let the fetchers, executor and orchestrator run without network
//! access or real sleeps.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use url::Url;

use crate::config::CrawlerConfig;
use crate::error::{TransportError, TransportResult};
use crate::pacing::{DelayWindow, Pacer, Pacing};
use crate::traits::{DelayPolicy, FetchRequest, FetchResponse, Transport};
use crate::types::ListingStub;

pub use crate::pacing::FixedAgent;

/// Search endpoint used by test configs.
pub const TEST_SEARCH_URL: &str = "https://jobs.test/search";

/// A scripted transport outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    Page(String),
    RateLimited,
    Status(u16),
    ConnectionRefused,
}

/// A mock transport with per-URL scripts and call tracking.
///
/// Scripted responses for a URL are consumed in order; once a URL's script
/// runs out, its `with_page` body (if any) is served on every call. Unknown
/// URLs answer 404.
#[derive(Default, Clone)]
pub struct MockTransport {
    /// Bodies served for every call to a URL
    pages: Arc<RwLock<HashMap<String, String>>>,

    /// One-shot responses, consumed before `pages`
    scripts: Arc<RwLock<HashMap<String, VecDeque<MockResponse>>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<FetchRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for every call to `url`.
    pub fn with_page(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.write().unwrap().insert(url.into(), body.into());
        self
    }

    /// Queue one-shot responses for `url`.
    pub fn with_script(
        self,
        url: impl Into<String>,
        responses: impl IntoIterator<Item = MockResponse>,
    ) -> Self {
        self.scripts
            .write()
            .unwrap()
            .entry(url.into())
            .or_default()
            .extend(responses);
        self
    }

    /// Answer 429 `times` times before serving the page.
    pub fn with_rate_limits(self, url: impl Into<String>, times: usize) -> Self {
        self.with_script(url, std::iter::repeat(MockResponse::RateLimited).take(times))
    }

    /// Fail `times` times with a connection error before serving the page.
    pub fn with_failures(self, url: impl Into<String>, times: usize) -> Self {
        self.with_script(
            url,
            std::iter::repeat(MockResponse::ConnectionRefused).take(times),
        )
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<FetchRequest> {
        self.calls.read().unwrap().clone()
    }

    /// Number of calls made to one URL.
    pub fn calls_to(&self, url: &str) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|call| call.url == url)
            .count()
    }

    /// Called URLs, in call order.
    pub fn called_urls(&self) -> Vec<String> {
        self.calls
            .read()
            .unwrap()
            .iter()
            .map(|call| call.url.clone())
            .collect()
    }

    fn next_response(&self, url: &str) -> MockResponse {
        if let Some(response) = self
            .scripts
            .write()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
        {
            return response;
        }
        match self.pages.read().unwrap().get(url) {
            Some(body) => MockResponse::Page(body.clone()),
            None => MockResponse::Status(404),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, request: &FetchRequest) -> TransportResult<FetchResponse> {
        self.calls.write().unwrap().push(request.clone());

        let url = request.url.clone();
        match self.next_response(&request.url) {
            MockResponse::Page(body) => Ok(FetchResponse { status: 200, body }),
            MockResponse::RateLimited => Err(TransportError::RateLimited { url }),
            MockResponse::Status(status) => Err(TransportError::Status { status, url }),
            MockResponse::ConnectionRefused => Err(TransportError::Request {
                url,
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "Mock connection refused",
                )),
            }),
        }
    }
}

/// A delay policy that never sleeps and records every window it was asked for.
#[derive(Default, Clone)]
pub struct RecordingDelay {
    windows: Arc<RwLock<Vec<DelayWindow>>>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pacer over this policy with the default windows.
    pub fn pacer(&self) -> Pacer {
        Pacer::new(Arc::new(self.clone()), Pacing::default())
    }

    pub fn windows(&self) -> Vec<DelayWindow> {
        self.windows.read().unwrap().clone()
    }

    /// How many times `window` was requested.
    pub fn count(&self, window: DelayWindow) -> usize {
        self.windows
            .read()
            .unwrap()
            .iter()
            .filter(|w| **w == window)
            .count()
    }
}

impl DelayPolicy for RecordingDelay {
    fn pick(&self, window: DelayWindow) -> Duration {
        self.windows.write().unwrap().push(window);
        Duration::ZERO
    }
}

/// Config pointing at [`TEST_SEARCH_URL`].
pub fn test_config() -> CrawlerConfig {
    let search_url = Url::parse(TEST_SEARCH_URL).unwrap();
    CrawlerConfig::new().with_search_url(search_url)
}

// ============================================================================
// HTML fixtures
// ============================================================================

pub fn view_url(id: u32) -> String {
    format!("https://www.linkedin.com/jobs/view/{id}")
}

pub fn stub(title: &str, detail_url: &str) -> ListingStub {
    ListingStub {
        title: title.to_string(),
        employer: "Acme Corp".to_string(),
        location_display: "Sydney, NSW".to_string(),
        detail_url: detail_url.to_string(),
    }
}

/// Stub for listing `id`, titled "Listing {id}".
pub fn numbered_stub(id: u32) -> ListingStub {
    stub(&format!("Listing {id}"), &view_url(id))
}

pub fn numbered_stubs(ids: impl IntoIterator<Item = u32>) -> Vec<ListingStub> {
    ids.into_iter().map(numbered_stub).collect()
}

/// A search-results page containing `stubs` as cards.
pub fn search_page_html(stubs: &[ListingStub]) -> String {
    let cards: String = stubs
        .iter()
        .map(|s| {
            format!(
                r#"
      <li>
        <div class="base-card">
          <a class="base-card__full-link" href="{url}"></a>
          <h3 class="base-search-card__title">{title}</h3>
          <h4 class="base-search-card__subtitle">{employer}</h4>
          <span class="job-search-card__location">{location}</span>
        </div>
      </li>"#,
                url = s.detail_url,
                title = s.title,
                employer = s.employer,
                location = s.location_display,
            )
        })
        .collect();

    format!(
        r#"<html><body><ul class="jobs-search__results-list">{cards}
    </ul></body></html>"#
    )
}

/// A detail page whose description block holds `text`.
pub fn detail_page_html(text: &str) -> String {
    format!(
        r#"<html><body><section><div class="description__text">{text}</div></section></body></html>"#
    )
}
