use anyhow::{Context, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::error::CrawlError;
use crate::pacing::Pacing;
use crate::security::ProxyConfig;

/// Search results returned per page by the site
pub const DEFAULT_PAGE_SIZE: usize = 25;

const DEFAULT_SEARCH_URL: &str = "https://www.linkedin.com/jobs/search/";

/// Everything the crawl needs, built once and passed down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// SQLite connection URL for listings and progress
    pub database_url: String,

    /// Search endpoint; keywords, location and offset are appended per page
    pub search_url: Url,

    /// Stored on every listing
    pub source_site: String,

    /// Listings per role at mean weight, before spreading across locations
    pub base_target: usize,

    /// Floor for the per-location target
    pub min_target: usize,

    /// Ceiling for the per-location target
    pub max_target: usize,

    /// Full page length; a shorter page ends pagination
    pub page_size: usize,

    /// Detail fetches issued concurrently
    pub batch_size: usize,

    /// Consecutive failures of one page before the query is abandoned
    pub max_page_retries: u32,

    /// 429 backoffs for one request before giving up on it
    pub max_rate_limit_retries: u32,

    pub request_timeout: Duration,

    /// Optional hard ceiling on outgoing requests
    pub max_requests_per_minute: Option<u32>,

    /// Fixed user agent; rotates through browser agents when unset
    pub user_agent: Option<String>,

    pub pacing: Pacing,

    #[serde(skip)]
    pub proxy: Option<ProxyConfig>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://listings.db".to_string(),
            search_url: Url::parse(DEFAULT_SEARCH_URL).expect("default search URL is valid"),
            source_site: "LinkedIn".to_string(),
            base_target: 3,
            min_target: 5,
            max_target: 200,
            page_size: DEFAULT_PAGE_SIZE,
            batch_size: 1,
            max_page_retries: 5,
            max_rate_limit_retries: 10,
            request_timeout: Duration::from_secs(10),
            max_requests_per_minute: None,
            user_agent: None,
            pacing: Pacing::default(),
            proxy: None,
        }
    }
}

impl CrawlerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = Self::default();

        let search_url = match env::var("CRAWLER_SEARCH_URL") {
            Ok(raw) => Url::parse(&raw).context("CRAWLER_SEARCH_URL must be a valid URL")?,
            Err(_) => defaults.search_url,
        };

        let config = Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            search_url,
            source_site: env::var("CRAWLER_SOURCE_SITE").unwrap_or(defaults.source_site),
            base_target: env_or("CRAWLER_BASE_TARGET", defaults.base_target)?,
            min_target: defaults.min_target,
            max_target: defaults.max_target,
            page_size: env_or("CRAWLER_PAGE_SIZE", defaults.page_size)?,
            batch_size: env_or("CRAWLER_BATCH_SIZE", defaults.batch_size)?,
            max_page_retries: env_or("CRAWLER_MAX_PAGE_RETRIES", defaults.max_page_retries)?,
            max_rate_limit_retries: env_or(
                "CRAWLER_MAX_RATE_LIMIT_RETRIES",
                defaults.max_rate_limit_retries,
            )?,
            request_timeout: Duration::from_secs(env_or(
                "CRAWLER_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            max_requests_per_minute: env_opt("CRAWLER_MAX_REQUESTS_PER_MINUTE")?,
            user_agent: env::var("CRAWLER_USER_AGENT").ok(),
            pacing: defaults.pacing,
            proxy: proxy_from_env()?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the executor cannot work with.
    pub fn validate(&self) -> std::result::Result<(), CrawlError> {
        let invalid = |reason: &str| {
            Err(CrawlError::InvalidConfig {
                reason: reason.to_string(),
            })
        };

        if self.page_size == 0 {
            return invalid("page_size must be at least 1");
        }
        if self.batch_size == 0 {
            return invalid("batch_size must be at least 1");
        }
        if self.min_target > self.max_target {
            return invalid("min_target must not exceed max_target");
        }
        if self.max_requests_per_minute == Some(0) {
            return invalid("max_requests_per_minute must be at least 1 when set");
        }
        Ok(())
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    pub fn with_search_url(mut self, url: Url) -> Self {
        self.search_url = url;
        self
    }

    pub fn with_base_target(mut self, base_target: usize) -> Self {
        self.base_target = base_target;
        self
    }

    pub fn with_target_bounds(mut self, min: usize, max: usize) -> Self {
        self.min_target = min;
        self.max_target = max;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_page_retries(mut self, retries: u32) -> Self {
        self.max_page_retries = retries;
        self
    }

    pub fn with_max_rate_limit_retries(mut self, retries: u32) -> Self {
        self.max_rate_limit_retries = retries;
        self
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", key)),
        Err(_) => Ok(default),
    }
}

fn env_opt<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} must be a valid number", key)),
        Err(_) => Ok(None),
    }
}

/// Proxy settings are all-or-nothing.
fn proxy_from_env() -> Result<Option<ProxyConfig>> {
    let host = env::var("PROXY_HOST").ok();
    let Some(host) = host else {
        return Ok(None);
    };

    let port: u16 = env::var("PROXY_PORT")
        .context("PROXY_PORT must be set when PROXY_HOST is")?
        .parse()
        .context("PROXY_PORT must be a valid port")?;
    let username = env::var("PROXY_USER").context("PROXY_USER must be set when PROXY_HOST is")?;
    let password = env::var("PROXY_PASS").context("PROXY_PASS must be set when PROXY_HOST is")?;

    Ok(Some(ProxyConfig::new(host, port, username, password)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_site_behaviour() {
        let config = CrawlerConfig::default();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!((config.min_target, config.max_target), (5, 200));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_sizes() {
        assert!(CrawlerConfig::new().with_page_size(0).validate().is_err());
        assert!(CrawlerConfig::new().with_batch_size(0).validate().is_err());
        assert!(CrawlerConfig::new()
            .with_target_bounds(10, 5)
            .validate()
            .is_err());
    }

    #[test]
    fn test_proxy_is_not_serialized() {
        let config = CrawlerConfig::new().with_proxy(ProxyConfig::new("h", 1, "u", "secret-pass"));
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret-pass"));
    }
}
