//! HTTP transport over reqwest.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{TransportError, TransportResult};
use crate::security::ProxyConfig;
use crate::traits::{FetchRequest, FetchResponse, Transport};

/// GETs pages through an optional authenticated proxy.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration, proxy: Option<&ProxyConfig>) -> TransportResult<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US,en;q=0.5"),
        );

        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5));

        if let Some(proxy) = proxy {
            let route = reqwest::Proxy::all(proxy.endpoint())
                .map_err(|e| TransportError::Request {
                    url: proxy.endpoint(),
                    source: Box::new(e),
                })?
                .basic_auth(&proxy.username, proxy.password.expose());
            builder = builder.proxy(route);
        }

        let client = builder.build().map_err(|e| TransportError::Request {
            url: String::new(),
            source: Box::new(e),
        })?;

        Ok(Self { client })
    }

    /// Use a preconfigured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: &FetchRequest) -> TransportResult<FetchResponse> {
        debug!(url = %request.url, "HTTP GET");

        let response = self
            .client
            .get(&request.url)
            .header(reqwest::header::USER_AGENT, &request.user_agent)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %request.url, error = %e, "HTTP request failed");
                TransportError::Request {
                    url: request.url.clone(),
                    source: Box::new(e),
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TransportError::RateLimited {
                url: request.url.clone(),
            });
        }
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: request.url.clone(),
            });
        }

        let body = response.text().await.map_err(|e| TransportError::Request {
            url: request.url.clone(),
            source: Box::new(e),
        })?;

        Ok(FetchResponse {
            status: status.as_u16(),
            body,
        })
    }
}
