//! HTTP client for scraping with rate limiting and error handling
//!
//! Thin reqwest wrapper shared by the fetch paths: a governor rate limiter
//! paces outgoing requests, and responses are classified into the crate
//! error type (429 -> rate limited, reqwest timeout -> timeout).

use governor::{
    clock::DefaultClock,
    state::{direct::NotKeyed, InMemoryState},
    Quota, RateLimiter,
};
use reqwest::{
    header::{HeaderMap, HeaderValue, USER_AGENT},
    Client, Response,
};
use std::num::NonZeroU32;
use std::time::Duration;

use crate::error::ScrapeError;
use crate::infrastructure::config::HttpConfig;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
    pub follow_redirects: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        HttpConfig::default().into()
    }
}

impl From<HttpConfig> for HttpClientConfig {
    fn from(config: HttpConfig) -> Self {
        Self {
            user_agent: config.user_agent,
            timeout_seconds: config.timeout_seconds,
            max_requests_per_second: config.max_requests_per_second,
            follow_redirects: config.follow_redirects,
        }
    }
}

/// Rate-limited HTTP client
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    config: HttpClientConfig,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| ScrapeError::Parse(format!("invalid user agent: {e}")))?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .map_err(ScrapeError::Transport)?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second.max(1)).expect("non-zero rate"),
        );
        let rate_limiter = RateLimiter::direct(quota);

        Ok(Self {
            client,
            rate_limiter,
            config,
        })
    }

    /// Fetch a URL, waiting on the rate limiter first.
    pub async fn get(&self, url: &str) -> Result<Response, ScrapeError> {
        self.get_with_headers(url, HeaderMap::new()).await
    }

    /// Fetch a URL with extra per-request headers.
    pub async fn get_with_headers(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> Result<Response, ScrapeError> {
        self.rate_limiter.until_ready().await;

        tracing::debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(ScrapeError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::from_status(status, url));
        }

        tracing::debug!("Fetched {} ({})", url, status);
        Ok(response)
    }

    /// Fetch a URL and return the body as text.
    pub async fn get_text(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self.get(url).await?;
        response.text().await.map_err(ScrapeError::from_transport)
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}
