//! Third-party scraping proxy API client
//!
//! Shopee product pages are rendered client-side and sit behind bot
//! detection, so the single-page flow asks a scraping proxy service to
//! render the page and return the final HTML.

use url::Url;

use crate::error::ScrapeError;
use crate::infrastructure::config::ScrapingApiConfig;
use crate::infrastructure::http_client::HttpClient;

#[derive(Debug)]
pub struct ScrapingApiClient {
    http: HttpClient,
    endpoint: String,
    api_key: String,
    browser: bool,
}

impl ScrapingApiClient {
    pub fn new(http: HttpClient, config: &ScrapingApiConfig) -> Result<Self, ScrapeError> {
        let api_key = config
            .resolve_api_key()
            .ok_or(ScrapeError::MissingApiKey("scraping API"))?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key,
            browser: config.browser,
        })
    }

    /// Fetch a rendered product page through the proxy service.
    pub async fn fetch_page(&self, target_url: &str) -> Result<String, ScrapeError> {
        let request_url = self.build_request_url(target_url)?;
        tracing::info!("Fetching via scraping API: {}", target_url);
        self.http.get_text(request_url.as_str()).await
    }

    fn build_request_url(&self, target_url: &str) -> Result<Url, ScrapeError> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| ScrapeError::Parse(format!("invalid scraping API endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("url", target_url)
            .append_pair("x-api-key", &self.api_key)
            .append_pair("browser", if self.browser { "true" } else { "false" });
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::ScrapingApiConfig;
    use crate::infrastructure::http_client::HttpClientConfig;

    fn client_with_key() -> ScrapingApiClient {
        let config = ScrapingApiConfig {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        };
        let http = HttpClient::new(HttpClientConfig::default()).unwrap();
        ScrapingApiClient::new(http, &config).unwrap()
    }

    #[test]
    fn request_url_carries_target_key_and_browser_flag() {
        let client = client_with_key();
        let url = client
            .build_request_url("https://shopee.tw/x-i.1.2")
            .unwrap();
        let query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert!(query.contains(&("url".to_string(), "https://shopee.tw/x-i.1.2".to_string())));
        assert!(query.contains(&("x-api-key".to_string(), "test-key".to_string())));
        assert!(query.contains(&("browser".to_string(), "true".to_string())));
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let config = ScrapingApiConfig {
            api_key: None,
            ..Default::default()
        };
        std::env::remove_var("SCRAPINGANT_API_KEY");
        let http = HttpClient::new(HttpClientConfig::default()).unwrap();
        let err = ScrapingApiClient::new(http, &config).unwrap_err();
        assert!(matches!(err, ScrapeError::MissingApiKey(_)));
    }
}
