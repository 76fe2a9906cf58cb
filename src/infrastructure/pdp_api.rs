//! Marketplace-internal product detail (pdp) API client
//!
//! Two endpoints serve product data as JSON: `get_rw` (lightweight, used by
//! the batch driver) and `get_pc` (full desktop payload, used by the session
//! flow). Both key on `item_id`/`shop_id` extracted from the product URL.
//!
//! Prices come back in the marketplace's fixed-point formats: `get_rw`
//! reports hundredths; `item_basic` inside `get_pc` reports
//! hundred-thousandths for values above 1000.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, REFERER, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::product::{single_line, BatchRow};
use crate::domain::product_url::{Marketplace, ProductRef};
use crate::error::ScrapeError;
use crate::infrastructure::http_client::HttpClient;

/// Desktop browser user agents, rotated per request
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:90.0) Gecko/20100101 Firefox/90.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.106 Safari/537.36",
];

pub const PRICE_UNAVAILABLE: &str = "Price not available";
const TITLE_UNAVAILABLE: &str = "Title not available";
const DESCRIPTION_UNAVAILABLE: &str = "Description not available";

pub fn random_user_agent() -> &'static str {
    USER_AGENTS[fastrand::usize(..USER_AGENTS.len())]
}

pub fn get_rw_url(marketplace: Marketplace, product: &ProductRef) -> String {
    format!(
        "{}/api/v4/pdp/get_rw?item_id={}&shop_id={}",
        marketplace.base_url(),
        product.item_id,
        product.shop_id
    )
}

pub fn get_pc_url(
    marketplace: Marketplace,
    product: &ProductRef,
    tz_offset_minutes: i32,
    detail_level: u32,
) -> String {
    format!(
        "{}/api/v4/pdp/get_pc?item_id={}&shop_id={}&tz_offset_minutes={}&detail_level={}",
        marketplace.base_url(),
        product.item_id,
        product.shop_id,
        tz_offset_minutes,
        detail_level
    )
}

#[derive(Debug, Deserialize)]
struct PdpEnvelope {
    data: Option<PdpData>,
}

#[derive(Debug, Deserialize)]
struct PdpData {
    item: Option<PdpItem>,
}

#[derive(Debug, Deserialize)]
struct PdpItem {
    title: Option<String>,
    description: Option<String>,
    price: Option<i64>,
}

/// Client for the lightweight `get_rw` endpoint
pub struct PdpApiClient {
    http: HttpClient,
}

impl PdpApiClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Fetch one product via `get_rw` and flatten it into a [`BatchRow`].
    pub async fn fetch_item(
        &self,
        url: &str,
        product: &ProductRef,
    ) -> Result<BatchRow, ScrapeError> {
        let marketplace = Marketplace::from_url(url);
        let api_url = get_rw_url(marketplace, product);

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(random_user_agent()),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Ok(referer) = HeaderValue::from_str(&format!("{}/", marketplace.base_url())) {
            headers.insert(REFERER, referer);
        }
        headers.insert(
            "x-requested-with",
            HeaderValue::from_static("XMLHttpRequest"),
        );

        let response = self.http.get_with_headers(&api_url, headers).await?;
        let envelope: PdpEnvelope = response
            .json()
            .await
            .map_err(|e| ScrapeError::Parse(e.to_string()))?;

        let item = envelope
            .data
            .and_then(|data| data.item)
            .ok_or(ScrapeError::EmptyPayload)?;

        Ok(BatchRow {
            shop_id: product.shop_id,
            item_id: product.item_id,
            title: single_line(item.title.as_deref().unwrap_or(TITLE_UNAVAILABLE)),
            description: single_line(
                item.description.as_deref().unwrap_or(DESCRIPTION_UNAVAILABLE),
            ),
            price: format_rw_price(item.price),
            url: url.to_string(),
        })
    }
}

/// `get_rw` prices are integer hundredths.
pub fn format_rw_price(raw: Option<i64>) -> String {
    match raw {
        Some(raw) => format!("{:.2}", raw as f64 / 100.0),
        None => PRICE_UNAVAILABLE.to_string(),
    }
}

/// `item_basic` prices above 1000 are in the marketplace's
/// hundred-thousandths fixed-point format.
pub fn format_basic_price(raw: i64) -> String {
    if raw > 1000 {
        format!("{:.2}", raw as f64 / 100_000.0)
    } else {
        format!("{:.2}", raw as f64)
    }
}

/// Display fields pulled from a raw `get_pc` payload
#[derive(Debug, Clone, Default)]
pub struct DetailSummary {
    pub name: Option<String>,
    pub price: Option<String>,
    pub stock: Option<i64>,
    pub rating: Option<f64>,
    pub historical_sold: Option<i64>,
}

/// Summarize a `get_pc` response for terminal output.
///
/// Falls back to the flat `title`/`price` shape produced by HTML scraping
/// when `item_basic` is absent.
pub fn summarize_get_pc(payload: &Value) -> Option<DetailSummary> {
    let data = payload.get("data")?;

    if let Some(basic) = data.get("item_basic") {
        let mut summary = DetailSummary {
            name: basic.get("name").and_then(Value::as_str).map(String::from),
            ..DetailSummary::default()
        };
        if let Some(price) = basic.get("price").and_then(Value::as_i64) {
            summary.price = Some(format_basic_price(price));
        }
        summary.stock = basic.get("stock").and_then(Value::as_i64);
        summary.rating = basic
            .get("item_rating")
            .and_then(|r| r.get("rating_star"))
            .and_then(Value::as_f64);
        summary.historical_sold = basic.get("historical_sold").and_then(Value::as_i64);
        return Some(summary);
    }

    if let Some(title) = data.get("title").and_then(Value::as_str) {
        return Some(DetailSummary {
            name: Some(title.to_string()),
            price: data
                .get("price")
                .and_then(Value::as_str)
                .map(String::from),
            ..DetailSummary::default()
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rw_price_is_in_hundredths() {
        assert_eq!(format_rw_price(Some(129_900)), "1299.00");
        assert_eq!(format_rw_price(Some(55)), "0.55");
        assert_eq!(format_rw_price(None), PRICE_UNAVAILABLE);
    }

    #[test]
    fn basic_price_heuristic() {
        assert_eq!(format_basic_price(12_990_000), "129.90");
        assert_eq!(format_basic_price(999), "999.00");
    }

    #[test]
    fn rw_urls_follow_marketplace() {
        let product = ProductRef::new(327985547, 9368269078);
        assert_eq!(
            get_rw_url(Marketplace::Taiwan, &product),
            "https://shopee.tw/api/v4/pdp/get_rw?item_id=9368269078&shop_id=327985547"
        );
        assert_eq!(
            get_pc_url(Marketplace::Taiwan, &product, 60, 0),
            "https://shopee.tw/api/v4/pdp/get_pc?item_id=9368269078&shop_id=327985547&tz_offset_minutes=60&detail_level=0"
        );
    }

    #[test]
    fn summarize_reads_item_basic() {
        let payload = json!({
            "data": {
                "item_basic": {
                    "name": "藍牙耳機",
                    "price": 12_990_000,
                    "stock": 42,
                    "item_rating": { "rating_star": 4.8 },
                    "historical_sold": 311
                }
            }
        });
        let summary = summarize_get_pc(&payload).unwrap();
        assert_eq!(summary.name.as_deref(), Some("藍牙耳機"));
        assert_eq!(summary.price.as_deref(), Some("129.90"));
        assert_eq!(summary.stock, Some(42));
        assert_eq!(summary.rating, Some(4.8));
        assert_eq!(summary.historical_sold, Some(311));
    }

    #[test]
    fn summarize_falls_back_to_flat_shape() {
        let payload = json!({
            "data": { "title": "Fone TWS", "price": "120.00" }
        });
        let summary = summarize_get_pc(&payload).unwrap();
        assert_eq!(summary.name.as_deref(), Some("Fone TWS"));
        assert_eq!(summary.price.as_deref(), Some("120.00"));
    }

    #[test]
    fn empty_payload_has_no_summary() {
        assert!(summarize_get_pc(&json!({})).is_none());
        assert!(summarize_get_pc(&json!({ "data": {} })).is_none());
    }
}
