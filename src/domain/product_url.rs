//! Shop/item identifier extraction from heterogeneous Shopee URL shapes
//!
//! Product URLs embed the shop and item ids in one of three forms:
//! `...-i.<shop_id>.<item_id>`, `/product/<shop_id>/<item_id>`, or
//! `?shopid=..&itemid=..` query parameters. The parse cascade tries them
//! in that order.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ScrapeError;

static DOTTED_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"i\.(\d+)\.(\d+)").expect("valid regex"));
static PATH_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/product/(\d+)/(\d+)").expect("valid regex"));

/// Marketplace-internal identifiers embedded in a product URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductRef {
    pub shop_id: u64,
    pub item_id: u64,
}

impl ProductRef {
    pub fn new(shop_id: u64, item_id: u64) -> Self {
        Self { shop_id, item_id }
    }

    /// Extract shop_id and item_id from a product URL.
    pub fn parse(url: &str) -> Result<Self, ScrapeError> {
        if let Some(caps) = DOTTED_ID_RE.captures(url) {
            return Self::from_captures(&caps[1], &caps[2], url);
        }

        if let Some(caps) = PATH_ID_RE.captures(url) {
            return Self::from_captures(&caps[1], &caps[2], url);
        }

        if let Ok(parsed) = Url::parse(url) {
            let mut shop_id = None;
            let mut item_id = None;
            for (key, value) in parsed.query_pairs() {
                match key.to_ascii_lowercase().as_str() {
                    "shopid" => shop_id = value.parse::<u64>().ok(),
                    "itemid" => item_id = value.parse::<u64>().ok(),
                    _ => {}
                }
            }
            if let (Some(shop_id), Some(item_id)) = (shop_id, item_id) {
                return Ok(Self { shop_id, item_id });
            }
        }

        Err(ScrapeError::InvalidUrl(url.to_string()))
    }

    /// Extract every id pair present in a text cell (XLSX cells sometimes
    /// carry several URLs).
    pub fn parse_all(text: &str) -> Vec<Self> {
        DOTTED_ID_RE
            .captures_iter(text)
            .filter_map(|caps| Self::from_captures(&caps[1], &caps[2], text).ok())
            .collect()
    }

    fn from_captures(shop: &str, item: &str, url: &str) -> Result<Self, ScrapeError> {
        let shop_id = shop
            .parse::<u64>()
            .map_err(|_| ScrapeError::InvalidUrl(url.to_string()))?;
        let item_id = item
            .parse::<u64>()
            .map_err(|_| ScrapeError::InvalidUrl(url.to_string()))?;
        Ok(Self { shop_id, item_id })
    }

    /// Canonical product page URL on the given marketplace.
    pub fn product_url(&self, marketplace: Marketplace) -> String {
        format!(
            "{}/product-i.{}.{}",
            marketplace.base_url(),
            self.shop_id,
            self.item_id
        )
    }
}

/// Shopee country frontend, detected from the URL host
///
/// Frontend markup differs per country, but the internal API shapes are the
/// same; detection is used for the API base URL, referers and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Marketplace {
    Taiwan,
    Brazil,
    Other,
}

impl Marketplace {
    pub fn from_url(url: &str) -> Self {
        if url.contains("shopee.tw") {
            Self::Taiwan
        } else if url.contains("shopee.com.br") {
            Self::Brazil
        } else {
            Self::Other
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Taiwan | Self::Other => "https://shopee.tw",
            Self::Brazil => "https://shopee.com.br",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Taiwan => "shopee.tw",
            Self::Brazil => "shopee.com.br",
            Self::Other => "shopee",
        }
    }
}
