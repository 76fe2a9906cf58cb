//! Product entities extracted from listing pages and internal API payloads

use serde::{Deserialize, Serialize};

/// Everything the HTML extractor can pull from a rendered product page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub url: String,
    pub name: Option<String>,
    pub price: Option<String>,
    pub rating: Option<String>,
    pub seller: Option<String>,
    pub sold_count: Option<String>,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub specs: Vec<SpecEntry>,
    pub reviews: Vec<Review>,
}

impl ProductSnapshot {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// True when none of the core fields were found, meaning the selector
    /// cascade missed and a fallback extraction path should run.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.images.is_empty()
    }

    /// File stem for output files, derived from the product name.
    ///
    /// Alphanumerics, spaces, hyphens and underscores pass through; anything
    /// else becomes an underscore; the stem is capped at 30 characters.
    pub fn file_stem(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => {
                let safe: String = name
                    .chars()
                    .map(|c| {
                        if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' {
                            c
                        } else {
                            '_'
                        }
                    })
                    .collect();
                let capped: String = safe.chars().take(30).collect();
                let trimmed = capped.trim().to_string();
                if trimmed.is_empty() {
                    "shopee_product".to_string()
                } else {
                    trimmed
                }
            }
            _ => "shopee_product".to_string(),
        }
    }
}

/// One attribute/value pair from the specification table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecEntry {
    pub label: String,
    pub value: String,
}

/// One customer review block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub reviewer: String,
    pub stars: String,
    pub comment: String,
}

/// Row shape persisted by the batch driver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRow {
    pub shop_id: u64,
    pub item_id: u64,
    pub title: String,
    pub description: String,
    pub price: String,
    pub url: String,
}

/// Collapse newlines so titles and descriptions stay on one CSV line.
/// Bare `\n` becomes a space; `\r` is dropped so `\r\n` yields one space.
pub fn single_line(text: &str) -> String {
    text.replace('\n', " ").replace('\r', "")
}
