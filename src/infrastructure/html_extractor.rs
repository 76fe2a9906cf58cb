//! Product page HTML extraction
//!
//! The marketplace ships several frontend variants, so every field is read
//! through a selector cascade: an ordered list of CSS selectors tried until
//! one matches. When the cascades come up empty the page usually carried its
//! data as embedded `__INITIAL_STATE__` JSON or as Open Graph metatags, and
//! those fallbacks fill the snapshot instead.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::debug;

use crate::domain::product::{ProductSnapshot, Review, SpecEntry};
use crate::infrastructure::pdp_api::format_basic_price;

const NAME_SELECTORS: &[&str] = &[
    ".product-briefing .qaNIZv",
    ".attM6y span",
    "h1.product-detail__name",
    ".page-product__title",
    ".product-briefing h1",
    ".product-detail-page__header__name",
    ".PVuNPp",
];

const PRICE_SELECTORS: &[&str] = &[
    ".product-briefing .Ybrg9j",
    ".AJyN7v",
    ".product-detail__price",
    ".page-product__detail .product-detail__price",
    ".price-container .price",
    "._22ilFY",
    "._1v8Ixb",
];

const RATING_SELECTORS: &[&str] = &[
    ".product-rating-overview__rating-score",
    ".product-rating__rating-score",
    ".rating-with-count__rating",
    "._1mYa1t",
    ".HlRyAJ",
];

const SELLER_SELECTORS: &[&str] = &[
    ".seller-name-wrapper .seller-name__text",
    ".seller-name__wrapper .seller-name__text",
    ".product-detail__seller-name",
    ".seller-info-content__name",
    "._3uf2ae",
    ".hVzXS4",
];

const SOLD_COUNT_SELECTORS: &[&str] = &[
    ".product-detail__sold-count",
    ".wGBjtA",
    ".Efpd3B",
    ".item-status__text",
    "._22sp0A",
    ".kHGNrE",
];

const DESCRIPTION_SELECTORS: &[&str] = &[
    ".product-detail__description-content",
    ".kIUnrY",
    ".page-product__detail .product-detail__description",
    ".product-detail__description",
    ".f7AU53",
    "._1Qtf7G",
];

const IMAGE_SELECTORS: &[&str] = &[
    ".product-detail__gallery img",
    ".XBKtMI img",
    ".page-product__detail .product-detail__gallery img",
    ".product-briefing img[src]",
    ".dR8kXc img",
    ".PTr7E- img",
];

const SPEC_ROW_SELECTORS: &[&str] = &[
    ".product-detail__specification-table tbody tr",
    ".page-product__detail .product-detail__specs-table tr",
    ".kIUnrY table tr",
    ".product-detail__attributes div",
    ".bQVbQH",
    ".dR8kXc",
];

const REVIEW_SELECTORS: &[&str] = &[
    ".shopee-product-rating",
    ".product-rating",
    ".page-product__detail .product-ratings__list-item",
    ".rating-comment-container",
    "._14DAT_",
    ".EXI9SU",
];

const REVIEWER_SELECTORS: &[&str] = &[
    ".shopee-product-rating__author-name",
    ".rating-author__name",
    ".username",
    "._7wHgNd",
    ".SbCpSo",
];

const REVIEW_STARS_SELECTORS: &[&str] = &[
    ".shopee-product-rating__rating",
    ".rating-stars",
    ".rating-stars__stars",
    "._1Bj6iq",
    ".OALo0B",
];

const REVIEW_COMMENT_SELECTORS: &[&str] = &[
    ".shopee-product-rating__content",
    ".rating-comment",
    ".comment",
    "._3F1-5M",
    ".CUDGNS",
];

const MAX_REVIEWS: usize = 5;

static INITIAL_STATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)__INITIAL_STATE__\s*=\s*(\{.*?\});").expect("valid regex")
});

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Ordered list of CSS selectors tried until one matches
pub struct SelectorCascade {
    selectors: Vec<Selector>,
}

impl SelectorCascade {
    pub fn new(sources: &[&str]) -> Self {
        Self {
            selectors: sources
                .iter()
                .filter_map(|s| Selector::parse(s).ok())
                .collect(),
        }
    }

    /// Text of the first element any selector matches in the document.
    pub fn first_text(&self, document: &Html) -> Option<String> {
        for selector in &self.selectors {
            if let Some(element) = document.select(selector).next() {
                let text = element_text(element);
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
        None
    }

    /// First matching element within a scope element.
    pub fn first_in<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.selectors
            .iter()
            .find_map(|selector| scope.select(selector).next())
    }

    /// All elements matched by the first selector that matches anything.
    pub fn all<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        for selector in &self.selectors {
            let matches: Vec<_> = document.select(selector).collect();
            if !matches.is_empty() {
                return matches;
            }
        }
        Vec::new()
    }
}

/// Cascade-driven extractor for rendered product pages
pub struct ProductExtractor {
    name: SelectorCascade,
    price: SelectorCascade,
    rating: SelectorCascade,
    seller: SelectorCascade,
    sold_count: SelectorCascade,
    description: SelectorCascade,
    images: SelectorCascade,
    spec_rows: SelectorCascade,
    spec_key: Selector,
    spec_value: Selector,
    spec_label: Selector,
    spec_label_value: Selector,
    reviews: SelectorCascade,
    reviewer: SelectorCascade,
    review_stars: SelectorCascade,
    review_comment: SelectorCascade,
}

impl Default for ProductExtractor {
    fn default() -> Self {
        Self {
            name: SelectorCascade::new(NAME_SELECTORS),
            price: SelectorCascade::new(PRICE_SELECTORS),
            rating: SelectorCascade::new(RATING_SELECTORS),
            seller: SelectorCascade::new(SELLER_SELECTORS),
            sold_count: SelectorCascade::new(SOLD_COUNT_SELECTORS),
            description: SelectorCascade::new(DESCRIPTION_SELECTORS),
            images: SelectorCascade::new(IMAGE_SELECTORS),
            spec_rows: SelectorCascade::new(SPEC_ROW_SELECTORS),
            spec_key: Selector::parse("td:nth-child(1), th:nth-child(1)").expect("valid selector"),
            spec_value: Selector::parse("td:nth-child(2), th:nth-child(2)")
                .expect("valid selector"),
            spec_label: Selector::parse("label, span:nth-child(1)").expect("valid selector"),
            spec_label_value: Selector::parse("div:nth-child(2), span:nth-child(2)")
                .expect("valid selector"),
            reviews: SelectorCascade::new(REVIEW_SELECTORS),
            reviewer: SelectorCascade::new(REVIEWER_SELECTORS),
            review_stars: SelectorCascade::new(REVIEW_STARS_SELECTORS),
            review_comment: SelectorCascade::new(REVIEW_COMMENT_SELECTORS),
        }
    }
}

impl ProductExtractor {
    /// Run every cascade over a parsed document.
    pub fn extract(&self, document: &Html, url: &str) -> ProductSnapshot {
        let mut snapshot = ProductSnapshot::new(url);
        snapshot.name = self.name.first_text(document);
        snapshot.price = self.price.first_text(document);
        snapshot.rating = self.rating.first_text(document);
        snapshot.seller = self.seller.first_text(document);
        snapshot.sold_count = self.sold_count.first_text(document);
        snapshot.description = self.description.first_text(document);
        snapshot.images = self.extract_images(document);
        snapshot.specs = self.extract_specs(document);
        snapshot.reviews = self.extract_reviews(document);
        snapshot
    }

    fn extract_images(&self, document: &Html) -> Vec<String> {
        self.images
            .all(document)
            .into_iter()
            .filter_map(|img| img.value().attr("src").map(String::from))
            .collect()
    }

    fn extract_specs(&self, document: &Html) -> Vec<SpecEntry> {
        let mut specs = Vec::new();
        for row in self.spec_rows.all(document) {
            let table_pair = row
                .select(&self.spec_key)
                .next()
                .zip(row.select(&self.spec_value).next());
            let pair = table_pair.or_else(|| {
                row.select(&self.spec_label)
                    .next()
                    .zip(row.select(&self.spec_label_value).next())
            });
            if let Some((label, value)) = pair {
                let label = element_text(label);
                let value = element_text(value);
                if !label.is_empty() {
                    specs.push(SpecEntry { label, value });
                }
            }
        }
        specs
    }

    fn extract_reviews(&self, document: &Html) -> Vec<Review> {
        let mut reviews = Vec::new();
        for block in self.reviews.all(document).into_iter().take(MAX_REVIEWS) {
            let reviewer = self.reviewer.first_in(block).map(element_text);
            let stars = self.review_stars.first_in(block).map(|element| {
                element
                    .value()
                    .attr("aria-label")
                    .map(String::from)
                    .unwrap_or_else(|| element_text(element))
            });
            let comment = self.review_comment.first_in(block).map(element_text);

            // A block with neither reviewer nor comment is a layout artifact
            if reviewer.is_none() && comment.is_none() {
                continue;
            }
            reviews.push(Review {
                reviewer: reviewer.unwrap_or_else(|| "Anonymous".to_string()),
                stars: stars.unwrap_or_else(|| "N/A".to_string()),
                comment: comment.unwrap_or_else(|| "N/A".to_string()),
            });
        }
        reviews
    }
}

/// Pull `productDetail.data` out of an embedded `__INITIAL_STATE__` script.
pub fn embedded_product_state(document: &Html) -> Option<Value> {
    let script = Selector::parse("script").ok()?;
    for element in document.select(&script) {
        let text: String = element.text().collect();
        if !text.contains("__INITIAL_STATE__") {
            continue;
        }
        let Some(captures) = INITIAL_STATE_RE.captures(&text) else {
            continue;
        };
        match serde_json::from_str::<Value>(&captures[1]) {
            Ok(state) => {
                if let Some(data) = state.pointer("/productDetail/data") {
                    return Some(data.clone());
                }
            }
            Err(e) => debug!("Embedded state did not parse as JSON: {}", e),
        }
    }
    None
}

/// Fill missing snapshot fields from embedded product data.
pub fn apply_embedded_state(snapshot: &mut ProductSnapshot, data: &Value) {
    if snapshot.name.is_none() {
        snapshot.name = data
            .get("name")
            .or_else(|| data.get("title"))
            .and_then(Value::as_str)
            .map(String::from);
    }
    if snapshot.price.is_none() {
        snapshot.price = match data.get("price") {
            Some(Value::Number(n)) => n.as_i64().map(format_basic_price),
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        };
    }
    if snapshot.description.is_none() {
        snapshot.description = data
            .get("description")
            .and_then(Value::as_str)
            .map(String::from);
    }
    if snapshot.images.is_empty() {
        if let Some(images) = data.get("images").and_then(Value::as_array) {
            snapshot.images = images
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect();
        }
    }
}

/// Fill missing snapshot fields from Open Graph metatags.
pub fn apply_og_metatags(snapshot: &mut ProductSnapshot, document: &Html) {
    let content = |property: &str| -> Option<String> {
        let selector = Selector::parse(&format!(r#"meta[property="{property}"]"#)).ok()?;
        document
            .select(&selector)
            .next()
            .and_then(|tag| tag.value().attr("content"))
            .map(String::from)
    };

    if snapshot.name.is_none() {
        snapshot.name = content("og:title");
    }
    if snapshot.description.is_none() {
        snapshot.description = content("og:description");
    }
    if snapshot.images.is_empty() {
        if let Some(image) = content("og:image") {
            snapshot.images = vec![image];
        }
    }
    if snapshot.price.is_none() {
        if let Some(amount) = content("og:price:amount") {
            snapshot.price = match content("og:price:currency") {
                Some(currency) => Some(format!("{currency} {amount}")),
                None => Some(amount),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT_PAGE: &str = r#"
        <html><body>
          <h1 class="page-product__title">藍牙耳機 5.3</h1>
          <div class="AJyN7v">NT$1,299</div>
          <div class="product-rating-overview__rating-score">4.9</div>
          <div class="seller-info-content__name">好店旗艦店</div>
          <div class="product-detail__sold-count">已售出 2.1k</div>
          <div class="product-detail__description-content">超長續航。</div>
          <div class="product-detail__gallery">
            <img src="https://cf.example/a.jpg"/>
            <img src="https://cf.example/b.jpg"/>
            <img/>
          </div>
          <table class="product-detail__specification-table"><tbody>
            <tr><td>品牌</td><td>NoName</td></tr>
            <tr><td>保固</td><td>一年</td></tr>
          </tbody></table>
          <div class="shopee-product-rating">
            <div class="shopee-product-rating__author-name">user1</div>
            <div class="shopee-product-rating__rating" aria-label="5 stars"></div>
            <div class="shopee-product-rating__content">很棒</div>
          </div>
          <div class="shopee-product-rating">
            <div class="shopee-product-rating__content">normal</div>
          </div>
        </body></html>"#;

    #[test]
    fn cascades_extract_all_fields() {
        let document = Html::parse_document(PRODUCT_PAGE);
        let extractor = ProductExtractor::default();
        let snapshot = extractor.extract(&document, "https://shopee.tw/x-i.1.2");

        assert_eq!(snapshot.name.as_deref(), Some("藍牙耳機 5.3"));
        assert_eq!(snapshot.price.as_deref(), Some("NT$1,299"));
        assert_eq!(snapshot.rating.as_deref(), Some("4.9"));
        assert_eq!(snapshot.seller.as_deref(), Some("好店旗艦店"));
        assert_eq!(snapshot.sold_count.as_deref(), Some("已售出 2.1k"));
        assert_eq!(snapshot.description.as_deref(), Some("超長續航。"));
        assert_eq!(snapshot.images.len(), 2);
        assert_eq!(snapshot.specs.len(), 2);
        assert_eq!(snapshot.specs[0].label, "品牌");
        assert_eq!(snapshot.specs[0].value, "NoName");
    }

    #[test]
    fn reviews_use_aria_label_and_default_fields() {
        let document = Html::parse_document(PRODUCT_PAGE);
        let extractor = ProductExtractor::default();
        let snapshot = extractor.extract(&document, "https://shopee.tw/x-i.1.2");

        assert_eq!(snapshot.reviews.len(), 2);
        assert_eq!(snapshot.reviews[0].reviewer, "user1");
        assert_eq!(snapshot.reviews[0].stars, "5 stars");
        assert_eq!(snapshot.reviews[0].comment, "很棒");
        assert_eq!(snapshot.reviews[1].reviewer, "Anonymous");
        assert_eq!(snapshot.reviews[1].stars, "N/A");
    }

    #[test]
    fn spec_rows_fall_back_to_label_div_pairs() {
        let html = r#"<html><body>
            <div class="product-detail__attributes">
              <div><label>品牌</label><div>NoName</div></div>
              <div><label>產地</label><div>台灣</div></div>
            </div>
        </body></html>"#;
        let document = Html::parse_document(html);
        let extractor = ProductExtractor::default();
        let snapshot = extractor.extract(&document, "https://shopee.tw/x-i.1.2");

        assert_eq!(
            snapshot.specs,
            vec![
                SpecEntry {
                    label: "品牌".to_string(),
                    value: "NoName".to_string(),
                },
                SpecEntry {
                    label: "產地".to_string(),
                    value: "台灣".to_string(),
                },
            ]
        );
    }

    #[test]
    fn review_count_is_capped() {
        let blocks: String = (0..8)
            .map(|i| {
                format!(
                    r#"<div class="shopee-product-rating">
                         <div class="shopee-product-rating__content">c{i}</div>
                       </div>"#
                )
            })
            .collect();
        let document = Html::parse_document(&format!("<html><body>{blocks}</body></html>"));
        let extractor = ProductExtractor::default();
        let snapshot = extractor.extract(&document, "https://shopee.tw/x-i.1.2");
        assert_eq!(snapshot.reviews.len(), MAX_REVIEWS);
    }

    #[test]
    fn embedded_state_is_found_and_applied() {
        let html = r#"<html><head><script>
            window.__INITIAL_STATE__ = {"productDetail":{"data":{
              "name":"Embedded name","price":12990000,
              "description":"from state","images":["h1","h2"]}}};
        </script></head><body></body></html>"#;
        let document = Html::parse_document(html);
        let data = embedded_product_state(&document).unwrap();

        let mut snapshot = ProductSnapshot::new("https://shopee.tw/x-i.1.2");
        apply_embedded_state(&mut snapshot, &data);
        assert_eq!(snapshot.name.as_deref(), Some("Embedded name"));
        assert_eq!(snapshot.price.as_deref(), Some("129.90"));
        assert_eq!(snapshot.description.as_deref(), Some("from state"));
        assert_eq!(snapshot.images, vec!["h1", "h2"]);
    }

    #[test]
    fn missing_embedded_state_yields_none() {
        let document = Html::parse_document("<html><script>var x = 1;</script></html>");
        assert!(embedded_product_state(&document).is_none());
    }

    #[test]
    fn og_metatags_fill_missing_fields() {
        let html = r#"<html><head>
            <meta property="og:title" content="OG name"/>
            <meta property="og:description" content="OG desc"/>
            <meta property="og:image" content="https://cf.example/og.jpg"/>
            <meta property="og:price:amount" content="120.00"/>
            <meta property="og:price:currency" content="TWD"/>
        </head><body></body></html>"#;
        let document = Html::parse_document(html);

        let mut snapshot = ProductSnapshot::new("https://shopee.tw/x-i.1.2");
        apply_og_metatags(&mut snapshot, &document);
        assert_eq!(snapshot.name.as_deref(), Some("OG name"));
        assert_eq!(snapshot.description.as_deref(), Some("OG desc"));
        assert_eq!(snapshot.images, vec!["https://cf.example/og.jpg"]);
        assert_eq!(snapshot.price.as_deref(), Some("TWD 120.00"));
    }

    #[test]
    fn og_metatags_do_not_overwrite_cascade_results() {
        let html = r#"<html><head>
            <meta property="og:title" content="OG name"/>
        </head></html>"#;
        let document = Html::parse_document(html);

        let mut snapshot = ProductSnapshot::new("https://shopee.tw/x-i.1.2");
        snapshot.name = Some("Cascade name".to_string());
        apply_og_metatags(&mut snapshot, &document);
        assert_eq!(snapshot.name.as_deref(), Some("Cascade name"));
    }
}
