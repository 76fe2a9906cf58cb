//! Single-product flows: rendered-page scraping and session detail fetching

use anyhow::{anyhow, Context, Result};
use scraper::Html;
use std::path::Path;
use tracing::{info, warn};

use crate::domain::product::ProductSnapshot;
use crate::domain::product_url::{Marketplace, ProductRef};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::export;
use crate::infrastructure::html_extractor::{
    apply_embedded_state, apply_og_metatags, embedded_product_state, ProductExtractor,
};
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::pdp_api;
use crate::infrastructure::scraping_api::ScrapingApiClient;
use crate::infrastructure::session::SessionClient;

/// Scrape one rendered product page and write the full output set.
pub async fn run_scrape(config: &AppConfig, url: &str, output: Option<&Path>) -> Result<()> {
    if !url.starts_with("http") {
        return Err(anyhow!("invalid URL, expected http(s): {url}"));
    }
    if url.contains("shopee.") {
        info!("Detected marketplace: {}", Marketplace::from_url(url).label());
    } else {
        warn!("URL does not look like a marketplace product page: {}", url);
    }

    let http = HttpClient::new(config.http.clone().into())
        .context("failed to build HTTP client")?;
    let api = ScrapingApiClient::new(http, &config.scraping_api)
        .context("scraping API unavailable")?;

    let html = api
        .fetch_page(url)
        .await
        .with_context(|| format!("failed to fetch {url}"))?;

    let snapshot = extract_snapshot(&html, url);
    if snapshot.is_empty() {
        warn!("No product data found on the page");
    }

    let saved = export::save_snapshot(&snapshot, output)?;
    info!("Main output: {:?}", saved.main_csv);
    log_summary(&snapshot);
    Ok(())
}

/// Run the selector cascades, then the embedded-state and metatag fallbacks.
fn extract_snapshot(html: &str, url: &str) -> ProductSnapshot {
    let document = Html::parse_document(html);
    let extractor = ProductExtractor::default();
    let mut snapshot = extractor.extract(&document, url);

    if snapshot.is_empty() {
        if let Some(data) = embedded_product_state(&document) {
            info!("Selector cascades missed; using embedded state data");
            apply_embedded_state(&mut snapshot, &data);
        }
    }
    if snapshot.is_empty() {
        info!("Falling back to Open Graph metatags");
        apply_og_metatags(&mut snapshot, &document);
    }
    snapshot
}

fn log_summary(snapshot: &ProductSnapshot) {
    info!("Name: {}", snapshot.name.as_deref().unwrap_or("N/A"));
    info!("Price: {}", snapshot.price.as_deref().unwrap_or("N/A"));
    info!("Rating: {}", snapshot.rating.as_deref().unwrap_or("N/A"));
    info!("Seller: {}", snapshot.seller.as_deref().unwrap_or("N/A"));
    info!("Sold: {}", snapshot.sold_count.as_deref().unwrap_or("N/A"));
    info!("Specifications: {} items", snapshot.specs.len());
    info!("Reviews: {} comments", snapshot.reviews.len());
    info!("Images: {} found", snapshot.images.len());
}

/// Fetch full `get_pc` payloads for a list of product URLs through the
/// cookie/proxy session, dumping one JSON file per product.
pub async fn run_detail(
    config: &AppConfig,
    urls: &[String],
    output_dir: Option<&Path>,
) -> Result<()> {
    let mut products = Vec::new();
    for url in urls {
        match ProductRef::parse(url) {
            Ok(product) => products.push((url.as_str(), product)),
            Err(e) => warn!("Skipping {}: {}", url, e),
        }
    }
    if products.is_empty() {
        return Err(anyhow!("no valid product URLs to fetch"));
    }

    let marketplace = Marketplace::from_url(products[0].0);
    let mut session = SessionClient::new(&config.session, &config.http, marketplace)
        .context("failed to build session client")?;
    session.warm_up().await;

    let results_dir = output_dir.unwrap_or(&config.output.results_dir);
    let mut fetched = 0usize;
    for (url, product) in &products {
        info!("Fetching product {}/{} ({})", product.shop_id, product.item_id, url);
        match session.fetch_detail(product).await {
            Ok(payload) => {
                export::save_detail_json(results_dir, product, &payload)?;
                match pdp_api::summarize_get_pc(&payload) {
                    Some(summary) => {
                        info!("Name: {}", summary.name.as_deref().unwrap_or("N/A"));
                        info!("Price: {}", summary.price.as_deref().unwrap_or("N/A"));
                        if let Some(stock) = summary.stock {
                            info!("Stock: {}", stock);
                        }
                        if let Some(rating) = summary.rating {
                            info!("Rating: {:.2}", rating);
                        }
                        if let Some(sold) = summary.historical_sold {
                            info!("Sold: {}", sold);
                        }
                    }
                    None => warn!("Payload for {} carries no item data", url),
                }
                fetched += 1;
            }
            Err(e) => warn!("Failed to fetch {}: {}", url, e),
        }
    }

    info!("Fetched {}/{} products", fetched, products.len());
    Ok(())
}
