//! CSV and JSON persistence
//!
//! Output CSVs are append-only: the header row is written only when the file
//! is missing or empty, so interrupted runs can resume into the same file
//! without re-headering. Every append opens, writes and flushes immediately
//! so a crash loses at most the in-flight row.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::product::{single_line, BatchRow, ProductSnapshot};
use crate::domain::product_url::ProductRef;

const BATCH_HEADER: &[&str] = &["shop_id", "item_id", "title", "description", "price", "url"];
const ERROR_HEADER: &[&str] = &["url", "error_message"];
const DESCRIPTION_PREVIEW_CHARS: usize = 200;

/// Open a CSV file for appending, writing `header` first if the file is new
/// or empty.
fn open_csv_appender(path: &Path, header: &[&str]) -> Result<csv::Writer<File>> {
    let needs_header = match std::fs::metadata(path) {
        Ok(meta) => meta.len() == 0,
        Err(_) => true,
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {:?}", path))?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if needs_header {
        writer
            .write_record(header)
            .with_context(|| format!("failed to write header to {:?}", path))?;
    }
    Ok(writer)
}

/// Incremental sink for batch results and failures
pub struct BatchCsvSink {
    products_path: PathBuf,
    errors_path: PathBuf,
}

impl BatchCsvSink {
    pub fn new(products_path: PathBuf, errors_path: PathBuf) -> Self {
        Self {
            products_path,
            errors_path,
        }
    }

    pub fn append_row(&self, row: &BatchRow) -> Result<()> {
        let mut writer = open_csv_appender(&self.products_path, BATCH_HEADER)?;
        writer
            .serialize(row)
            .with_context(|| format!("failed to append row for {}", row.url))?;
        writer.flush().context("failed to flush products CSV")?;
        Ok(())
    }

    pub fn append_error(&self, url: &str, message: &str) -> Result<()> {
        let mut writer = open_csv_appender(&self.errors_path, ERROR_HEADER)?;
        writer
            .write_record([url, &single_line(message)])
            .with_context(|| format!("failed to append error for {url}"))?;
        writer.flush().context("failed to flush errors CSV")?;
        Ok(())
    }

    pub fn products_path(&self) -> &Path {
        &self.products_path
    }

    pub fn errors_path(&self) -> &Path {
        &self.errors_path
    }
}

/// Paths written for one scraped product
#[derive(Debug, Default)]
pub struct SavedFiles {
    pub main_csv: PathBuf,
    pub specs_csv: Option<PathBuf>,
    pub reviews_csv: Option<PathBuf>,
    pub json: PathBuf,
}

fn preview(text: &str) -> String {
    if text.chars().count() > DESCRIPTION_PREVIEW_CHARS {
        let cut: String = text.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

/// Write the full output set for a single scraped product: a one-row main
/// CSV, optional `_specs.csv` and `_reviews.csv`, and a pretty JSON dump.
pub fn save_snapshot(snapshot: &ProductSnapshot, output: Option<&Path>) -> Result<SavedFiles> {
    let stem: PathBuf = match output {
        Some(path) => path.with_extension(""),
        None => PathBuf::from(snapshot.file_stem()),
    };
    if let Some(parent) = stem.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {:?}", parent))?;
        }
    }

    let main_csv = stem.with_extension("csv");
    let mut writer = csv::Writer::from_path(&main_csv)
        .with_context(|| format!("failed to create {:?}", main_csv))?;
    writer.write_record(["URL", "Name", "Price", "Rating", "Seller", "Sold", "Description"])?;
    writer.write_record([
        snapshot.url.as_str(),
        snapshot.name.as_deref().unwrap_or("N/A"),
        snapshot.price.as_deref().unwrap_or("N/A"),
        snapshot.rating.as_deref().unwrap_or("N/A"),
        snapshot.seller.as_deref().unwrap_or("N/A"),
        snapshot.sold_count.as_deref().unwrap_or("N/A"),
        &preview(snapshot.description.as_deref().unwrap_or("N/A")),
    ])?;
    writer.flush()?;
    info!("Saved product data to {:?}", main_csv);

    let mut saved = SavedFiles {
        main_csv,
        ..SavedFiles::default()
    };

    if !snapshot.specs.is_empty() {
        let specs_csv = append_to_stem(&stem, "_specs");
        let mut writer = csv::Writer::from_path(&specs_csv)
            .with_context(|| format!("failed to create {:?}", specs_csv))?;
        writer.write_record(["Attribute", "Value"])?;
        for spec in &snapshot.specs {
            writer.write_record([spec.label.as_str(), spec.value.as_str()])?;
        }
        writer.flush()?;
        info!("Saved {} specifications to {:?}", snapshot.specs.len(), specs_csv);
        saved.specs_csv = Some(specs_csv);
    }

    if !snapshot.reviews.is_empty() {
        let reviews_csv = append_to_stem(&stem, "_reviews");
        let mut writer = csv::Writer::from_path(&reviews_csv)
            .with_context(|| format!("failed to create {:?}", reviews_csv))?;
        writer.write_record(["Reviewer", "Stars", "Comment"])?;
        for review in &snapshot.reviews {
            writer.write_record([
                review.reviewer.as_str(),
                review.stars.as_str(),
                review.comment.as_str(),
            ])?;
        }
        writer.flush()?;
        info!("Saved {} reviews to {:?}", snapshot.reviews.len(), reviews_csv);
        saved.reviews_csv = Some(reviews_csv);
    }

    let json_path = stem.with_extension("json");
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(&json_path, json).with_context(|| format!("failed to write {:?}", json_path))?;
    info!("Saved full product data to {:?}", json_path);
    saved.json = json_path;

    Ok(saved)
}

fn append_to_stem(stem: &Path, suffix: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name).with_extension("csv")
}

/// Dump one raw `get_pc` payload as `product_<item>_<shop>.json`.
pub fn save_detail_json(
    results_dir: &Path,
    product: &ProductRef,
    payload: &serde_json::Value,
) -> Result<PathBuf> {
    std::fs::create_dir_all(results_dir)
        .with_context(|| format!("failed to create {:?}", results_dir))?;
    let path = results_dir.join(format!(
        "product_{}_{}.json",
        product.item_id, product.shop_id
    ));
    let json = serde_json::to_string_pretty(payload)?;
    std::fs::write(&path, json).with_context(|| format!("failed to write {:?}", path))?;
    info!("Saved raw payload to {:?}", path);
    Ok(path)
}
