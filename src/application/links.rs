//! Product link loading from CSV, XLSX and plain text files
//!
//! The link file format is picked by extension. CSV reads the first column
//! and tolerates an optional `url` header; XLSX reads the first column of the
//! first sheet, where a single cell may carry several product ids; anything
//! else is treated as one URL per line.

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Reader};
use std::path::Path;
use tracing::info;

use crate::domain::product_url::{Marketplace, ProductRef};

pub fn load_links(path: &Path) -> Result<Vec<String>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let links = match extension.as_str() {
        "csv" => load_csv(path)?,
        "xlsx" | "xls" => load_xlsx(path)?,
        _ => load_text(path)?,
    };
    info!("Loaded {} links from {:?}", links.len(), path);
    Ok(links)
}

fn load_csv(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {:?}", path))?;

    let mut links = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("malformed CSV in {:?}", path))?;
        let Some(cell) = record.get(0) else {
            continue;
        };
        let cell = cell.trim();
        if cell.is_empty() || cell.eq_ignore_ascii_case("url") {
            continue;
        }
        links.push(cell.to_string());
    }
    Ok(links)
}

fn load_xlsx(path: &Path) -> Result<Vec<String>> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("failed to open {:?}", path))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("{:?} has no sheets", path))?
        .with_context(|| format!("failed to read first sheet of {:?}", path))?;

    let mut links = Vec::new();
    for row in range.rows() {
        let Some(cell) = row.first() else {
            continue;
        };
        let text = cell.to_string();
        let text = text.trim();
        if text.is_empty() || text.eq_ignore_ascii_case("url") {
            continue;
        }
        // A cell may hold several dotted ids; expand each into a product URL
        let refs = ProductRef::parse_all(text);
        if refs.is_empty() {
            if text.starts_with("http") {
                links.push(text.to_string());
            }
            continue;
        }
        let marketplace = Marketplace::from_url(text);
        for product in refs {
            links.push(product.product_url(marketplace));
        }
    }
    Ok(links)
}

fn load_text(path: &Path) -> Result<Vec<String>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to open {:?}", path))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}
