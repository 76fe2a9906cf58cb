//! Marketplace product scraping toolkit
//!
//! Three flows share one infrastructure layer: `scrape` renders a single
//! product page through a scraping API and runs selector cascades over it,
//! `detail` pulls full product payloads through a cookie/proxy browser
//! session, and `batch` fans a link list out over the lightweight product
//! API with bounded concurrency and append-only CSV output.

pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::ScrapeError;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::application::{batch::BatchDriver, links, single};
use crate::cli::{Cli, Command};
use crate::infrastructure::config::{AppConfig, ConfigManager};
use crate::infrastructure::export::BatchCsvSink;
use crate::infrastructure::http_client::{HttpClient, HttpClientConfig};
use crate::infrastructure::logging;
use crate::infrastructure::pdp_api::PdpApiClient;

/// Parse the command line, load configuration and dispatch.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new()?,
    };
    let config = manager.load_config().await?;
    logging::init_logging(&config.logging)?;

    match cli.command {
        Command::Scrape { url, output } => {
            single::run_scrape(&config, &url, output.as_deref()).await
        }
        Command::Detail { urls, output_dir } => {
            single::run_detail(&config, &urls, output_dir.as_deref()).await
        }
        Command::Batch {
            links,
            output,
            errors,
            workers,
        } => run_batch(&config, &links, output, errors, workers).await,
    }
}

async fn run_batch(
    config: &AppConfig,
    links_path: &std::path::Path,
    output: Option<PathBuf>,
    errors: Option<PathBuf>,
    workers: Option<usize>,
) -> Result<()> {
    let urls = links::load_links(links_path)?;
    if urls.is_empty() {
        tracing::warn!("No links found in {:?}", links_path);
        return Ok(());
    }

    let mut batch_config = config.batch.clone();
    if let Some(workers) = workers {
        batch_config.max_concurrent = workers;
    }

    // The shared limiter and the per-task pacing follow the same rate
    let http_config = HttpClientConfig {
        timeout_seconds: batch_config.timeout_seconds,
        max_requests_per_second: batch_config.max_requests_per_second,
        ..config.http.clone().into()
    };
    let http = HttpClient::new(http_config).context("failed to build HTTP client")?;
    let api = PdpApiClient::new(http);

    let sink = BatchCsvSink::new(
        output.unwrap_or_else(|| config.output.batch_output_file.clone()),
        errors.unwrap_or_else(|| config.output.batch_error_file.clone()),
    );

    let driver = BatchDriver::new(api, batch_config);
    let summary = driver.run(&urls, &sink).await?;
    tracing::info!(
        "Results in {:?}, failures in {:?} ({} ok / {} failed)",
        sink.products_path(),
        sink.errors_path(),
        summary.succeeded,
        summary.failed
    );
    Ok(())
}
