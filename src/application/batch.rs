//! Concurrent batch scraping driver
//!
//! Fans a link list out over the lightweight `get_rw` endpoint with bounded
//! concurrency, paces requests against the configured rate, retries rate
//! limits and timeouts with exponential backoff, and persists every outcome
//! the moment it completes so an interrupted run loses nothing.

use anyhow::Result;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::domain::product::BatchRow;
use crate::domain::product_url::ProductRef;
use crate::error::ScrapeError;
use crate::infrastructure::config::BatchConfig;
use crate::infrastructure::export::BatchCsvSink;
use crate::infrastructure::pdp_api::PdpApiClient;

/// Outcome counters for one batch run
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl BatchSummary {
    /// Completed URLs per second over the whole run.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total as f64 / secs
        } else {
            0.0
        }
    }
}

struct Outcome {
    url: String,
    result: Result<BatchRow, ScrapeError>,
}

/// Bounded-concurrency driver over the product detail API
pub struct BatchDriver {
    api: Arc<PdpApiClient>,
    config: BatchConfig,
}

impl BatchDriver {
    pub fn new(api: PdpApiClient, config: BatchConfig) -> Self {
        Self {
            api: Arc::new(api),
            config,
        }
    }

    fn pacing_delay(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.config.max_requests_per_second.max(1)))
    }

    /// Process every URL, appending each outcome to the sink as it lands.
    pub async fn run(&self, urls: &[String], sink: &BatchCsvSink) -> Result<BatchSummary> {
        let started = Instant::now();
        let mut summary = BatchSummary {
            total: urls.len(),
            ..BatchSummary::default()
        };

        let progress = ProgressBar::new(urls.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{msg} {spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} ({eta})")
                .expect("valid progress template")
                .progress_chars("##-"),
        );
        progress.set_message("Scraping");

        let mut interrupt = Box::pin(tokio::signal::ctrl_c());
        let mut interrupted = false;

        let batch_size = self.config.batch_size.max(1);
        'batches: for slice in urls.chunks(batch_size) {
            let mut outcomes = stream::iter(slice.iter().cloned().map(|url| {
                let api = Arc::clone(&self.api);
                let pacing = self.pacing_delay();
                let max_retries = self.config.max_retries.max(1);
                async move {
                    let result = process_url(&api, &url, pacing, max_retries).await;
                    Outcome { url, result }
                }
            }))
            .buffer_unordered(self.config.max_concurrent.max(1));

            loop {
                let outcome = tokio::select! {
                    biased;
                    _ = &mut interrupt => {
                        warn!("Interrupted; aborting remaining requests");
                        interrupted = true;
                        break 'batches;
                    }
                    outcome = outcomes.next() => match outcome {
                        Some(outcome) => outcome,
                        None => break,
                    },
                };
                match outcome.result {
                    Ok(row) => {
                        sink.append_row(&row)?;
                        summary.succeeded += 1;
                    }
                    Err(e) => {
                        warn!("Failed {}: {}", outcome.url, e);
                        sink.append_error(&outcome.url, &e.to_string())?;
                        summary.failed += 1;
                    }
                }
                progress.inc(1);
            }
        }

        progress.finish_with_message(if interrupted { "Interrupted" } else { "Done" });
        summary.elapsed = started.elapsed();
        info!(
            "Batch finished: {}/{} succeeded, {} failed in {:.1}s ({:.2} urls/s)",
            summary.succeeded,
            summary.total,
            summary.failed,
            summary.elapsed.as_secs_f64(),
            summary.throughput()
        );
        Ok(summary)
    }
}

/// Fetch one URL with pacing and retry.
///
/// A URL that fails id extraction never reaches the network. Only rate
/// limits and timeouts are retried; other errors fail the URL immediately.
async fn process_url(
    api: &PdpApiClient,
    url: &str,
    pacing: Duration,
    max_retries: u32,
) -> Result<BatchRow, ScrapeError> {
    let product = ProductRef::parse(url)?;

    let mut attempt = 0;
    loop {
        tokio::time::sleep(pacing).await;
        match api.fetch_item(url, &product).await {
            Ok(row) => return Ok(row),
            Err(e) if e.is_retryable() && attempt + 1 < max_retries => {
                let backoff = Duration::from_secs(1 << attempt);
                warn!(
                    "Retryable failure on {} (attempt {}): {}; backing off {:?}",
                    url,
                    attempt + 1,
                    e,
                    backoff
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
