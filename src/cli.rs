//! Command-line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "shopee-scraper", version, about = "Marketplace product scraping toolkit")]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scrape one rendered product page through the scraping API
    Scrape {
        /// Product page URL
        url: String,

        /// Output file stem (default: derived from the product name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch full product payloads through the cookie/proxy session
    Detail {
        /// Product page URLs
        #[arg(required = true)]
        urls: Vec<String>,

        /// Directory for the per-product JSON dumps
        #[arg(short = 'd', long)]
        output_dir: Option<PathBuf>,
    },

    /// Scrape a link list concurrently into an append-only CSV
    Batch {
        /// Links file (.csv, .xlsx or plain text, one URL per line)
        links: PathBuf,

        /// Products CSV (default from configuration)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Failed-links CSV (default from configuration)
        #[arg(short, long)]
        errors: Option<PathBuf>,

        /// Maximum concurrent requests
        #[arg(short, long)]
        workers: Option<usize>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrape_parses_url_and_output() {
        let cli = Cli::try_parse_from([
            "shopee-scraper",
            "scrape",
            "https://shopee.tw/x-i.1.2",
            "--output",
            "out.csv",
        ])
        .unwrap();
        match cli.command {
            Command::Scrape { url, output } => {
                assert_eq!(url, "https://shopee.tw/x-i.1.2");
                assert_eq!(output.unwrap(), PathBuf::from("out.csv"));
            }
            _ => panic!("expected scrape"),
        }
    }

    #[test]
    fn detail_requires_at_least_one_url() {
        assert!(Cli::try_parse_from(["shopee-scraper", "detail"]).is_err());
        let cli = Cli::try_parse_from([
            "shopee-scraper",
            "detail",
            "https://shopee.tw/x-i.1.2",
            "https://shopee.tw/y-i.3.4",
        ])
        .unwrap();
        match cli.command {
            Command::Detail { urls, .. } => assert_eq!(urls.len(), 2),
            _ => panic!("expected detail"),
        }
    }

    #[test]
    fn batch_accepts_worker_override_and_global_config() {
        let cli = Cli::try_parse_from([
            "shopee-scraper",
            "batch",
            "links.xlsx",
            "--workers",
            "10",
            "--config",
            "custom.json",
        ])
        .unwrap();
        assert_eq!(cli.config.unwrap(), PathBuf::from("custom.json"));
        match cli.command {
            Command::Batch { links, workers, .. } => {
                assert_eq!(links, PathBuf::from("links.xlsx"));
                assert_eq!(workers, Some(10));
            }
            _ => panic!("expected batch"),
        }
    }
}
