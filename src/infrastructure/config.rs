//! Configuration infrastructure
//!
//! Settings live in a JSON file under the user config directory and are
//! created with defaults on first run. Sections map onto the fetch paths:
//! plain HTTP, session (cookies/proxies), scraping API, batch driver,
//! output locations and logging.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tracing::info;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub session: SessionConfig,
    pub scraping_api: ScrapingApiConfig,
    pub batch: BatchConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Plain HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
    pub follow_redirects: bool,
}

/// Session fetcher settings: cookie files, proxy list, pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory of cookie text files (`name=value; name2=value2` per file)
    pub cookies_dir: PathBuf,
    /// Proxy list file: `ip:port:user:pass` lines, or a single proxy URL
    pub proxies_file: PathBuf,
    /// Consecutive failures before rotating to the next cookie file
    pub max_cookie_failures: u32,
    /// Visit the marketplace root before product pages to pick up cookies
    pub warm_up: bool,
    /// Random per-request delay bounds in milliseconds
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Query parameters forwarded to the `get_pc` endpoint
    pub tz_offset_minutes: i32,
    pub detail_level: u32,
    pub max_retries: u32,
}

/// Third-party scraping proxy API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingApiConfig {
    pub endpoint: String,
    /// Falls back to the `SCRAPINGANT_API_KEY` environment variable
    pub api_key: Option<String>,
    /// Ask the proxy to render the page in a browser
    pub browser: bool,
}

/// Batch driver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub max_concurrent: usize,
    pub max_requests_per_second: u32,
    pub max_retries: u32,
    /// URLs are processed in slices of this size to bound memory
    pub batch_size: usize,
    pub timeout_seconds: u64,
}

/// Output file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub batch_output_file: PathBuf,
    pub batch_error_file: PathBuf,
    pub results_dir: PathBuf,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,
    pub console_output: bool,
    pub file_output: bool,
}

/// Default values shared between config structs and tests
pub mod defaults {
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    pub const TIMEOUT_SECONDS: u64 = 30;
    pub const MAX_REQUESTS_PER_SECOND: u32 = 20;
    pub const FOLLOW_REDIRECTS: bool = true;

    pub const COOKIES_DIR: &str = "cookies";
    pub const PROXIES_FILE: &str = "proxies.txt";
    pub const MAX_COOKIE_FAILURES: u32 = 3;
    pub const SESSION_MIN_DELAY_MS: u64 = 1_000;
    pub const SESSION_MAX_DELAY_MS: u64 = 3_000;
    pub const TZ_OFFSET_MINUTES: i32 = 60;
    pub const DETAIL_LEVEL: u32 = 0;
    pub const SESSION_MAX_RETRIES: u32 = 3;

    pub const SCRAPING_API_ENDPOINT: &str = "https://api.scrapingant.com/v2/general";
    pub const SCRAPING_API_BROWSER: bool = true;

    pub const MAX_CONCURRENT: usize = 100;
    pub const BATCH_MAX_RETRIES: u32 = 3;
    pub const BATCH_SIZE: usize = 1_000;

    pub const BATCH_OUTPUT_FILE: &str = "shopee_products.csv";
    pub const BATCH_ERROR_FILE: &str = "shopee_failed_links.csv";
    pub const RESULTS_DIR: &str = "results";

    pub const LOG_LEVEL: &str = "info";
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            timeout_seconds: defaults::TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            follow_redirects: defaults::FOLLOW_REDIRECTS,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookies_dir: PathBuf::from(defaults::COOKIES_DIR),
            proxies_file: PathBuf::from(defaults::PROXIES_FILE),
            max_cookie_failures: defaults::MAX_COOKIE_FAILURES,
            warm_up: true,
            min_delay_ms: defaults::SESSION_MIN_DELAY_MS,
            max_delay_ms: defaults::SESSION_MAX_DELAY_MS,
            tz_offset_minutes: defaults::TZ_OFFSET_MINUTES,
            detail_level: defaults::DETAIL_LEVEL,
            max_retries: defaults::SESSION_MAX_RETRIES,
        }
    }
}

impl Default for ScrapingApiConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::SCRAPING_API_ENDPOINT.to_string(),
            api_key: None,
            browser: defaults::SCRAPING_API_BROWSER,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: defaults::MAX_CONCURRENT,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            max_retries: defaults::BATCH_MAX_RETRIES,
            batch_size: defaults::BATCH_SIZE,
            timeout_seconds: defaults::TIMEOUT_SECONDS,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            batch_output_file: PathBuf::from(defaults::BATCH_OUTPUT_FILE),
            batch_error_file: PathBuf::from(defaults::BATCH_ERROR_FILE),
            results_dir: PathBuf::from(defaults::RESULTS_DIR),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            console_output: true,
            file_output: false,
        }
    }
}

impl ScrapingApiConfig {
    /// Resolve the API key from config or environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var("SCRAPINGANT_API_KEY").ok().filter(|k| !k.is_empty()))
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join("shopee-scraper");
        Ok(config_dir)
    }

    /// Manager pointed at the default config location
    pub fn new() -> Result<Self> {
        let config_path = Self::config_dir()?.join("shopee_scraper_config.json");
        Ok(Self { config_path })
    }

    /// Manager pointed at an explicit config file
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Load configuration from file, creating the default if it doesn't exist
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!(
                "Configuration file not found, creating default: {:?}",
                self.config_path
            );
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .context("Failed to read configuration file")?;

        let config: AppConfig =
            serde_json::from_str(&content).context("Failed to parse configuration file")?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_creates_default_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let manager = ConfigManager::with_path(path.clone());

        let config = manager.load_config().await.unwrap();
        assert!(path.exists());
        assert_eq!(config.batch.max_concurrent, defaults::MAX_CONCURRENT);
        assert_eq!(config.logging.level, defaults::LOG_LEVEL);
    }

    #[tokio::test]
    async fn save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.json"));

        let mut config = AppConfig::default();
        config.batch.max_concurrent = 7;
        config.session.cookies_dir = PathBuf::from("/tmp/cookies");
        manager.save_config(&config).await.unwrap();

        let reloaded = manager.load_config().await.unwrap();
        assert_eq!(reloaded.batch.max_concurrent, 7);
        assert_eq!(reloaded.session.cookies_dir, PathBuf::from("/tmp/cookies"));
    }

    #[test]
    fn partial_config_fills_missing_sections_with_defaults() {
        let json = r#"{ "batch": { "max_concurrent": 5 } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.batch.max_concurrent, 5);
        assert_eq!(config.batch.batch_size, defaults::BATCH_SIZE);
        assert_eq!(config.http.timeout_seconds, defaults::TIMEOUT_SECONDS);
    }
}
