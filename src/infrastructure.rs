//! Infrastructure layer - HTTP clients, HTML parsing, configuration and exports

pub mod config;
pub mod export;
pub mod html_extractor;
pub mod http_client;
pub mod logging;
pub mod pdp_api;
pub mod scraping_api;
pub mod session;

pub use config::{AppConfig, ConfigManager};
pub use http_client::{HttpClient, HttpClientConfig};
