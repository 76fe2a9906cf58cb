//! Logging system configuration and initialization
//!
//! Console output by default, optional non-blocking file output under
//! `logs/` next to the working directory. `RUST_LOG` overrides the
//! configured level.

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry,
};

pub use crate::infrastructure::config::LoggingConfig;

// Keeps the non-blocking file writer alive for the process lifetime
static LOG_GUARDS: Lazy<Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>>> =
    Lazy::new(|| Mutex::new(Vec::new()));

pub fn log_directory() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("logs")
}

/// Initialize logging from configuration
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = EnvFilter::new(&config.level);
        if !config.level.eq_ignore_ascii_case("trace") {
            // Suppress verbose HTTP internals unless TRACE is requested
            for directive in ["reqwest=info", "hyper=warn", "h2=warn", "tokio=info"] {
                if let Ok(parsed) = directive.parse() {
                    filter = filter.add_directive(parsed);
                }
            }
        }
        filter
    });

    let registry = Registry::default().with(env_filter);

    match (config.file_output, config.console_output) {
        (true, true) => {
            let log_dir = log_directory();
            std::fs::create_dir_all(&log_dir)
                .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;
            let file_appender = rolling::never(&log_dir, "shopee-scraper.log");
            let (file_writer, guard) = non_blocking(file_appender);
            LOG_GUARDS.lock().expect("log guard mutex").push(guard);

            let file_layer = fmt::Layer::new()
                .with_writer(file_writer)
                .with_target(false)
                .with_ansi(false);
            let console_layer = fmt::Layer::new()
                .with_writer(std::io::stderr)
                .with_target(false);
            registry.with(file_layer).with(console_layer).init();
        }
        (true, false) => {
            let log_dir = log_directory();
            std::fs::create_dir_all(&log_dir)
                .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;
            let file_appender = rolling::never(&log_dir, "shopee-scraper.log");
            let (file_writer, guard) = non_blocking(file_appender);
            LOG_GUARDS.lock().expect("log guard mutex").push(guard);

            let file_layer = fmt::Layer::new()
                .with_writer(file_writer)
                .with_target(false)
                .with_ansi(false);
            registry.with(file_layer).init();
        }
        (false, true) => {
            let console_layer = fmt::Layer::new()
                .with_writer(std::io::stderr)
                .with_target(false);
            registry.with(console_layer).init();
        }
        (false, false) => {
            return Err(anyhow!("No logging output configured"));
        }
    }

    info!("Logging initialized (level: {})", config.level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_directory_is_deterministic() {
        assert!(log_directory().to_string_lossy().ends_with("logs"));
    }

    #[test]
    fn default_config_logs_to_console() {
        let config = LoggingConfig::default();
        assert!(config.console_output);
        assert!(!config.file_output);
    }
}
