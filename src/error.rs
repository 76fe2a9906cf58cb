//! Crate error type with retryability classification
//!
//! Fetch failures fall into two camps: transient ones worth retrying with
//! backoff (rate limits, timeouts) and everything else, which fails the URL
//! immediately.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("no product ids found in URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: StatusCode, url: String },

    #[error("rate limited (HTTP 429)")]
    RateLimited,

    #[error("request timed out")]
    Timeout,

    #[error("response carried no product data")]
    EmptyPayload,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("missing API key for {0}; set it in the config file or environment")]
    MissingApiKey(&'static str),
}

impl ScrapeError {
    /// Classify a reqwest error, folding timeouts into [`ScrapeError::Timeout`].
    pub fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(error)
        }
    }

    /// Classify a non-success status, folding 429 into [`ScrapeError::RateLimited`].
    pub fn from_status(status: StatusCode, url: &str) -> Self {
        if status == StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited
        } else {
            Self::HttpStatus {
                status,
                url: url.to_string(),
            }
        }
    }

    /// Whether a retry with backoff is worthwhile.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Timeout)
    }
}
