//! OSDI-Harvest: a form-submission harvester for OSDI-style REST APIs
//!
//! This crate walks the paginated submissions of one form, keeps the most
//! recent submission per person, enriches each person with a second API call
//! and writes a flat JSON dataset for downstream consumers.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for OSDI-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error! Status: {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Malformed JSON body from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize dataset: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Worker task failed: {0}")]
    Worker(String),
}

impl HarvestError {
    /// Returns true for failures that only abandon one unit of work
    ///
    /// Non-success statuses, transport errors, timeouts and malformed bodies
    /// are logged and skipped by the crawlers. Everything else aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::HttpStatus { .. } | Self::Http { .. } | Self::Timeout { .. } | Self::Decode { .. }
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for OSDI-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_harvest, HarvestReport, Harvester};
pub use output::{OutputRecord, SENTINEL};
pub use state::{DedupIndex, SubmissionRecord};
