//! Job-Crawler: a job-listing crawl-and-ingest pipeline
//!
//! This crate discovers listing URLs from a paginated job search, fetches the
//! structured detail record behind each listing under a global rate cap, and
//! upserts normalized records into SQLite keyed by their natural identifiers.

pub mod config;
pub mod crawler;
pub mod jobs;
pub mod model;
pub mod normalizer;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Job-Crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown job: {0}")]
    UnknownJob(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("No job identifier in URL: {0}")]
    MissingJobId(String),
}

/// Result type alias for Job-Crawler operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use jobs::{JobArgs, JobContext, JobRegistry, JobSummary};
pub use model::{CategoryNode, DiscoveredUrl, JobRecord, UrlStatus};
pub use normalizer::normalize_job;
pub use url::{job_id_from_url, normalize_listing_url};
