//! Configuration module for Job-Crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use job_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Fetching at {} req/s", config.fetcher.requests_per_second);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CategoryConfig, Config, DiscoveryConfig, FetcherConfig, SiteConfig, StorageConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
