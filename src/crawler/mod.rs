//! Crawler module for search discovery and detail fetching
//!
//! This module contains the network-facing half of the pipeline, including:
//! - HTTP client construction
//! - Search results parsing and paginated URL discovery
//! - Rate-limited, retrying detail fetches
//! - The bounded worker pool both sides share

mod client;
mod fetcher;
mod parser;
mod pool;
mod rate_limiter;
mod retry;
mod scraper;

pub use client::build_http_client;
pub use fetcher::{CompletedFetch, DetailFetcher, FetchError, FetchOutcome};
pub use parser::{parse_search_page, SearchPage};
pub use pool::run_bounded;
pub use rate_limiter::RateLimiter;
pub use retry::{retry_with_backoff, RetryPolicy};
pub use scraper::{discover_all, KeywordScraper};
