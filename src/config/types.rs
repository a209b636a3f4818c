use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Job-Crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub categories: CategoryConfig,
}

/// Endpoints and identity for the job site being crawled
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Source tag stored alongside every URL and category (e.g. "104")
    pub source: String,

    /// Search results endpoint
    #[serde(rename = "search-url")]
    pub search_url: String,

    /// Detail API prefix; the job identifier is appended to it
    #[serde(rename = "detail-api-url")]
    pub detail_api_url: String,

    /// Category taxonomy JSON endpoint
    #[serde(rename = "category-url")]
    pub category_url: String,

    /// Referer sent with search and category requests
    pub referer: String,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

/// URL discovery behavior
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Category code to search within; the URL job is a no-op without one
    #[serde(rename = "category-code", default)]
    pub category_code: Option<String>,

    /// Keyword partitions; empty means a single empty-keyword search
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Upper bound on pages fetched per partition
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Sort-order code passed to the search endpoint
    #[serde(default = "default_order")]
    pub order: u32,

    /// Concurrent page fetches within one partition
    #[serde(rename = "page-workers", default = "default_page_workers")]
    pub page_workers: usize,

    /// Concurrent partitions
    #[serde(rename = "partition-workers", default = "default_partition_workers")]
    pub partition_workers: usize,
}

/// Detail fetching behavior
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Global dispatch rate cap
    #[serde(rename = "requests-per-second", default = "default_requests_per_second")]
    pub requests_per_second: f64,

    /// Maximum in-flight detail requests
    #[serde(rename = "max-workers", default = "default_max_workers")]
    pub max_workers: usize,

    /// Capacity of the completed-result channel
    #[serde(rename = "queue-depth", default = "default_queue_depth")]
    pub queue_depth: usize,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Attempts per URL, including the first
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before the second attempt, doubled for each later one
    #[serde(rename = "backoff-base-ms", default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Backoff ceiling
    #[serde(rename = "backoff-max-ms", default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,

    /// Records held in memory before a flush
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Log progress every N completed URLs
    #[serde(rename = "progress-interval", default = "default_progress_interval")]
    pub progress_interval: usize,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Connection attempts at startup before giving up
    #[serde(rename = "connect-attempts", default = "default_connect_attempts")]
    pub connect_attempts: u32,

    /// Delay between connection attempts (milliseconds)
    #[serde(rename = "connect-retry-delay-ms", default = "default_connect_retry_delay_ms")]
    pub connect_retry_delay_ms: u64,
}

/// Category sync configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    /// Where the raw taxonomy is cached between runs
    #[serde(rename = "cache-path", default)]
    pub cache_path: Option<String>,

    /// Age after which the cache is refreshed from the network
    #[serde(rename = "cache-max-age-hours", default = "default_cache_max_age_hours")]
    pub cache_max_age_hours: u64,
}

impl FetcherConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            category_code: None,
            keywords: Vec::new(),
            max_pages: default_max_pages(),
            order: default_order(),
            page_workers: default_page_workers(),
            partition_workers: default_partition_workers(),
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
            max_workers: default_max_workers(),
            queue_depth: default_queue_depth(),
            request_timeout_secs: default_request_timeout_secs(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            batch_size: default_batch_size(),
            progress_interval: default_progress_interval(),
        }
    }
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            cache_path: None,
            cache_max_age_hours: default_cache_max_age_hours(),
        }
    }
}

fn default_max_pages() -> u32 {
    100
}

fn default_order() -> u32 {
    15
}

fn default_page_workers() -> usize {
    5
}

fn default_partition_workers() -> usize {
    10
}

fn default_requests_per_second() -> f64 {
    10.0
}

fn default_max_workers() -> usize {
    10
}

fn default_queue_depth() -> usize {
    100
}

fn default_request_timeout_secs() -> u64 {
    20
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    2000
}

fn default_backoff_max_ms() -> u64 {
    10_000
}

fn default_batch_size() -> usize {
    100
}

fn default_progress_interval() -> usize {
    100
}

fn default_connect_attempts() -> u32 {
    5
}

fn default_connect_retry_delay_ms() -> u64 {
    3000
}

fn default_cache_max_age_hours() -> u64 {
    720
}
