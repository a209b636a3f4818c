use crate::config::types::{
    CategoryConfig, Config, DiscoveryConfig, FetcherConfig, SiteConfig, StorageConfig,
};
use crate::ConfigError;
use std::time::Duration;
use url::Url;

const MAX_WORKERS: usize = 100;

/// Longest category cache lifetime accepted (ten years)
const MAX_CACHE_AGE_HOURS: u64 = 24 * 365 * 10;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_discovery_config(&config.discovery)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_storage_config(&config.storage)?;
    validate_category_config(&config.categories)?;
    Ok(())
}

fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    if config.source.trim().is_empty() {
        return Err(ConfigError::Validation("source cannot be empty".to_string()));
    }

    validate_http_url("search-url", &config.search_url)?;
    validate_http_url("detail-api-url", &config.detail_api_url)?;
    validate_http_url("category-url", &config.category_url)?;
    validate_http_url("referer", &config.referer)?;

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    validate_worker_count("page-workers", config.page_workers)?;
    validate_worker_count("partition-workers", config.partition_workers)?;

    Ok(())
}

fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if !config.requests_per_second.is_finite() || config.requests_per_second <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "requests-per-second must be a positive number, got {}",
            config.requests_per_second
        )));
    }

    if Duration::try_from_secs_f64(1.0 / config.requests_per_second).is_err() {
        return Err(ConfigError::Validation(format!(
            "requests-per-second is too small to schedule, got {}",
            config.requests_per_second
        )));
    }

    validate_worker_count("max-workers", config.max_workers)?;

    if config.queue_depth < 1 {
        return Err(ConfigError::Validation(
            "queue-depth must be >= 1".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.backoff_base_ms > config.backoff_max_ms {
        return Err(ConfigError::Validation(format!(
            "backoff-base-ms ({}) cannot exceed backoff-max-ms ({})",
            config.backoff_base_ms, config.backoff_max_ms
        )));
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch-size must be >= 1, got {}",
            config.batch_size
        )));
    }

    if config.progress_interval < 1 {
        return Err(ConfigError::Validation(
            "progress-interval must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.connect_attempts < 1 {
        return Err(ConfigError::Validation(
            "connect-attempts must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_category_config(config: &CategoryConfig) -> Result<(), ConfigError> {
    if let Some(path) = &config.cache_path {
        if path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "cache-path cannot be blank when set".to_string(),
            ));
        }
    }

    if config.cache_max_age_hours > MAX_CACHE_AGE_HOURS {
        return Err(ConfigError::Validation(format!(
            "cache-max-age-hours must be at most {}, got {}",
            MAX_CACHE_AGE_HOURS, config.cache_max_age_hours
        )));
    }

    Ok(())
}

fn validate_worker_count(name: &str, value: usize) -> Result<(), ConfigError> {
    if value < 1 || value > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and {}, got {}",
            name, MAX_WORKERS, value
        )));
    }
    Ok(())
}

/// Validates that a configured endpoint is an absolute HTTP(S) URL
fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            name, value
        )));
    }

    Ok(())
}
