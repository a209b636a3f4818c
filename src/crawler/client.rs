use crate::config::SiteConfig;
use reqwest::Client;
use std::time::Duration;

/// Builds the HTTP client shared by discovery, detail fetching and category sync
///
/// # Arguments
///
/// * `site` - Site identity (user agent)
/// * `timeout` - Whole-request timeout; exceeding it is a retryable failure
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(site: &SiteConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(site.user_agent.as_str())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}
