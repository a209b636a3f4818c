//! Rate-limited detail fetcher
//!
//! This module handles detail API requests for the pipeline, including:
//! - Deriving the detail URL from a listing URL
//! - Global dispatch-side rate limiting
//! - Bounded in-flight concurrency
//! - Retry with backoff on transient failures
//! - Error classification
//!
//! Every URL resolves to a `FetchOutcome`; nothing a single URL does can fail
//! its siblings.
//!
//! The rate limiter gates the first request for each URL only. Retries run
//! inside the worker after their backoff delay and do not take a limiter slot.

use crate::config::{FetcherConfig, SiteConfig};
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::retry::{retry_with_backoff, RetryPolicy};
use crate::model::JobRecord;
use crate::normalizer::{normalize_job, ValidationError};
use crate::url::{detail_url_for, job_id_from_url};
use crate::UrlError;
use reqwest::header::REFERER;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};

/// Why a detail request did not produce a payload
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Invalid listing URL: {0}")]
    InvalidUrl(#[from] UrlError),
}

impl FetchError {
    /// Transient failures worth another attempt: 5xx, 429, timeouts and
    /// connection or transport errors
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status(code) => *code == 429 || (500..600).contains(code),
            Self::Timeout | Self::Connect(_) | Self::Network(_) => true,
            Self::Malformed(_) | Self::InvalidUrl(_) => false,
        }
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// What became of one listing URL
#[derive(Debug)]
pub enum FetchOutcome {
    /// Payload normalized into a record
    Parsed(JobRecord),
    /// Listing is gone upstream (404/410 or empty `data`)
    Unavailable,
    /// Payload arrived but failed validation
    Rejected(ValidationError),
    /// Request failed permanently or exhausted its retries
    Failed(FetchError),
}

/// A finished URL as delivered to the consumer
#[derive(Debug)]
pub struct CompletedFetch {
    pub url: String,
    pub outcome: FetchOutcome,
}

/// Fetches detail records for listing URLs under a global rate cap
pub struct DetailFetcher {
    client: Client,
    detail_api_url: String,
    limiter: RateLimiter,
    policy: RetryPolicy,
    max_workers: usize,
    queue_depth: usize,
}

impl DetailFetcher {
    pub fn new(client: Client, site: &SiteConfig, fetcher: &FetcherConfig) -> Self {
        Self {
            client,
            detail_api_url: site.detail_api_url.clone(),
            limiter: RateLimiter::per_second(fetcher.requests_per_second),
            policy: RetryPolicy::from_config(fetcher),
            max_workers: fetcher.max_workers.max(1),
            queue_depth: fetcher.queue_depth.max(1),
        }
    }

    /// Streams outcomes for `urls` in completion order
    ///
    /// A dispatcher task admits one URL per rate-limiter slot while fewer
    /// than `max-workers` are in flight. Completed outcomes are delivered
    /// through a channel of `queue-depth` capacity; a slow consumer holds
    /// workers and, through them, the dispatcher. Dropping the receiver
    /// stops further dispatch.
    pub fn fetch_all(self: Arc<Self>, urls: Vec<String>) -> mpsc::Receiver<CompletedFetch> {
        let (tx, rx) = mpsc::channel(self.queue_depth);
        let semaphore = Arc::new(Semaphore::new(self.max_workers));

        tokio::spawn(async move {
            for url in urls {
                let permit = match Arc::clone(&semaphore).acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => break,
                };
                if tx.is_closed() {
                    tracing::debug!("Result consumer gone, stopping dispatch");
                    break;
                }

                self.limiter.acquire().await;

                let fetcher = Arc::clone(&self);
                let tx = tx.clone();
                tokio::spawn(async move {
                    let outcome = fetcher.fetch_one(&url).await;
                    if tx.send(CompletedFetch { url, outcome }).await.is_err() {
                        tracing::debug!("Result consumer gone, dropping outcome");
                    }
                    drop(permit);
                });
            }
        });

        rx
    }

    /// Fetches and normalizes one listing
    pub async fn fetch_one(&self, listing_url: &str) -> FetchOutcome {
        let (detail_url, job_id) = match detail_url_for(&self.detail_api_url, listing_url)
            .and_then(|detail| Ok((detail, job_id_from_url(listing_url)?)))
        {
            Ok(pair) => pair,
            Err(e) => return FetchOutcome::Failed(e.into()),
        };

        let envelope = retry_with_backoff(
            &self.policy,
            listing_url,
            FetchError::is_retryable,
            || self.request_detail(&detail_url, listing_url),
        )
        .await;

        match envelope {
            Ok(Some(data)) => match normalize_job(&data, &job_id) {
                Ok(record) => FetchOutcome::Parsed(record),
                Err(e) => FetchOutcome::Rejected(e),
            },
            Ok(None) => {
                tracing::debug!("Listing {} is no longer available", listing_url);
                FetchOutcome::Unavailable
            }
            Err(e) => FetchOutcome::Failed(e),
        }
    }

    /// One attempt at the detail API; `Ok(None)` means the listing is gone
    async fn request_detail(
        &self,
        detail_url: &str,
        listing_url: &str,
    ) -> Result<Option<Value>, FetchError> {
        let response = self
            .client
            .get(detail_url)
            .header(REFERER, listing_url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(FetchError::from_reqwest)?;
        let envelope: Value =
            serde_json::from_slice(&body).map_err(|e| FetchError::Malformed(e.to_string()))?;

        Ok(envelope_data(envelope))
    }
}

/// Pulls the `data` member out of a detail envelope; absent or empty means
/// the listing is gone
fn envelope_data(mut envelope: Value) -> Option<Value> {
    let data = envelope.get_mut("data")?.take();
    let empty = match &data {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    };
    if empty {
        None
    } else {
        Some(data)
    }
}
