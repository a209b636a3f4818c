//! Pipeline jobs
//!
//! Each job is a plain async function taking a shared `JobContext` and a
//! `JobArgs`, registered by name in a `JobRegistry`. Jobs report a
//! `JobSummary` and only fail outright on bad preconditions or a storage
//! fault.

mod collect_details;
mod collect_urls;
mod registry;
mod sync_categories;

pub use collect_details::collect_details;
pub use collect_urls::collect_urls;
pub use registry::{JobFuture, JobHandler, JobRegistry};
pub use sync_categories::sync_categories;

use crate::config::{Config, DiscoveryConfig};
use crate::crawler::build_http_client;
use crate::storage::{lock_storage, SharedStorage, SqliteStorage, StorageResult};
use reqwest::Client;
use std::fmt;
use std::sync::Arc;

/// Everything a job needs, built once per process
pub struct JobContext {
    pub config: Arc<Config>,
    pub client: Client,
    pub storage: SharedStorage,
}

impl JobContext {
    /// Builds the context, including the HTTP client
    pub fn new(config: Arc<Config>, storage: SharedStorage) -> crate::Result<Self> {
        let client = build_http_client(&config.site, config.fetcher.request_timeout())?;
        Ok(Self {
            config,
            client,
            storage,
        })
    }

    /// Runs `f` against the storage while holding the lock
    ///
    /// Kept synchronous so the guard can never live across an await point.
    pub fn with_storage<T>(
        &self,
        f: impl FnOnce(&mut SqliteStorage) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut guard = lock_storage(&self.storage)?;
        f(&mut guard)
    }
}

/// Arguments accepted by every job; jobs that take none ignore them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobArgs {
    pub category_code: Option<String>,
    pub keywords: Vec<String>,
}

impl JobArgs {
    /// Arguments as configured, before any command-line overrides
    pub fn from_config(discovery: &DiscoveryConfig) -> Self {
        Self {
            category_code: discovery.category_code.clone(),
            keywords: discovery.keywords.clone(),
        }
    }

    /// Replaces the category when `category` is set and the keywords when
    /// `keywords` is non-empty
    pub fn with_overrides(mut self, category: Option<String>, keywords: Vec<String>) -> Self {
        if category.is_some() {
            self.category_code = category;
        }
        if !keywords.is_empty() {
            self.keywords = keywords;
        }
        self
    }
}

/// Plain summary value a job hands back to its caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSummary {
    /// Precondition failed; nothing was done
    Skipped { job: &'static str, reason: String },

    UrlsCollected { partitions: usize, urls_saved: usize },

    DetailsCollected {
        attempted: usize,
        parsed: usize,
        unavailable: usize,
        rejected: usize,
        failed: usize,
        batches_flushed: usize,
    },

    CategoriesSynced { nodes: usize, from_cache: bool },
}

impl fmt::Display for JobSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped { job, reason } => write!(f, "{} skipped: {}", job, reason),
            Self::UrlsCollected {
                partitions,
                urls_saved,
            } => write!(
                f,
                "Collected {} unique URLs across {} partition(s)",
                urls_saved, partitions
            ),
            Self::DetailsCollected {
                attempted,
                parsed,
                unavailable,
                rejected,
                failed,
                batches_flushed,
            } => write!(
                f,
                "Attempted {} URLs, successfully parsed {} jobs \
                 ({} unavailable, {} rejected, {} failed, {} batches flushed)",
                attempted, parsed, unavailable, rejected, failed, batches_flushed
            ),
            Self::CategoriesSynced { nodes, from_cache } => write!(
                f,
                "Synced {} categories from {}",
                nodes,
                if *from_cache { "cache" } else { "network" }
            ),
        }
    }
}
