use crate::jobs::{JobArgs, JobContext, JobSummary};
use crate::normalizer::{flatten_categories, RawCategory};
use crate::storage::upsert_batch;
use crate::{CrawlError, Result};
use chrono::Utc;
use reqwest::header::REFERER;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Refreshes the category taxonomy and replaces every stored node
///
/// With a cache path configured, a cache younger than the configured age is
/// used instead of the network. A network fetch rewrites the cache; if the
/// fetch fails, a stale cache is used rather than failing the job.
pub async fn sync_categories(ctx: Arc<JobContext>, _args: JobArgs) -> Result<JobSummary> {
    let config = &ctx.config;
    let cache = config.categories.cache_path.as_ref().map(PathBuf::from);
    let max_age_hours = config.categories.cache_max_age_hours;
    let max_age = Duration::from_secs(max_age_hours.saturating_mul(3600));

    let (roots, from_cache) = load_taxonomy(&ctx, cache.as_deref(), max_age).await?;

    let nodes = flatten_categories(&roots, &config.site.source, Utc::now());
    if nodes.is_empty() {
        tracing::warn!("Category taxonomy is empty, nothing to store");
        return Ok(JobSummary::CategoriesSynced {
            nodes: 0,
            from_cache,
        });
    }

    ctx.with_storage(|storage| upsert_batch(storage, &nodes))
        .map_err(|e| {
            tracing::error!("Saving {} categories failed: {}", nodes.len(), e);
            e
        })?;

    Ok(JobSummary::CategoriesSynced {
        nodes: nodes.len(),
        from_cache,
    })
}

/// Returns the raw taxonomy and whether it came from the cache
async fn load_taxonomy(
    ctx: &JobContext,
    cache: Option<&Path>,
    max_age: Duration,
) -> Result<(Vec<RawCategory>, bool)> {
    if let Some(path) = cache {
        if is_fresh(path, max_age).await {
            match read_cache(path).await {
                Ok(roots) => {
                    tracing::info!("Loaded categories from cache {}", path.display());
                    return Ok((roots, true));
                }
                Err(e) => tracing::warn!(
                    "Unreadable category cache {}: {}; fetching from network",
                    path.display(),
                    e
                ),
            }
        }
    }

    match fetch_taxonomy(ctx).await {
        Ok((roots, body)) => {
            if let Some(path) = cache {
                if let Err(e) = write_cache(path, &body).await {
                    tracing::warn!("Could not write category cache {}: {}", path.display(), e);
                }
            }
            Ok((roots, false))
        }
        Err(fetch_err) => {
            tracing::error!("Fetching categories failed: {}", fetch_err);
            let path = match cache {
                Some(path) if tokio::fs::try_exists(path).await.unwrap_or(false) => path,
                _ => return Err(fetch_err),
            };

            tracing::warn!("Falling back to stale category cache {}", path.display());
            let roots = read_cache(path).await?;
            Ok((roots, true))
        }
    }
}

async fn fetch_taxonomy(ctx: &JobContext) -> Result<(Vec<RawCategory>, Vec<u8>)> {
    let url = ctx.config.site.category_url.as_str();
    tracing::info!("Fetching categories from {}", url);

    let response = ctx
        .client
        .get(url)
        .header(REFERER, ctx.config.site.referer.as_str())
        .send()
        .await
        .map_err(|source| CrawlError::Http {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(CrawlError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await.map_err(|source| CrawlError::Http {
        url: url.to_string(),
        source,
    })?;
    let roots: Vec<RawCategory> = serde_json::from_slice(&body)?;
    Ok((roots, body.to_vec()))
}

async fn is_fresh(path: &Path, max_age: Duration) -> bool {
    let modified = match tokio::fs::metadata(path).await.and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(_) => return false,
    };
    SystemTime::now()
        .duration_since(modified)
        .map(|age| age < max_age)
        .unwrap_or(true)
}

async fn read_cache(path: &Path) -> Result<Vec<RawCategory>> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn write_cache(path: &Path, body: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, body).await
}
