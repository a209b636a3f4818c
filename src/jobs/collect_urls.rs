use crate::crawler::discover_all;
use crate::jobs::{JobArgs, JobContext, JobSummary};
use crate::model::DiscoveredUrl;
use crate::storage::upsert_batch;
use crate::{CrawlError, Result};
use chrono::Utc;
use std::sync::Arc;

const JOB_NAME: &str = "collect-urls";

/// Discovers listing URLs for one category and saves them in a single batch
///
/// An empty keyword list searches the whole category. Without a category
/// code the job does nothing and reports itself skipped. Either every
/// discovered URL is saved or, on a storage fault, none are.
pub async fn collect_urls(ctx: Arc<JobContext>, args: JobArgs) -> Result<JobSummary> {
    let category = match args
        .category_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        Some(code) => code.to_string(),
        None => {
            tracing::error!("No category code given, {} will not run", JOB_NAME);
            return Ok(JobSummary::Skipped {
                job: JOB_NAME,
                reason: "missing category code".to_string(),
            });
        }
    };

    let keywords = if args.keywords.is_empty() {
        vec![String::new()]
    } else {
        args.keywords
    };

    tracing::info!(
        "Collecting URLs for category {} with keywords {:?}",
        category,
        keywords
    );

    let config = &ctx.config;
    let urls = discover_all(&ctx.client, &config.site, &config.discovery, &category, &keywords)
        .await
        .map_err(|e| CrawlError::Config(crate::ConfigError::InvalidUrl(e.to_string())))?;

    if urls.is_empty() {
        tracing::warn!("No URLs discovered for category {}", category);
        return Ok(JobSummary::UrlsCollected {
            partitions: keywords.len(),
            urls_saved: 0,
        });
    }

    let now = Utc::now();
    let mut records: Vec<DiscoveredUrl> = urls
        .into_iter()
        .map(|url| DiscoveredUrl::new(url, config.site.source.as_str(), now))
        .collect();
    records.sort_by(|a, b| a.url.cmp(&b.url));

    ctx.with_storage(|storage| upsert_batch(storage, &records))
        .map_err(|e| {
            tracing::error!("Saving {} discovered URLs failed: {}", records.len(), e);
            e
        })?;

    Ok(JobSummary::UrlsCollected {
        partitions: keywords.len(),
        urls_saved: records.len(),
    })
}
