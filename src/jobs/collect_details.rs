use crate::crawler::{DetailFetcher, FetchOutcome};
use crate::jobs::{JobArgs, JobContext, JobSummary};
use crate::model::{JobRecord, UrlStatus};
use crate::storage::{upsert_batch, Storage, StorageResult};
use crate::Result;
use std::sync::Arc;

/// Fetches the detail record behind every pending URL and saves them in
/// fixed-size batches as they complete
///
/// Batches are flushed as soon as they fill, so a late storage failure loses
/// at most the batch in hand. Listings reported gone are marked expired at
/// the end so later runs skip them. Per-URL failures only show up in the
/// summary counts; a storage failure ends the job with an error.
pub async fn collect_details(ctx: Arc<JobContext>, _args: JobArgs) -> Result<JobSummary> {
    let config = &ctx.config;
    let source = config.site.source.as_str();

    let pending = ctx.with_storage(|storage| storage.pending_urls(source))?;
    if pending.is_empty() {
        tracing::info!("No pending URLs for source {}, nothing to do", source);
        return Ok(JobSummary::DetailsCollected {
            attempted: 0,
            parsed: 0,
            unavailable: 0,
            rejected: 0,
            failed: 0,
            batches_flushed: 0,
        });
    }

    let total = pending.len();
    let batch_size = config.fetcher.batch_size.max(1);
    let progress_interval = config.fetcher.progress_interval.max(1);
    tracing::info!(
        "Fetching details for {} URLs at up to {} req/s with {} workers",
        total,
        config.fetcher.requests_per_second,
        config.fetcher.max_workers
    );

    let fetcher = Arc::new(DetailFetcher::new(
        ctx.client.clone(),
        &config.site,
        &config.fetcher,
    ));
    let mut completed = fetcher.fetch_all(pending.into_iter().collect());

    let mut batch: Vec<JobRecord> = Vec::with_capacity(batch_size);
    let mut expired: Vec<String> = Vec::new();
    let (mut attempted, mut parsed, mut unavailable, mut rejected, mut failed) = (0, 0, 0, 0, 0);
    let mut batches_flushed = 0;

    while let Some(done) = completed.recv().await {
        attempted += 1;

        match done.outcome {
            FetchOutcome::Parsed(record) => {
                parsed += 1;
                batch.push(record);
            }
            FetchOutcome::Unavailable => {
                unavailable += 1;
                expired.push(done.url);
            }
            FetchOutcome::Rejected(e) => {
                rejected += 1;
                tracing::warn!("Rejected payload for {}: {}", done.url, e);
            }
            FetchOutcome::Failed(e) => {
                failed += 1;
                tracing::error!("Fetch failed permanently for {}: {}", done.url, e);
            }
        }

        if batch.len() >= batch_size {
            flush(&ctx, &mut batch)?;
            batches_flushed += 1;
        }

        if attempted % progress_interval == 0 {
            tracing::info!("Progress: {}/{} URLs attempted", attempted, total);
        }
    }

    if !batch.is_empty() {
        flush(&ctx, &mut batch)?;
        batches_flushed += 1;
    }

    if !expired.is_empty() {
        let marked = ctx.with_storage(|storage| storage.mark_urls(&expired, UrlStatus::Expired))?;
        tracing::info!("Marked {} unavailable URLs as expired", marked);
    }

    Ok(JobSummary::DetailsCollected {
        attempted,
        parsed,
        unavailable,
        rejected,
        failed,
        batches_flushed,
    })
}

/// Writes the batch in one transaction and clears it
fn flush(ctx: &JobContext, batch: &mut Vec<JobRecord>) -> StorageResult<()> {
    tracing::info!("Flushing a batch of {} jobs", batch.len());
    ctx.with_storage(|storage| upsert_batch(storage, &batch[..]))
        .map_err(|e| {
            tracing::error!("Batch write of {} jobs failed: {}", batch.len(), e);
            e
        })?;
    batch.clear();
    Ok(())
}
