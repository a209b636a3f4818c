use crate::jobs::{collect_details, collect_urls, sync_categories, JobArgs, JobContext, JobSummary};
use crate::{CrawlError, Result};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub type JobFuture = Pin<Box<dyn Future<Output = Result<JobSummary>> + Send>>;

/// Entry point signature every registered job shares
pub type JobHandler = fn(Arc<JobContext>, JobArgs) -> JobFuture;

fn run_collect_urls(ctx: Arc<JobContext>, args: JobArgs) -> JobFuture {
    Box::pin(collect_urls(ctx, args))
}

fn run_collect_details(ctx: Arc<JobContext>, args: JobArgs) -> JobFuture {
    Box::pin(collect_details(ctx, args))
}

fn run_sync_categories(ctx: Arc<JobContext>, args: JobArgs) -> JobFuture {
    Box::pin(sync_categories(ctx, args))
}

/// Dispatch table from job name to handler
#[derive(Default)]
pub struct JobRegistry {
    handlers: BTreeMap<&'static str, JobHandler>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every job this crate ships
    pub fn with_default_jobs() -> Self {
        let mut registry = Self::new();
        registry.register("collect-urls", run_collect_urls);
        registry.register("collect-details", run_collect_details);
        registry.register("sync-categories", run_sync_categories);
        registry
    }

    /// Adds or replaces a handler
    pub fn register(&mut self, name: &'static str, handler: JobHandler) {
        self.handlers.insert(name, handler);
    }

    /// Registered job names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.keys().copied().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Runs a job to completion and returns its summary
    pub async fn run(&self, name: &str, ctx: Arc<JobContext>, args: JobArgs) -> Result<JobSummary> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| CrawlError::UnknownJob(name.to_string()))?;

        tracing::info!("Starting job {}", name);
        let summary = handler(ctx, args).await?;
        tracing::info!("Job {} finished: {}", name, summary);
        Ok(summary)
    }

    /// Starts a job in the background; the outcome is logged whether or not
    /// anyone awaits the handle
    pub fn spawn(
        &self,
        name: &str,
        ctx: Arc<JobContext>,
        args: JobArgs,
    ) -> Result<JoinHandle<Option<JobSummary>>> {
        let handler = *self
            .handlers
            .get(name)
            .ok_or_else(|| CrawlError::UnknownJob(name.to_string()))?;
        let name = name.to_string();

        Ok(tokio::spawn(async move {
            match handler(ctx, args).await {
                Ok(summary) => {
                    tracing::info!("Job {} finished: {}", name, summary);
                    Some(summary)
                }
                Err(e) => {
                    tracing::error!("Job {} failed: {}", name, e);
                    None
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::storage::SqliteStorage;
    use std::sync::Mutex;

    fn context() -> Arc<JobContext> {
        let config = parse_config(
            r#"
[site]
source = "104"
search-url = "http://127.0.0.1:9/jobs/search/"
detail-api-url = "http://127.0.0.1:9/job/ajax/content/"
category-url = "http://127.0.0.1:9/JobCat.json"
referer = "http://127.0.0.1:9/jobs/search"
user-agent = "test"

[storage]
database-path = ":memory:"
"#,
        )
        .unwrap();
        let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
        Arc::new(JobContext::new(Arc::new(config), storage).unwrap())
    }

    fn echo(_ctx: Arc<JobContext>, args: JobArgs) -> JobFuture {
        Box::pin(async move {
            Ok(JobSummary::UrlsCollected {
                partitions: args.keywords.len(),
                urls_saved: 0,
            })
        })
    }

    #[test]
    fn test_default_job_names() {
        let registry = JobRegistry::with_default_jobs();
        assert_eq!(
            registry.names(),
            vec!["collect-details", "collect-urls", "sync-categories"]
        );
    }

    #[tokio::test]
    async fn test_unknown_job_is_error() {
        let registry = JobRegistry::with_default_jobs();
        let result = registry.run("reindex", context(), JobArgs::default()).await;
        assert!(matches!(result, Err(CrawlError::UnknownJob(name)) if name == "reindex"));
    }

    #[tokio::test]
    async fn test_run_registered_handler() {
        let mut registry = JobRegistry::new();
        registry.register("echo", echo);

        let args = JobArgs {
            category_code: None,
            keywords: vec!["a".into(), "b".into()],
        };
        let summary = registry.run("echo", context(), args).await.unwrap();
        assert_eq!(
            summary,
            JobSummary::UrlsCollected {
                partitions: 2,
                urls_saved: 0
            }
        );
    }

    #[tokio::test]
    async fn test_spawned_job_reports_through_handle() {
        let mut registry = JobRegistry::new();
        registry.register("echo", echo);

        let handle = registry
            .spawn("echo", context(), JobArgs::default())
            .unwrap();
        assert!(handle.await.unwrap().is_some());

        assert!(registry.spawn("missing", context(), JobArgs::default()).is_err());
    }

    #[tokio::test]
    async fn test_missing_category_is_skipped() {
        let registry = JobRegistry::with_default_jobs();
        let summary = registry
            .run("collect-urls", context(), JobArgs::default())
            .await
            .unwrap();
        assert!(matches!(summary, JobSummary::Skipped { job: "collect-urls", .. }));
    }
}
