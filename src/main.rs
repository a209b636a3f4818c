//! Job-Crawler main entry point
//!
//! This is the command-line interface for the job-listing crawl pipeline.

use anyhow::{bail, Context};
use clap::Parser;
use job_crawler::config::{load_config_with_hash, Config};
use job_crawler::jobs::{JobArgs, JobContext, JobRegistry};
use job_crawler::storage::{close_shared_storage, open_shared_storage, SqliteStorage, Storage, TABLES};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Job-Crawler: a job-listing crawl-and-ingest pipeline
///
/// Discovers listing URLs from a paginated job search, fetches each
/// listing's detail record under a global rate cap, and upserts the
/// normalized records into SQLite.
#[derive(Parser, Debug)]
#[command(name = "job-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A job-listing crawl-and-ingest pipeline", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Job to run
    #[arg(short, long, default_value = "collect-urls")]
    job: String,

    /// Category code to search, overriding the config
    #[arg(short, long)]
    category: Option<String>,

    /// Search keyword, may be repeated; overrides the configured keywords
    #[arg(short, long = "keyword", value_name = "KEYWORD")]
    keywords: Vec<String>,

    /// List the registered jobs and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    list_jobs: bool,

    /// Validate config and show what would run without touching the network
    #[arg(long, conflicts_with_all = ["list_jobs", "stats"])]
    dry_run: bool,

    /// Show row counts from the database and exit
    #[arg(long, conflicts_with_all = ["list_jobs", "dry_run"])]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let registry = JobRegistry::with_default_jobs();
    if cli.list_jobs {
        for name in registry.names() {
            println!("{}", name);
        }
        return Ok(());
    }

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if !registry.contains(&cli.job) {
        bail!(
            "unknown job '{}', expected one of: {}",
            cli.job,
            registry.names().join(", ")
        );
    }

    let args = JobArgs::from_config(&config.discovery).with_overrides(cli.category, cli.keywords);

    if cli.dry_run {
        handle_dry_run(&config, &cli.job, &args);
        return Ok(());
    }
    if cli.stats {
        return handle_stats(&config);
    }

    handle_job(config, &registry, &cli.job, args).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("job_crawler=info,warn"),
            1 => EnvFilter::new("job_crawler=debug,info"),
            2 => EnvFilter::new("job_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the resolved settings for the job
fn handle_dry_run(config: &Config, job: &str, args: &JobArgs) {
    println!("=== Job-Crawler Dry Run ===\n");

    println!("Job: {}", job);
    println!(
        "  Category: {}",
        args.category_code.as_deref().unwrap_or("(none)")
    );
    if args.keywords.is_empty() {
        println!("  Keywords: (whole category)");
    } else {
        println!("  Keywords: {}", args.keywords.join(", "));
    }

    println!("\nSite ({}):", config.site.source);
    println!("  Search: {}", config.site.search_url);
    println!("  Detail API: {}", config.site.detail_api_url);
    println!("  Categories: {}", config.site.category_url);

    println!("\nDiscovery:");
    println!("  Max pages: {}", config.discovery.max_pages);
    println!("  Page workers: {}", config.discovery.page_workers);
    println!("  Partition workers: {}", config.discovery.partition_workers);

    println!("\nFetcher:");
    println!(
        "  Rate: {} req/s, {} workers, queue depth {}",
        config.fetcher.requests_per_second, config.fetcher.max_workers, config.fetcher.queue_depth
    );
    println!(
        "  Attempts: {} (backoff {}ms..{}ms)",
        config.fetcher.max_attempts, config.fetcher.backoff_base_ms, config.fetcher.backoff_max_ms
    );
    println!("  Batch size: {}", config.fetcher.batch_size);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows row counts from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = SqliteStorage::new(Path::new(&config.storage.database_path))
        .context("failed to open database")?;

    for table in TABLES {
        println!("  {:<12} {}", table.name, storage.count_rows(table.name)?);
    }

    let mut by_status: Vec<_> = storage.count_urls_by_status()?.into_iter().collect();
    by_status.sort();
    if !by_status.is_empty() {
        println!("\nURLs by status:");
        for (status, count) in by_status {
            println!("  {:<12} {}", status, count);
        }
    }

    storage.close()?;
    Ok(())
}

/// Handles a job run
async fn handle_job(
    config: Config,
    registry: &JobRegistry,
    job: &str,
    args: JobArgs,
) -> anyhow::Result<()> {
    let storage = open_shared_storage(
        Path::new(&config.storage.database_path),
        config.storage.connect_attempts,
        Duration::from_millis(config.storage.connect_retry_delay_ms),
    )
    .await
    .context("failed to open database")?;

    let ctx = Arc::new(
        JobContext::new(Arc::new(config), Arc::clone(&storage))
            .context("failed to build job context")?,
    );

    let result = registry.run(job, Arc::clone(&ctx), args).await;
    drop(ctx);

    match close_shared_storage(storage) {
        Ok(true) => tracing::debug!("Database closed"),
        Ok(false) => tracing::warn!("Database still in use at shutdown"),
        Err(e) => tracing::error!("Failed to close database: {}", e),
    }

    let summary = result.with_context(|| format!("job {} failed", job))?;
    println!("{}", summary);
    Ok(())
}
