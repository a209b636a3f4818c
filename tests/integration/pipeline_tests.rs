//! Integration tests for the pipeline jobs
//!
//! These tests use wiremock to stand in for the search pages, the detail API
//! and the category taxonomy, and run each job end-to-end against an
//! in-memory database.

use chrono::Utc;
use job_crawler::config::parse_config;
use job_crawler::jobs::{collect_details, collect_urls, sync_categories, JobArgs, JobContext};
use job_crawler::storage::{upsert_batch, SharedStorage, SqliteStorage, Storage};
use job_crawler::{DiscoveredUrl, JobSummary, UrlStatus};
use serde_json::json;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a job context pointed at the mock server
///
/// `extra` is appended to the config so tests can add sections.
fn create_context(base_url: &str, extra: &str) -> (Arc<JobContext>, SharedStorage) {
    create_context_with_discovery(base_url, "", extra)
}

/// Same as `create_context`, with extra keys for the `[discovery]` section
fn create_context_with_discovery(
    base_url: &str,
    discovery: &str,
    extra: &str,
) -> (Arc<JobContext>, SharedStorage) {
    let toml = format!(
        r#"
[site]
source = "104"
search-url = "{base}/jobs/search/"
detail-api-url = "{base}/job/ajax/content/"
category-url = "{base}/JobCat.json"
referer = "{base}/jobs/search"
user-agent = "TestBot/1.0"

[discovery]
page-workers = 3
partition-workers = 2
{discovery}

[fetcher]
requests-per-second = 50.0
max-workers = 4
max-attempts = 2
backoff-base-ms = 10
backoff-max-ms = 20
batch-size = 2
progress-interval = 1

[storage]
database-path = ":memory:"
{extra}
"#,
        base = base_url,
        discovery = discovery,
        extra = extra
    );

    let config = parse_config(&toml).expect("test config should be valid");
    let storage: SharedStorage = Arc::new(Mutex::new(
        SqliteStorage::new_in_memory().expect("in-memory database"),
    ));
    let ctx = JobContext::new(Arc::new(config), Arc::clone(&storage)).expect("job context");
    (Arc::new(ctx), storage)
}

fn card(href: &str) -> String {
    format!(
        r#"<article class="job-list-item"><div class="job-summary"><a class="info-job__text" href="{}">Job</a></div></article>"#,
        href
    )
}

fn search_page(hrefs: &[&str], pages: &[u32]) -> String {
    let cards: String = hrefs.iter().map(|href| card(href)).collect();
    let paging: String = pages
        .iter()
        .map(|p| format!(r#"<a class="paging__link">{}</a>"#, p))
        .collect();
    format!(
        "<html><body><main>{}</main><nav>{}</nav></body></html>",
        cards, paging
    )
}

fn detail_payload(title: &str) -> serde_json::Value {
    json!({
        "data": {
            "header": {"jobName": title, "appearDate": "2025/03/01"},
            "custNo": "C100",
            "jobDetail": {"salaryMin": 40000, "salaryMax": 60000}
        }
    })
}

fn category_args() -> JobArgs {
    JobArgs {
        category_code: Some("2007000000".to_string()),
        keywords: Vec::new(),
    }
}

fn seed_urls(storage: &SharedStorage, urls: &[String]) {
    let records: Vec<DiscoveredUrl> = urls
        .iter()
        .map(|url| DiscoveredUrl::new(url.as_str(), "104", Utc::now()))
        .collect();
    let mut guard = storage.lock().unwrap();
    upsert_batch(&mut *guard, &records).unwrap();
}

#[tokio::test]
async fn test_collect_urls_unions_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/jobs/search/"))
        .and(query_param("page", "1"))
        .and(query_param("jobcat", "2007000000"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_page(
            &["/job/aaa?jobsource=jolist_a", "/job/bbb"],
            &[1, 2, 3],
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/jobs/search/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_page(
            &["/job/bbb?jobsource=jolist_b", "/job/ccc"],
            &[1, 2, 3],
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/jobs/search/"))
        .and(query_param("page", "3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(search_page(&["/job/ddd#apply"], &[1, 2, 3])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let (ctx, storage) = create_context(&base_url, "");
    let summary = collect_urls(ctx, category_args()).await.unwrap();

    assert_eq!(
        summary,
        JobSummary::UrlsCollected {
            partitions: 1,
            urls_saved: 4
        }
    );

    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_rows("urls").unwrap(), 4);

    for id in ["aaa", "bbb", "ccc", "ddd"] {
        let url = format!("{}/job/{}", base_url, id);
        let saved = storage.get_url(&url).unwrap().expect("url should be saved");
        assert_eq!(saved.source, "104");
        assert_eq!(saved.status, UrlStatus::New);
    }
}

#[tokio::test]
async fn test_collect_urls_survives_failed_page_and_respects_cap() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let markers: Vec<u32> = (1..=9).collect();

    Mock::given(method("GET"))
        .and(path("/jobs/search/"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(search_page(&["/job/aaa"], &markers)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/jobs/search/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/jobs/search/"))
        .and(query_param("page", "3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(search_page(&["/job/ccc"], &markers)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/jobs/search/"))
        .and(query_param("page", "4"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(search_page(&["/job/ddd"], &markers)),
        )
        .expect(0)
        .mount(&mock_server)
        .await;

    let (ctx, storage) = create_context_with_discovery(&base_url, "max-pages = 3", "");
    let summary = collect_urls(ctx, category_args()).await.unwrap();

    assert_eq!(
        summary,
        JobSummary::UrlsCollected {
            partitions: 1,
            urls_saved: 2
        }
    );

    let storage = storage.lock().unwrap();
    assert!(storage
        .get_url(&format!("{}/job/aaa", base_url))
        .unwrap()
        .is_some());
    assert!(storage
        .get_url(&format!("{}/job/ccc", base_url))
        .unwrap()
        .is_some());
    assert!(storage
        .get_url(&format!("{}/job/ddd", base_url))
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_collect_urls_empty_first_page_stops() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jobs/search/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_page(&[], &[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (ctx, storage) = create_context(&mock_server.uri(), "");
    let summary = collect_urls(ctx, category_args()).await.unwrap();

    assert_eq!(
        summary,
        JobSummary::UrlsCollected {
            partitions: 1,
            urls_saved: 0
        }
    );
    assert_eq!(storage.lock().unwrap().count_rows("urls").unwrap(), 0);
}

#[tokio::test]
async fn test_collect_urls_one_partition_per_keyword() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jobs/search/"))
        .and(query_param("keyword", "rust"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(search_page(&["/job/r1", "/job/shared"], &[])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/jobs/search/"))
        .and(query_param("keyword", "go"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(search_page(&["/job/g1", "/job/shared"], &[])),
        )
        .mount(&mock_server)
        .await;

    let (ctx, _storage) = create_context(&mock_server.uri(), "");
    let args = JobArgs {
        category_code: Some("2007000000".to_string()),
        keywords: vec!["rust".to_string(), "go".to_string()],
    };
    let summary = collect_urls(ctx, args).await.unwrap();

    assert_eq!(
        summary,
        JobSummary::UrlsCollected {
            partitions: 2,
            urls_saved: 3
        }
    );
}

#[tokio::test]
async fn test_collect_urls_without_category_is_skipped() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (ctx, _storage) = create_context(&mock_server.uri(), "");
    let args = JobArgs {
        category_code: Some("  ".to_string()),
        keywords: vec!["rust".to_string()],
    };
    let summary = collect_urls(ctx, args).await.unwrap();

    assert!(matches!(
        summary,
        JobSummary::Skipped {
            job: "collect-urls",
            ..
        }
    ));
}

#[tokio::test]
async fn test_collect_details_isolates_failures() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/job/ajax/content/aaa"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail_payload("Engineer A")))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/job/ajax/content/bbb"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/job/ajax/content/ccc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail_payload("Engineer C")))
        .mount(&mock_server)
        .await;

    let (ctx, storage) = create_context(&base_url, "");
    let urls: Vec<String> = ["aaa", "bbb", "ccc"]
        .iter()
        .map(|id| format!("{}/job/{}", base_url, id))
        .collect();
    seed_urls(&storage, &urls);

    let summary = collect_details(ctx, JobArgs::default()).await.unwrap();

    assert_eq!(
        summary,
        JobSummary::DetailsCollected {
            attempted: 3,
            parsed: 2,
            unavailable: 0,
            rejected: 0,
            failed: 1,
            batches_flushed: 1
        }
    );
    assert!(summary
        .to_string()
        .starts_with("Attempted 3 URLs, successfully parsed 2 jobs"));

    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_rows("jobs").unwrap(), 2);

    let job = storage.get_job("aaa").unwrap().expect("job aaa saved");
    assert_eq!(job.title, "Engineer A");
    assert_eq!(job.company_id, "C100");
    assert_eq!(job.salary_min, Some(40000));
    assert!(storage.get_job("bbb").unwrap().is_none());
}

#[tokio::test]
async fn test_collect_details_expires_empty_listings() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/job/ajax/content/live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail_payload("Still Open")))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/job/ajax/content/closed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/job/ajax/content/removed"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (ctx, storage) = create_context(&base_url, "");
    let live = format!("{}/job/live", base_url);
    let closed = format!("{}/job/closed", base_url);
    let removed = format!("{}/job/removed", base_url);
    seed_urls(&storage, &[live.clone(), closed.clone(), removed.clone()]);

    let summary = collect_details(ctx, JobArgs::default()).await.unwrap();
    assert!(matches!(
        summary,
        JobSummary::DetailsCollected {
            attempted: 3,
            parsed: 1,
            unavailable: 2,
            ..
        }
    ));

    let storage = storage.lock().unwrap();
    assert_eq!(
        storage.get_url(&closed).unwrap().unwrap().status,
        UrlStatus::Expired
    );
    assert_eq!(
        storage.get_url(&removed).unwrap().unwrap().status,
        UrlStatus::Expired
    );

    let pending = storage.pending_urls("104").unwrap();
    assert_eq!(pending.len(), 1);
    assert!(pending.contains(&live));
}

#[tokio::test]
async fn test_collect_details_rejects_incomplete_payload() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/job/ajax/content/notitle"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"custNo": "C1", "header": {}}})),
        )
        .mount(&mock_server)
        .await;

    let (ctx, storage) = create_context(&base_url, "");
    seed_urls(&storage, &[format!("{}/job/notitle", base_url)]);

    let summary = collect_details(ctx, JobArgs::default()).await.unwrap();
    assert!(matches!(
        summary,
        JobSummary::DetailsCollected {
            attempted: 1,
            parsed: 0,
            rejected: 1,
            batches_flushed: 0,
            ..
        }
    ));
    assert_eq!(storage.lock().unwrap().count_rows("jobs").unwrap(), 0);
}

#[tokio::test]
async fn test_collect_details_with_nothing_pending() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (ctx, _storage) = create_context(&mock_server.uri(), "");
    let summary = collect_details(ctx, JobArgs::default()).await.unwrap();
    assert!(matches!(
        summary,
        JobSummary::DetailsCollected { attempted: 0, .. }
    ));
}

fn taxonomy() -> serde_json::Value {
    json!([
        {
            "no": "2000000000",
            "des": "IT",
            "n": [
                {"no": "2007000000", "des": "Software", "n": [
                    {"no": "2007001004", "des": "Backend Engineer"}
                ]}
            ]
        }
    ])
}

#[tokio::test]
async fn test_sync_categories_from_network_writes_cache() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/JobCat.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(taxonomy()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("categories.json");
    let extra = format!(
        "\n[categories]\ncache-path = \"{}\"\n",
        cache.display()
    );
    let (ctx, storage) = create_context(&mock_server.uri(), &extra);

    let summary = sync_categories(Arc::clone(&ctx), JobArgs::default())
        .await
        .unwrap();
    assert_eq!(
        summary,
        JobSummary::CategoriesSynced {
            nodes: 3,
            from_cache: false
        }
    );
    assert!(cache.exists());

    {
        let storage = storage.lock().unwrap();
        let leaf = storage.get_category("2007001004").unwrap().unwrap();
        assert_eq!(leaf.parent_code.as_deref(), Some("2007000000"));
        assert_eq!(leaf.parent_name.as_deref(), Some("Software"));
        assert!(storage.get_category("2000000000").unwrap().unwrap().parent_code.is_none());
    }

    // A fresh cache is used without another request
    let summary = sync_categories(ctx, JobArgs::default()).await.unwrap();
    assert_eq!(
        summary,
        JobSummary::CategoriesSynced {
            nodes: 3,
            from_cache: true
        }
    );
}

#[tokio::test]
async fn test_sync_categories_falls_back_to_stale_cache() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/JobCat.json"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("categories.json");
    std::fs::write(&cache, taxonomy().to_string()).unwrap();

    let extra = format!(
        "\n[categories]\ncache-path = \"{}\"\ncache-max-age-hours = 0\n",
        cache.display()
    );
    let (ctx, storage) = create_context(&mock_server.uri(), &extra);

    let summary = sync_categories(ctx, JobArgs::default()).await.unwrap();
    assert_eq!(
        summary,
        JobSummary::CategoriesSynced {
            nodes: 3,
            from_cache: true
        }
    );
    assert_eq!(storage.lock().unwrap().count_rows("categories").unwrap(), 3);
}

#[tokio::test]
async fn test_sync_categories_without_cache_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/JobCat.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let (ctx, storage) = create_context(&mock_server.uri(), "");
    let result = sync_categories(ctx, JobArgs::default()).await;

    assert!(matches!(
        result,
        Err(job_crawler::CrawlError::Status { status: 500, .. })
    ));
    assert_eq!(storage.lock().unwrap().count_rows("categories").unwrap(), 0);
}
