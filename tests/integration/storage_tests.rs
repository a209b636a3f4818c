//! Integration tests for file-backed storage

use chrono::{NaiveDate, Utc};
use job_crawler::storage::{
    close_shared_storage, lock_storage, open_shared_storage, upsert_batch, SqliteStorage, Storage,
};
use job_crawler::{CategoryNode, DiscoveredUrl, JobRecord, UrlStatus};
use std::time::Duration;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
}

#[test]
fn test_upsert_is_idempotent_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("jobs.db");

    let mut first = JobRecord::new("7xk2p", "Backend Engineer", "C1", day());
    first.salary_min = Some(50000);
    first.location = Some("Taipei".to_string());

    {
        let mut storage = SqliteStorage::new(&db).unwrap();
        upsert_batch(&mut storage, &[first.clone()]).unwrap();
        upsert_batch(&mut storage, &[first.clone()]).unwrap();
        assert_eq!(storage.count_rows("jobs").unwrap(), 1);
        storage.close().unwrap();
    }

    let mut updated = first.clone();
    updated.title = "Senior Backend Engineer".to_string();
    updated.salary_min = None;

    let mut storage = SqliteStorage::new(&db).unwrap();
    upsert_batch(&mut storage, &[updated.clone()]).unwrap();

    assert_eq!(storage.count_rows("jobs").unwrap(), 1);
    let saved = storage.get_job("7xk2p").unwrap().unwrap();
    assert_eq!(saved, updated);
}

#[test]
fn test_rediscovered_url_keeps_first_seen_and_status() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = SqliteStorage::new(&dir.path().join("urls.db")).unwrap();

    let url = "https://www.104.com.tw/job/7xk2p";
    let first_seen = Utc::now() - chrono::Duration::days(3);
    upsert_batch(&mut storage, &[DiscoveredUrl::new(url, "104", first_seen)]).unwrap();
    storage
        .mark_urls(&[url.to_string()], UrlStatus::Expired)
        .unwrap();

    let seen_again = Utc::now();
    upsert_batch(&mut storage, &[DiscoveredUrl::new(url, "104", seen_again)]).unwrap();

    let saved = storage.get_url(url).unwrap().unwrap();
    assert_eq!(saved.first_seen.timestamp(), first_seen.timestamp());
    assert_eq!(saved.last_seen.timestamp(), seen_again.timestamp());
    assert_eq!(saved.status, UrlStatus::Expired);
    assert!(storage.pending_urls("104").unwrap().is_empty());
}

#[test]
fn test_category_rows_are_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = SqliteStorage::new(&dir.path().join("cats.db")).unwrap();
    let now = Utc::now();

    let node = CategoryNode {
        code: "2007001004".to_string(),
        name: "Backend Engineer".to_string(),
        parent_code: Some("2007000000".to_string()),
        parent_name: Some("Software".to_string()),
        source: "104".to_string(),
        created_at: now,
        updated_at: now,
    };
    upsert_batch(&mut storage, &[node.clone()]).unwrap();

    let renamed = CategoryNode {
        name: "Server-side Engineer".to_string(),
        ..node
    };
    upsert_batch(&mut storage, &[renamed]).unwrap();

    assert_eq!(storage.count_rows("categories").unwrap(), 1);
    let saved = storage.get_category("2007001004").unwrap().unwrap();
    assert_eq!(saved.name, "Server-side Engineer");
    assert_eq!(saved.parent_name.as_deref(), Some("Software"));
}

#[tokio::test]
async fn test_shared_storage_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("shared.db");

    let shared = open_shared_storage(&db, 2, Duration::from_millis(10))
        .await
        .unwrap();
    {
        let mut guard = lock_storage(&shared).unwrap();
        upsert_batch(
            &mut *guard,
            &[DiscoveredUrl::new("https://www.104.com.tw/job/a", "104", Utc::now())],
        )
        .unwrap();
    }
    assert!(close_shared_storage(shared).unwrap());

    let storage = SqliteStorage::new(&db).unwrap();
    let by_status = storage.count_urls_by_status().unwrap();
    assert_eq!(by_status.get("new"), Some(&1));
}
