//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::model::{CategoryNode, DiscoveredUrl, JobRecord, UrlStatus};
use crate::storage::rows::Row;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Table {0} has no primary key")]
    MissingPrimaryKey(String),

    #[error("Unknown column {column} for table {table}")]
    UnknownColumn { table: String, column: String },

    #[error("Batch for {table} is missing key column {column}")]
    MissingKeyColumn { table: String, column: String },

    #[error("Rows in batch for {0} do not share the same columns")]
    HeterogeneousBatch(String),

    #[error("Corrupt value in {table}.{column}: {value}")]
    Corrupt {
        table: &'static str,
        column: &'static str,
        value: String,
    },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the pipeline.
pub trait Storage {
    // ===== Batch Writes =====

    /// Upserts a batch of rows into a declared table in one transaction
    ///
    /// On key conflict every updatable column takes the incoming value; a
    /// table with nothing updatable leaves conflicting rows untouched. An
    /// empty batch is a no-op.
    ///
    /// # Arguments
    ///
    /// * `table` - Target table name
    /// * `rows` - Rows sharing one column layout that includes the key
    ///
    /// # Returns
    ///
    /// The number of rows inserted or updated
    fn upsert_rows(&mut self, table: &str, rows: Vec<Row>) -> StorageResult<usize>;

    /// Sets the status of each listed URL; unknown URLs are ignored
    fn mark_urls(&mut self, urls: &[String], status: UrlStatus) -> StorageResult<usize>;

    // ===== Reads =====

    /// Gets the deduplicated set of URLs awaiting detail collection
    fn pending_urls(&self, source: &str) -> StorageResult<HashSet<String>>;

    /// Gets a job by identifier
    fn get_job(&self, job_id: &str) -> StorageResult<Option<JobRecord>>;

    /// Gets a discovered URL by its normalized form
    fn get_url(&self, url: &str) -> StorageResult<Option<DiscoveredUrl>>;

    /// Gets a category by code
    fn get_category(&self, code: &str) -> StorageResult<Option<CategoryNode>>;

    // ===== Statistics =====

    /// Counts rows in a declared table
    fn count_rows(&self, table: &str) -> StorageResult<u64>;

    /// Counts URLs grouped by status string
    fn count_urls_by_status(&self) -> StorageResult<HashMap<String, u64>>;
}
