//! Storage module for persisting pipeline output
//!
//! This module handles all database operations for the pipeline, including:
//! - SQLite database initialization and schema management
//! - Transactional batch upserts keyed by each table's natural key
//! - Pending URL lookup and URL status transitions
//! - Row counts for reporting

mod rows;
mod schema;
mod sqlite;
mod traits;

pub use rows::{sanitize, upsert_batch, Record, Row};
pub use schema::{table_spec, TableSpec, TABLES};
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Storage handle shared by every job in the process
pub type SharedStorage = Arc<Mutex<SqliteStorage>>;

/// Opens the database with retry and wraps it for sharing
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
/// * `attempts` - Connection attempts before giving up
/// * `delay` - Pause between attempts
pub async fn open_shared_storage(
    path: &Path,
    attempts: u32,
    delay: Duration,
) -> StorageResult<SharedStorage> {
    let storage = SqliteStorage::open_with_retry(path, attempts, delay).await?;
    Ok(Arc::new(Mutex::new(storage)))
}

/// Locks the shared handle, mapping a poisoned lock to a storage error
pub fn lock_storage(storage: &SharedStorage) -> StorageResult<MutexGuard<'_, SqliteStorage>> {
    storage.lock().map_err(|_| StorageError::LockPoisoned)
}

/// Closes the shared handle once no other owner remains
///
/// Returns `Ok(false)` when another clone is still alive and the connection
/// was left open.
pub fn close_shared_storage(storage: SharedStorage) -> StorageResult<bool> {
    match Arc::try_unwrap(storage) {
        Ok(mutex) => {
            let inner = mutex.into_inner().map_err(|_| StorageError::LockPoisoned)?;
            inner.close()?;
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}
