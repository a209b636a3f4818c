//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::model::{CategoryNode, DiscoveredUrl, JobRecord, UrlStatus};
use crate::storage::rows::{sanitize, Row, DATE_FORMAT};
use crate::storage::schema::{initialize_schema, table_spec, TableSpec};
use crate::storage::traits::{Storage, StorageError, StorageResult};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Opens the database, retrying a fixed number of times before giving up
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `attempts` - Total attempts, at least one is always made
    /// * `delay` - Pause between attempts
    pub async fn open_with_retry(
        path: &Path,
        attempts: u32,
        delay: Duration,
    ) -> StorageResult<Self> {
        let attempts = attempts.max(1);
        let mut attempt = 1;

        loop {
            match Self::new(path) {
                Ok(storage) => {
                    tracing::info!("Opened database {}", path.display());
                    return Ok(storage);
                }
                Err(e) if attempt < attempts => {
                    tracing::warn!(
                        "Failed to open database {} (attempt {}/{}): {}; retrying in {:?}",
                        path.display(),
                        attempt,
                        attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        "Giving up on database {} after {} attempts: {}",
                        path.display(),
                        attempts,
                        e
                    );
                    return Err(e);
                }
            }
        }
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Closes the underlying connection, surfacing any error SQLite reports
    pub fn close(self) -> StorageResult<()> {
        self.conn.close().map_err(|(_, e)| StorageError::Sqlite(e))
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Validates a batch against the table metadata and returns its column layout
fn check_batch(spec: &TableSpec, rows: &[Row]) -> StorageResult<Vec<&'static str>> {
    if spec.primary_key.is_empty() {
        return Err(StorageError::MissingPrimaryKey(spec.name.to_string()));
    }

    let columns: Vec<&'static str> = rows
        .first()
        .map(|row| row.iter().map(|(c, _)| *c).collect())
        .unwrap_or_default();

    if let Some(unknown) = columns.iter().find(|c| !spec.has_column(c)) {
        return Err(StorageError::UnknownColumn {
            table: spec.name.to_string(),
            column: unknown.to_string(),
        });
    }

    if let Some(missing) = spec.primary_key.iter().find(|k| !columns.contains(k)) {
        return Err(StorageError::MissingKeyColumn {
            table: spec.name.to_string(),
            column: missing.to_string(),
        });
    }

    let homogeneous = rows.iter().all(|row| {
        row.len() == columns.len() && row.iter().zip(&columns).all(|((c, _), e)| c == e)
    });
    if !homogeneous {
        return Err(StorageError::HeterogeneousBatch(spec.name.to_string()));
    }

    Ok(columns)
}

/// Builds the `INSERT ... ON CONFLICT` statement for a column layout
///
/// Conflicting rows take every updatable incoming column; with none left to
/// update the statement degrades to insert-if-absent.
pub(crate) fn build_upsert_sql(spec: &TableSpec, columns: &[&str]) -> String {
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");

    let updates = columns
        .iter()
        .filter(|c| spec.is_updatable(c))
        .map(|c| format!("{c} = excluded.{c}"))
        .collect::<Vec<_>>();

    let action = if updates.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", updates.join(", "))
    };

    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}) {}",
        spec.name,
        columns.join(", "),
        placeholders,
        spec.primary_key.join(", "),
        action
    )
}

fn corrupt(table: &'static str, column: &'static str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(StorageError::Corrupt {
            table,
            column,
            value: value.to_string(),
        }),
    )
}

fn parse_date(
    table: &'static str,
    column: &'static str,
    value: Option<String>,
) -> rusqlite::Result<Option<NaiveDate>> {
    value
        .map(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|_| corrupt(table, column, &s)))
        .transpose()
}

fn parse_timestamp(
    table: &'static str,
    column: &'static str,
    value: Option<String>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|_| corrupt(table, column, &s))
        })
        .transpose()
}

fn required_timestamp(
    table: &'static str,
    column: &'static str,
    value: String,
) -> rusqlite::Result<DateTime<Utc>> {
    parse_timestamp(table, column, Some(value))?.ok_or_else(|| corrupt(table, column, ""))
}

impl Storage for SqliteStorage {
    // ===== Batch Writes =====

    fn upsert_rows(&mut self, table: &str, rows: Vec<Row>) -> StorageResult<usize> {
        if rows.is_empty() {
            tracing::debug!("Empty batch for {}, nothing to write", table);
            return Ok(0);
        }

        let spec = table_spec(table).ok_or_else(|| StorageError::UnknownTable(table.to_string()))?;
        let columns = check_batch(spec, &rows)?;
        let sql = build_upsert_sql(spec, &columns);
        let batch_len = rows.len();

        // Dropping the transaction without commit rolls the whole batch back
        let tx = self.conn.transaction()?;
        let mut affected = 0;
        {
            let mut stmt = tx.prepare_cached(&sql)?;
            for row in rows {
                let values = row.into_iter().map(|(_, v)| sanitize(v));
                affected += stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;

        tracing::info!("Upserted {} rows into {} ({} changed)", batch_len, table, affected);
        Ok(affected)
    }

    fn mark_urls(&mut self, urls: &[String], status: UrlStatus) -> StorageResult<usize> {
        if urls.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        let mut affected = 0;
        {
            let mut stmt = tx.prepare_cached("UPDATE urls SET status = ?1 WHERE url = ?2")?;
            for url in urls {
                affected += stmt.execute(params![status.to_db_string(), url])?;
            }
        }
        tx.commit()?;

        Ok(affected)
    }

    // ===== Reads =====

    fn pending_urls(&self, source: &str) -> StorageResult<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url FROM urls WHERE source = ?1 AND status = ?2")?;

        let urls = stmt
            .query_map(params![source, UrlStatus::New.to_db_string()], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<Result<HashSet<_>, _>>()?;

        tracing::info!("Loaded {} pending URLs for source {}", urls.len(), source);
        Ok(urls)
    }

    fn get_job(&self, job_id: &str) -> StorageResult<Option<JobRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT job_id, title, description, posted_date, salary, salary_min, salary_max,
                    salary_type, work_time, work_type, need_employees, location, company_address,
                    longitude, latitude, degree, working_experience, department,
                    qualification_required, qualification_bonus, qualification_other, company_id,
                    company_name, industry, employees, remote_work_type, remote_work_description,
                    job_category, contact_person, contact_phone, last_processed_resume_at,
                    snapshot_at, synced_on
             FROM jobs WHERE job_id = ?1",
        )?;

        let job = stmt
            .query_row(params![job_id], |row| {
                let synced_on: String = row.get(32)?;
                Ok(JobRecord {
                    job_id: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                    posted_date: parse_date("jobs", "posted_date", row.get(3)?)?,
                    salary: row.get(4)?,
                    salary_min: row.get(5)?,
                    salary_max: row.get(6)?,
                    salary_type: row.get(7)?,
                    work_time: row.get(8)?,
                    work_type: row.get(9)?,
                    need_employees: row.get(10)?,
                    location: row.get(11)?,
                    company_address: row.get(12)?,
                    longitude: row.get(13)?,
                    latitude: row.get(14)?,
                    degree: row.get(15)?,
                    working_experience: row.get(16)?,
                    department: row.get(17)?,
                    qualification_required: row.get(18)?,
                    qualification_bonus: row.get(19)?,
                    qualification_other: row.get(20)?,
                    company_id: row.get(21)?,
                    company_name: row.get(22)?,
                    industry: row.get(23)?,
                    employees: row.get(24)?,
                    remote_work_type: row.get(25)?,
                    remote_work_description: row.get(26)?,
                    job_category: row.get(27)?,
                    contact_person: row.get(28)?,
                    contact_phone: row.get(29)?,
                    last_processed_resume_at: parse_timestamp(
                        "jobs",
                        "last_processed_resume_at",
                        row.get(30)?,
                    )?,
                    snapshot_at: parse_timestamp("jobs", "snapshot_at", row.get(31)?)?,
                    synced_on: parse_date("jobs", "synced_on", Some(synced_on.clone()))?
                        .ok_or_else(|| corrupt("jobs", "synced_on", &synced_on))?,
                })
            })
            .optional()?;

        Ok(job)
    }

    fn get_url(&self, url: &str) -> StorageResult<Option<DiscoveredUrl>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, source, first_seen, last_seen, status FROM urls WHERE url = ?1",
        )?;

        let found = stmt
            .query_row(params![url], |row| {
                let status: String = row.get(4)?;
                Ok(DiscoveredUrl {
                    url: row.get(0)?,
                    source: row.get(1)?,
                    first_seen: required_timestamp("urls", "first_seen", row.get(2)?)?,
                    last_seen: required_timestamp("urls", "last_seen", row.get(3)?)?,
                    status: UrlStatus::from_db_string(&status)
                        .ok_or_else(|| corrupt("urls", "status", &status))?,
                })
            })
            .optional()?;

        Ok(found)
    }

    fn get_category(&self, code: &str) -> StorageResult<Option<CategoryNode>> {
        let mut stmt = self.conn.prepare(
            "SELECT code, name, parent_code, parent_name, source, created_at, updated_at
             FROM categories WHERE code = ?1",
        )?;

        let node = stmt
            .query_row(params![code], |row| {
                Ok(CategoryNode {
                    code: row.get(0)?,
                    name: row.get(1)?,
                    parent_code: row.get(2)?,
                    parent_name: row.get(3)?,
                    source: row.get(4)?,
                    created_at: required_timestamp("categories", "created_at", row.get(5)?)?,
                    updated_at: required_timestamp("categories", "updated_at", row.get(6)?)?,
                })
            })
            .optional()?;

        Ok(node)
    }

    // ===== Statistics =====

    fn count_rows(&self, table: &str) -> StorageResult<u64> {
        let spec = table_spec(table).ok_or_else(|| StorageError::UnknownTable(table.to_string()))?;
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", spec.name),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_urls_by_status(&self) -> StorageResult<HashMap<String, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM urls GROUP BY status")?;

        let counts = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(counts)
    }
}
