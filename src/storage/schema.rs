//! Database schema definitions
//!
//! This module contains the SQL schema for the Job-Crawler database and the
//! per-table metadata that drives the generic upsert.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Normalized job listings
CREATE TABLE IF NOT EXISTS jobs (
    job_id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT,
    posted_date TEXT,
    salary TEXT,
    salary_min INTEGER,
    salary_max INTEGER,
    salary_type INTEGER,
    work_time TEXT,
    work_type INTEGER,
    need_employees TEXT,
    location TEXT,
    company_address TEXT,
    longitude TEXT,
    latitude TEXT,
    degree TEXT,
    working_experience TEXT,
    department TEXT,
    qualification_required TEXT,
    qualification_bonus TEXT,
    qualification_other TEXT,
    company_id TEXT NOT NULL,
    company_name TEXT,
    industry TEXT,
    employees TEXT,
    remote_work_type TEXT,
    remote_work_description TEXT,
    job_category TEXT,
    contact_person TEXT,
    contact_phone TEXT,
    last_processed_resume_at TEXT,
    snapshot_at TEXT,
    synced_on TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_jobs_company ON jobs(company_id);

-- Discovered listing URLs
CREATE TABLE IF NOT EXISTS urls (
    url TEXT PRIMARY KEY,
    source TEXT NOT NULL,
    first_seen TEXT NOT NULL,
    last_seen TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'new'
);

CREATE INDEX IF NOT EXISTS idx_urls_source_status ON urls(source, status);

-- Job category taxonomy
CREATE TABLE IF NOT EXISTS categories (
    code TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    parent_code TEXT,
    parent_name TEXT,
    source TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_categories_parent ON categories(parent_code);
"#;

/// Declared shape of an upsertable table
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub primary_key: &'static [&'static str],
    /// Written on insert, never overwritten on conflict
    ///
    /// An exception to overwrite-every-non-key-column upserts. `urls` keeps
    /// `first_seen` as the original discovery time and `status` as set by the
    /// detail job, so rediscovering an expired listing does not revive it.
    pub insert_only: &'static [&'static str],
}

impl TableSpec {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(&column)
    }

    pub fn is_key(&self, column: &str) -> bool {
        self.primary_key.contains(&column)
    }

    /// Whether a conflicting row should take the incoming value for `column`
    pub fn is_updatable(&self, column: &str) -> bool {
        !self.is_key(column) && !self.insert_only.contains(&column)
    }
}

pub const JOBS: TableSpec = TableSpec {
    name: "jobs",
    columns: &[
        "job_id",
        "title",
        "description",
        "posted_date",
        "salary",
        "salary_min",
        "salary_max",
        "salary_type",
        "work_time",
        "work_type",
        "need_employees",
        "location",
        "company_address",
        "longitude",
        "latitude",
        "degree",
        "working_experience",
        "department",
        "qualification_required",
        "qualification_bonus",
        "qualification_other",
        "company_id",
        "company_name",
        "industry",
        "employees",
        "remote_work_type",
        "remote_work_description",
        "job_category",
        "contact_person",
        "contact_phone",
        "last_processed_resume_at",
        "snapshot_at",
        "synced_on",
    ],
    primary_key: &["job_id"],
    insert_only: &[],
};

pub const URLS: TableSpec = TableSpec {
    name: "urls",
    columns: &["url", "source", "first_seen", "last_seen", "status"],
    primary_key: &["url"],
    insert_only: &["first_seen", "status"],
};

pub const CATEGORIES: TableSpec = TableSpec {
    name: "categories",
    columns: &[
        "code",
        "name",
        "parent_code",
        "parent_name",
        "source",
        "created_at",
        "updated_at",
    ],
    primary_key: &["code"],
    insert_only: &[],
};

/// All tables that accept batch upserts
pub const TABLES: &[TableSpec] = &[JOBS, URLS, CATEGORIES];

/// Looks up the declared metadata for a table
pub fn table_spec(name: &str) -> Option<&'static TableSpec> {
    TABLES.iter().find(|t| t.name == name)
}

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
