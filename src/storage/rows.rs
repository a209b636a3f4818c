//! Record to row conversion
//!
//! Each persisted record type declares its target table and renders itself as
//! an ordered list of `(column, value)` pairs.

use crate::model::{CategoryNode, DiscoveredUrl, JobRecord};
use crate::storage::traits::{Storage, StorageResult};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value;

/// One row ready to write: ordered `(column, value)` pairs
pub type Row = Vec<(&'static str, Value)>;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A record type owned by one table
pub trait Record {
    const TABLE: &'static str;

    fn to_row(&self) -> Row;
}

/// Upserts a batch of records into their table
///
/// # Arguments
///
/// * `storage` - Storage backend
/// * `records` - Records to write; empty is a no-op
///
/// # Returns
///
/// The number of rows inserted or updated
pub fn upsert_batch<R, S>(storage: &mut S, records: &[R]) -> StorageResult<usize>
where
    R: Record,
    S: Storage + ?Sized,
{
    if records.is_empty() {
        return Ok(0);
    }
    let rows = records.iter().map(Record::to_row).collect();
    storage.upsert_rows(R::TABLE, rows)
}

/// Replaces values the store must never see (NaN, infinities) with NULL
pub fn sanitize(value: Value) -> Value {
    match value {
        Value::Real(f) if !f.is_finite() => Value::Null,
        other => other,
    }
}

fn text(value: &Option<String>) -> Value {
    value.clone().map_or(Value::Null, Value::Text)
}

fn integer(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}

fn date(value: Option<NaiveDate>) -> Value {
    value.map_or(Value::Null, |d| Value::Text(d.format(DATE_FORMAT).to_string()))
}

fn timestamp(value: Option<DateTime<Utc>>) -> Value {
    value.map_or(Value::Null, |t| Value::Text(t.to_rfc3339()))
}

impl Record for JobRecord {
    const TABLE: &'static str = "jobs";

    fn to_row(&self) -> Row {
        vec![
            ("job_id", Value::Text(self.job_id.clone())),
            ("title", Value::Text(self.title.clone())),
            ("description", text(&self.description)),
            ("posted_date", date(self.posted_date)),
            ("salary", text(&self.salary)),
            ("salary_min", integer(self.salary_min)),
            ("salary_max", integer(self.salary_max)),
            ("salary_type", integer(self.salary_type)),
            ("work_time", text(&self.work_time)),
            ("work_type", integer(self.work_type)),
            ("need_employees", text(&self.need_employees)),
            ("location", text(&self.location)),
            ("company_address", text(&self.company_address)),
            ("longitude", text(&self.longitude)),
            ("latitude", text(&self.latitude)),
            ("degree", text(&self.degree)),
            ("working_experience", text(&self.working_experience)),
            ("department", text(&self.department)),
            ("qualification_required", text(&self.qualification_required)),
            ("qualification_bonus", text(&self.qualification_bonus)),
            ("qualification_other", text(&self.qualification_other)),
            ("company_id", Value::Text(self.company_id.clone())),
            ("company_name", text(&self.company_name)),
            ("industry", text(&self.industry)),
            ("employees", text(&self.employees)),
            ("remote_work_type", text(&self.remote_work_type)),
            ("remote_work_description", text(&self.remote_work_description)),
            ("job_category", text(&self.job_category)),
            ("contact_person", text(&self.contact_person)),
            ("contact_phone", text(&self.contact_phone)),
            ("last_processed_resume_at", timestamp(self.last_processed_resume_at)),
            ("snapshot_at", timestamp(self.snapshot_at)),
            ("synced_on", date(Some(self.synced_on))),
        ]
    }
}

impl Record for DiscoveredUrl {
    const TABLE: &'static str = "urls";

    fn to_row(&self) -> Row {
        vec![
            ("url", Value::Text(self.url.clone())),
            ("source", Value::Text(self.source.clone())),
            ("first_seen", timestamp(Some(self.first_seen))),
            ("last_seen", timestamp(Some(self.last_seen))),
            ("status", Value::Text(self.status.to_db_string().to_string())),
        ]
    }
}

impl Record for CategoryNode {
    const TABLE: &'static str = "categories";

    fn to_row(&self) -> Row {
        vec![
            ("code", Value::Text(self.code.clone())),
            ("name", Value::Text(self.name.clone())),
            ("parent_code", text(&self.parent_code)),
            ("parent_name", text(&self.parent_name)),
            ("source", Value::Text(self.source.clone())),
            ("created_at", timestamp(Some(self.created_at))),
            ("updated_at", timestamp(Some(self.updated_at))),
        ]
    }
}
