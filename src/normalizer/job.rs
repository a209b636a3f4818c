//! Detail payload to `JobRecord` conversion

use crate::model::JobRecord;
use crate::normalizer::payload::{join_descriptions, join_scalars, navigate};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use thiserror::Error;

/// Reasons a payload is rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field {field} expected {expected}, found {found}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
        found: String,
    },
}

const POSTED_DATE_FORMAT: &str = "%Y/%m/%d";

/// Normalizes one detail payload, stamping today's date as the sync date
///
/// # Arguments
///
/// * `payload` - The `data` member of the detail API envelope
/// * `job_id` - Identifier derived from the listing URL
///
/// # Returns
///
/// * `Ok(JobRecord)` - Payload carried every required field in a usable shape
/// * `Err(ValidationError)` - Payload is unusable; reject this one record
pub fn normalize_job(payload: &Value, job_id: &str) -> Result<JobRecord, ValidationError> {
    normalize_job_on(payload, job_id, Utc::now().date_naive())
}

/// Normalizes one detail payload with an explicit sync date
pub fn normalize_job_on(
    payload: &Value,
    job_id: &str,
    synced_on: NaiveDate,
) -> Result<JobRecord, ValidationError> {
    let job_id = required(Some(job_id.to_string()), "job_id")?;
    let title = required(text(payload, "title", &["header", "jobName"])?, "title")?;
    let company_id = required(text(payload, "company_id", &["custNo"])?, "company_id")?;

    let mut record = JobRecord::new(job_id, title, company_id, synced_on);

    record.description = text(payload, "description", &["jobDetail", "jobDescription"])?;
    record.posted_date = date(navigate(payload, &["header", "appearDate"]));

    record.salary = text(payload, "salary", &["jobDetail", "salary"])?;
    record.salary_min = integer(payload, "salary_min", &["jobDetail", "salaryMin"])?;
    record.salary_max = integer(payload, "salary_max", &["jobDetail", "salaryMax"])?;
    record.salary_type = integer(payload, "salary_type", &["jobDetail", "salaryType"])?;

    record.work_time = text(payload, "work_time", &["jobDetail", "workPeriod"])?;
    record.work_type = integer(payload, "work_type", &["jobDetail", "jobType"])?;
    record.need_employees = text(payload, "need_employees", &["jobDetail", "needEmp"])?;
    record.location = text(payload, "location", &["jobDetail", "addressRegion"])?;
    record.company_address = text(payload, "company_address", &["jobDetail", "addressDetail"])?;
    record.longitude = text(payload, "longitude", &["jobDetail", "longitude"])?;
    record.latitude = text(payload, "latitude", &["jobDetail", "latitude"])?;

    record.degree = text(payload, "degree", &["condition", "edu"])?;
    record.working_experience = text(payload, "working_experience", &["condition", "workExp"])?;
    record.department = join_descriptions(navigate(payload, &["condition", "major"]));
    record.qualification_required = join_descriptions(navigate(payload, &["condition", "specialty"]));
    record.qualification_bonus = join_descriptions(navigate(payload, &["condition", "skill"]));
    record.qualification_other = text(payload, "qualification_other", &["condition", "other"])?;

    record.company_name = text(payload, "company_name", &["header", "custName"])?;
    record.industry = text(payload, "industry", &["industry"])?;
    record.employees = text(payload, "employees", &["employees"])?;

    record.remote_work_type = text(payload, "remote_work_type", &["jobDetail", "remoteWork", "type"])?;
    record.remote_work_description = text(
        payload,
        "remote_work_description",
        &["jobDetail", "remoteWork", "description"],
    )?;
    record.job_category = join_descriptions(navigate(payload, &["jobDetail", "jobCategory"]));
    record.contact_person = text(payload, "contact_person", &["contact", "hrName"])?;
    record.contact_phone = join_scalars(navigate(payload, &["contact", "phone"]));

    record.last_processed_resume_at = epoch(navigate(
        payload,
        &["interactionRecord", "lastProcessedResumeAtTime"],
    ));
    record.snapshot_at = epoch(navigate(payload, &["interactionRecord", "nowTimestamp"]));

    Ok(record)
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField(field)),
    }
}

/// Reads a scalar text field; numbers and booleans are rendered as text
fn text(
    payload: &Value,
    field: &'static str,
    path: &[&str],
) -> Result<Option<String>, ValidationError> {
    match navigate(payload, path) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(ValidationError::InvalidType {
            field,
            expected: "text",
            found: kind_of(other).to_string(),
        }),
    }
}

/// Reads an integer field from a JSON integer, an integral float, or a
/// numeric string; blank strings count as absent
fn integer(
    payload: &Value,
    field: &'static str,
    path: &[&str],
) -> Result<Option<i64>, ValidationError> {
    let invalid = |found: String| ValidationError::InvalidType {
        field,
        expected: "integer",
        found,
    };

    match navigate(payload, path) {
        None => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return Ok(Some(i));
            }
            match n.as_f64() {
                Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    Ok(Some(f as i64))
                }
                _ => Err(invalid(n.to_string())),
            }
        }
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<i64>()
                .map(Some)
                .map_err(|_| invalid(format!("\"{}\"", s)))
        }
        Some(other) => Err(invalid(kind_of(other).to_string())),
    }
}

/// `YYYY/MM/DD` strings become dates; anything else is absent
fn date(value: Option<&Value>) -> Option<NaiveDate> {
    let s = value?.as_str()?;
    NaiveDate::parse_from_str(s.trim(), POSTED_DATE_FORMAT).ok()
}

/// Whole-number epoch seconds become UTC timestamps; zero, negatives and
/// non-numeric values are absent
fn epoch(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let secs = match value? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            s.parse::<i64>().ok()?
        }
        _ => return None,
    };

    if secs <= 0 {
        return None;
    }
    DateTime::<Utc>::from_timestamp(secs, 0)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
