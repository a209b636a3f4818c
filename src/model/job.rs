use chrono::{DateTime, NaiveDate, Utc};

/// One normalized job listing, keyed by the external job identifier
///
/// `job_id`, `title` and `company_id` are always present; everything else is
/// whatever the detail payload happened to carry.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub job_id: String,
    pub title: String,
    pub description: Option<String>,
    pub posted_date: Option<NaiveDate>,

    // Salary
    pub salary: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub salary_type: Option<i64>,

    // Schedule and placement
    pub work_time: Option<String>,
    pub work_type: Option<i64>,
    pub need_employees: Option<String>,
    pub location: Option<String>,
    pub company_address: Option<String>,
    pub longitude: Option<String>,
    pub latitude: Option<String>,

    // Requirements
    pub degree: Option<String>,
    pub working_experience: Option<String>,
    pub department: Option<String>,
    pub qualification_required: Option<String>,
    pub qualification_bonus: Option<String>,
    pub qualification_other: Option<String>,

    // Employer
    pub company_id: String,
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub employees: Option<String>,

    pub remote_work_type: Option<String>,
    pub remote_work_description: Option<String>,
    pub job_category: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,

    // Interaction snapshot
    pub last_processed_resume_at: Option<DateTime<Utc>>,
    pub snapshot_at: Option<DateTime<Utc>>,

    /// Day this record was last fetched
    pub synced_on: NaiveDate,
}

impl JobRecord {
    /// Creates a record holding only the required fields
    pub fn new(
        job_id: impl Into<String>,
        title: impl Into<String>,
        company_id: impl Into<String>,
        synced_on: NaiveDate,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            title: title.into(),
            description: None,
            posted_date: None,
            salary: None,
            salary_min: None,
            salary_max: None,
            salary_type: None,
            work_time: None,
            work_type: None,
            need_employees: None,
            location: None,
            company_address: None,
            longitude: None,
            latitude: None,
            degree: None,
            working_experience: None,
            department: None,
            qualification_required: None,
            qualification_bonus: None,
            qualification_other: None,
            company_id: company_id.into(),
            company_name: None,
            industry: None,
            employees: None,
            remote_work_type: None,
            remote_work_description: None,
            job_category: None,
            contact_person: None,
            contact_phone: None,
            last_processed_resume_at: None,
            snapshot_at: None,
            synced_on,
        }
    }
}
