use chrono::{DateTime, Utc};

/// One node of the job-category taxonomy
///
/// Nodes form a tree through `parent_code`; roots have no parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryNode {
    pub code: String,
    pub name: String,
    pub parent_code: Option<String>,
    pub parent_name: Option<String>,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
