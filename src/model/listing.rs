use chrono::{DateTime, Utc};

/// A candidate listing URL found by discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredUrl {
    /// Normalized URL (no query string); the storage key
    pub url: String,
    pub source: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub status: UrlStatus,
}

impl DiscoveredUrl {
    /// A URL seen for the first time at `seen_at`
    pub fn new(url: impl Into<String>, source: impl Into<String>, seen_at: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            source: source.into(),
            first_seen: seen_at,
            last_seen: seen_at,
            status: UrlStatus::New,
        }
    }
}

/// Processing status of a discovered URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlStatus {
    /// Pending detail collection
    New,
    /// The listing is no longer available upstream
    Expired,
}

impl UrlStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Expired => "expired",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }
}
