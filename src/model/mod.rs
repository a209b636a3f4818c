//! Domain records produced by the pipeline and owned by storage

mod category;
mod job;
mod listing;

pub use category::CategoryNode;
pub use job::JobRecord;
pub use listing::{DiscoveredUrl, UrlStatus};
