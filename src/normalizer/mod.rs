//! Record normalization
//!
//! Pure conversions from semi-structured API payloads into typed records.
//! Nothing here performs I/O.

mod category;
mod job;
mod payload;

pub use category::{flatten_categories, RawCategory};
pub use job::{normalize_job, normalize_job_on, ValidationError};
pub use payload::{join_descriptions, join_scalars, navigate};
