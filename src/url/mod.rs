//! URL handling module for Job-Crawler
//!
//! Listing URLs are keyed by their query-less form, and the detail API is
//! addressed by the trailing path segment of that form.

mod normalize;

pub use normalize::{job_id_from_url, normalize_listing_url, resolve_listing_url};

use crate::UrlResult;

/// Builds the detail API URL for a listing
///
/// # Arguments
///
/// * `detail_api_prefix` - The configured detail endpoint prefix
/// * `listing_url` - The listing URL the job was discovered at
///
/// # Examples
///
/// ```
/// use job_crawler::url::detail_url_for;
///
/// let url = detail_url_for(
///     "https://www.104.com.tw/job/ajax/content/",
///     "https://www.104.com.tw/job/7xk2p?jobsource=index_s",
/// ).unwrap();
/// assert_eq!(url, "https://www.104.com.tw/job/ajax/content/7xk2p");
/// ```
pub fn detail_url_for(detail_api_prefix: &str, listing_url: &str) -> UrlResult<String> {
    let job_id = job_id_from_url(listing_url)?;
    Ok(format!("{}{}", detail_api_prefix, job_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_url_strips_query_first() {
        let url = detail_url_for(
            "http://127.0.0.1:9000/job/ajax/content/",
            "http://127.0.0.1:9000/job/abc123?jobsource=hotjob",
        )
        .unwrap();
        assert_eq!(url, "http://127.0.0.1:9000/job/ajax/content/abc123");
    }

    #[test]
    fn test_detail_url_rejects_bad_listing() {
        assert!(detail_url_for("https://host/api/", "not a url").is_err());
    }
}
