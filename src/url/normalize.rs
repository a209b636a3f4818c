use crate::{UrlError, UrlResult};
use url::Url;

/// Normalizes a listing URL into its storage key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an http or https scheme
/// 3. Require a host
/// 4. Remove the query string (tracking and search parameters)
/// 5. Remove the fragment
///
/// The same listing reached through different query parameters therefore
/// collapses to one key.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use job_crawler::url::normalize_listing_url;
///
/// let url = normalize_listing_url("https://www.104.com.tw/job/7xk2p?jobsource=index_s").unwrap();
/// assert_eq!(url.as_str(), "https://www.104.com.tw/job/7xk2p");
/// ```
pub fn normalize_listing_url(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url)
}

/// Resolves a possibly-relative link against the page it was found on, then
/// normalizes it
pub fn resolve_listing_url(base: &Url, href: &str) -> UrlResult<Url> {
    let url = base
        .join(href.trim())
        .map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url)
}

fn normalize_parsed(mut url: Url) -> UrlResult<Url> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

/// Extracts the job identifier from a listing URL
///
/// The identifier is the trailing non-empty path segment once any query or
/// fragment is removed, so `https://host/job/abc123?x=1` yields `abc123`.
pub fn job_id_from_url(url_str: &str) -> UrlResult<String> {
    let url = normalize_listing_url(url_str)?;

    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .ok_or_else(|| UrlError::MissingJobId(url_str.to_string()))
}
