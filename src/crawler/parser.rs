//! Search results page parser
//!
//! Extracts listing links and pagination markers from one page of search
//! results.

use crate::url::resolve_listing_url;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Anchor inside each listing card that points at the listing
const LISTING_LINK_SELECTOR: &str = "div.job-summary a.info-job__text[href]";

/// Pagination control anchors
const PAGINATION_SELECTOR: &str = "a.paging__link";

/// What one search results page yielded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// Normalized listing URLs (absolute, no query string)
    pub links: HashSet<String>,

    /// Number of pagination markers present
    pub pagination_markers: usize,

    /// Highest page number among the markers, if any were numeric
    pub declared_max_page: Option<u32>,
}

impl SearchPage {
    /// Number of pages this partition has, judged from page 1
    ///
    /// Zero when the page has neither listings nor pagination; otherwise the
    /// declared maximum, never less than one.
    pub fn max_pages(&self) -> u32 {
        if self.links.is_empty() && self.pagination_markers == 0 {
            0
        } else {
            self.declared_max_page.unwrap_or(0).max(1)
        }
    }
}

/// Parses a search results page
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The URL the page was fetched from, for resolving relative links
///
/// # Example
///
/// ```
/// use job_crawler::crawler::parse_search_page;
/// use url::Url;
///
/// let html = r#"<div class="job-summary"><a class="info-job__text" href="//www.104.com.tw/job/7xk2p?jobsource=jolist">Dev</a></div>"#;
/// let base = Url::parse("https://www.104.com.tw/jobs/search/").unwrap();
/// let page = parse_search_page(html, &base);
/// assert!(page.links.contains("https://www.104.com.tw/job/7xk2p"));
/// assert_eq!(page.max_pages(), 1);
/// ```
pub fn parse_search_page(html: &str, base_url: &Url) -> SearchPage {
    let document = Html::parse_document(html);

    SearchPage {
        links: extract_listing_links(&document, base_url),
        pagination_markers: count_markers(&document),
        declared_max_page: extract_max_page(&document),
    }
}

fn extract_listing_links(document: &Html, base_url: &Url) -> HashSet<String> {
    let mut links = HashSet::new();

    if let Ok(selector) = Selector::parse(LISTING_LINK_SELECTOR) {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                match resolve_listing_url(base_url, href) {
                    Ok(url) => {
                        links.insert(url.to_string());
                    }
                    Err(e) => tracing::debug!("Skipping listing link {}: {}", href, e),
                }
            }
        }
    }

    links
}

fn count_markers(document: &Html) -> usize {
    Selector::parse(PAGINATION_SELECTOR)
        .map(|selector| document.select(&selector).count())
        .unwrap_or(0)
}

fn extract_max_page(document: &Html) -> Option<u32> {
    let selector = Selector::parse(PAGINATION_SELECTOR).ok()?;

    document
        .select(&selector)
        .filter_map(|element| element.text().collect::<String>().trim().parse::<u32>().ok())
        .max()
}
