//! URL discovery over paginated search results
//!
//! One `KeywordScraper` covers one (keyword, category) partition. Page 1 is
//! fetched alone to learn how many pages exist; the remaining pages are
//! fetched concurrently and every page's links are unioned.

use crate::config::{DiscoveryConfig, SiteConfig};
use crate::crawler::parser::{parse_search_page, SearchPage};
use crate::crawler::pool::run_bounded;
use reqwest::header::REFERER;
use reqwest::Client;
use std::collections::HashSet;
use url::Url;

/// Scraper for a single search partition
#[derive(Debug, Clone)]
pub struct KeywordScraper {
    client: Client,
    search_url: Url,
    referer: String,
    category_code: String,
    keyword: String,
    order: u32,
    max_pages: u32,
    page_workers: usize,
}

impl KeywordScraper {
    pub fn new(
        client: Client,
        search_url: Url,
        referer: impl Into<String>,
        category_code: impl Into<String>,
        keyword: impl Into<String>,
        discovery: &DiscoveryConfig,
    ) -> Self {
        Self {
            client,
            search_url,
            referer: referer.into(),
            category_code: category_code.into(),
            keyword: keyword.into(),
            order: discovery.order,
            max_pages: discovery.max_pages,
            page_workers: discovery.page_workers,
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Scrapes the partition and returns every listing URL found
    ///
    /// A failed page contributes nothing; a failed page 1 yields an empty set.
    pub async fn scrape(&self) -> HashSet<String> {
        let first = match self.fetch_page(1).await {
            Some(page) => page,
            None => return HashSet::new(),
        };

        let effective_max = self.max_pages.min(first.max_pages());
        tracing::info!(
            "Scraping keyword '{}' in category {}: {} page(s)",
            self.keyword,
            self.category_code,
            effective_max
        );

        let mut links = first.links;
        if effective_max > 1 {
            let this = self.clone();
            let pages = run_bounded(2..=effective_max, self.page_workers, move |page| {
                let scraper = this.clone();
                async move { scraper.fetch_page(page).await }
            })
            .await;

            for page in pages.into_iter().flatten() {
                links.extend(page.links);
            }
        }

        tracing::info!(
            "Keyword '{}' yielded {} unique URLs",
            self.keyword,
            links.len()
        );
        links
    }

    /// Fetches and parses one results page; failures are logged and yield `None`
    async fn fetch_page(&self, page: u32) -> Option<SearchPage> {
        let order = self.order.to_string();
        let page_param = page.to_string();
        let query = [
            ("jobsource", "index_s"),
            ("mode", "s"),
            ("jobcat", self.category_code.as_str()),
            ("keyword", self.keyword.as_str()),
            ("order", order.as_str()),
            ("page", page_param.as_str()),
        ];

        let response = match self
            .client
            .get(self.search_url.clone())
            .query(&query)
            .header(REFERER, self.referer.as_str())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Search page {} for '{}' failed: {}", page, self.keyword, e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                "Search page {} for '{}' returned HTTP {}",
                page,
                self.keyword,
                status.as_u16()
            );
            return None;
        }

        let page_url = response.url().clone();
        match response.text().await {
            Ok(body) => Some(parse_search_page(&body, &page_url)),
            Err(e) => {
                tracing::warn!(
                    "Reading search page {} for '{}' failed: {}",
                    page,
                    self.keyword,
                    e
                );
                None
            }
        }
    }
}

/// Scrapes every keyword partition of a category concurrently and unions the
/// results
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `site` - Search endpoint and referer
/// * `discovery` - Page cap, sort order and pool sizes
/// * `category_code` - Category to search within
/// * `keywords` - One partition per keyword; pass `[""]` for the whole category
pub async fn discover_all(
    client: &Client,
    site: &SiteConfig,
    discovery: &DiscoveryConfig,
    category_code: &str,
    keywords: &[String],
) -> Result<HashSet<String>, url::ParseError> {
    let search_url = Url::parse(&site.search_url)?;

    let scrapers: Vec<KeywordScraper> = keywords
        .iter()
        .map(|keyword| {
            KeywordScraper::new(
                client.clone(),
                search_url.clone(),
                site.referer.as_str(),
                category_code,
                keyword.as_str(),
                discovery,
            )
        })
        .collect();

    let sets = run_bounded(scrapers, discovery.partition_workers, |scraper| async move {
        scraper.scrape().await
    })
    .await;

    Ok(sets.into_iter().flatten().collect())
}
