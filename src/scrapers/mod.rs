//! Record extractors, one per upstream resource.
//!
//! Each extractor knows three things about its resource:
//!
//! 1. **Where**: the upstream URL for a given page number
//! 2. **When**: the content marker that says the page has loaded
//! 3. **What**: how to turn the loaded HTML into validated records
//!
//! # Supported Resources
//!
//! | Resource | Module | Upstream | Content marker |
//! |----------|--------|----------|----------------|
//! | Matches | [`matches`] | `vlr.gg/matches` | `.match-item` |
//! | Results | [`results`] | `vlr.gg/matches/results` | `.match-item` |
//! | News | [`news`] | `vlr.gg/news` | `.wf-module-item` |
//! | Quotes | [`quotes`] | `quotes.toscrape.com` | `.quote` |
//!
//! Matches and results share the item parsing in [`match_items`].
//!
//! Extraction is synchronous: it runs once the page body is in hand and
//! never touches the network. Items that fail their shape checks are
//! dropped with a debug log; only a page with no items at all fails.

pub mod match_items;
pub mod matches;
pub mod news;
pub mod quotes;
pub mod results;

use crate::error::ScrapeError;
use crate::models::{Record, ResourceType};
use std::sync::Arc;
use url::Url;

/// Output of one successful extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Validated records in page order.
    pub records: Vec<Record>,
    /// Upstream page count estimate, at least 1.
    pub total_pages: u32,
}

/// Turns a rendered upstream page into validated records.
pub trait Extractor: Send + Sync {
    /// The resource this extractor serves.
    fn resource(&self) -> ResourceType;
    /// Upstream URL for `page` (1-based).
    fn page_url(&self, page: u32) -> Result<String, ScrapeError>;
    /// Selector that must match before extraction is attempted.
    fn content_marker(&self) -> &'static str;
    /// Parse `html` into records.
    fn extract(&self, html: &str, page: u32) -> Result<Extraction, ScrapeError>;
}

/// Build a listing URL where page 1 is a bare path and later pages carry `?page=N`.
///
/// `paged_path` may differ from `bare_path` (the news listing wants a trailing
/// slash before the query on later pages).
pub fn paged_url(
    base: &Url,
    bare_path: &str,
    paged_path: &str,
    page: u32,
) -> Result<String, ScrapeError> {
    if page <= 1 {
        return Ok(base.join(bare_path)?.to_string());
    }
    let mut url = base.join(paged_path)?;
    url.query_pairs_mut()
        .append_pair("page", &page.to_string());
    Ok(url.to_string())
}

/// The full set of extractors the service registers at startup.
pub fn default_extractors(vlr_base: &Url, quotes_base: &Url) -> Vec<Arc<dyn Extractor>> {
    vec![
        Arc::new(matches::MatchesExtractor::new(vlr_base.clone())),
        Arc::new(results::ResultsExtractor::new(vlr_base.clone())),
        Arc::new(news::NewsExtractor::new(vlr_base.clone())),
        Arc::new(quotes::QuotesExtractor::new(quotes_base.clone())),
    ]
}
