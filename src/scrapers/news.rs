//! News teasers from the vlr.gg news listing.
//!
//! # URL Pattern
//!
//! Page 1 is `https://www.vlr.gg/news`; later pages are
//! `https://www.vlr.gg/news/?page=N` (note the trailing slash).
//!
//! The teaser markup has no semantic classes for headline and description,
//! only inline styles, so those two are matched on their style attribute.
//! Date, author and region all live in one `.ge-text-light` meta line.

use super::{paged_url, Extraction, Extractor};
use crate::error::ScrapeError;
use crate::models::{NewsRecord, Record, ResourceType};
use crate::utils::{clean_text, element_text, max_page_number, region_from_classes, UNKNOWN};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

const NEWS_ITEM_MARKER: &str = ".wf-module-item";

static ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse(NEWS_ITEM_MARKER).unwrap());
static HEADLINE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div[style*='font-weight: 700']").unwrap());
static SHORT_DESC: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div[style*='font-size: 13px']").unwrap());
static META: Lazy<Selector> = Lazy::new(|| Selector::parse(".ge-text-light").unwrap());
static FLAG: Lazy<Selector> = Lazy::new(|| Selector::parse("i.flag").unwrap());
static PAGE_BUTTON: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".action-container-pages .btn.mod-page").unwrap());

static META_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+ \d{1,2}, \d{4})").unwrap());
static META_AUTHOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"by\s+(.+)$").unwrap());

#[derive(Debug, Clone)]
pub struct NewsExtractor {
    base: Url,
}

impl NewsExtractor {
    pub fn new(base: Url) -> Self {
        Self { base }
    }
}

impl Extractor for NewsExtractor {
    fn resource(&self) -> ResourceType {
        ResourceType::News
    }

    fn page_url(&self, page: u32) -> Result<String, ScrapeError> {
        paged_url(&self.base, "news", "news/", page)
    }

    fn content_marker(&self) -> &'static str {
        NEWS_ITEM_MARKER
    }

    #[instrument(level = "debug", skip(self, html))]
    fn extract(&self, html: &str, page: u32) -> Result<Extraction, ScrapeError> {
        let document = Html::parse_document(html);
        let items: Vec<ElementRef<'_>> = document.select(&ITEM).collect();
        if items.is_empty() {
            return Err(ScrapeError::Extraction(format!(
                "no {NEWS_ITEM_MARKER} blocks on news page {page}"
            )));
        }

        let mut records = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let record = parse_item(item);
            if record.headline.is_empty() {
                debug!(index, "Dropping news item without a headline");
                continue;
            }
            records.push(Record::News(record));
        }

        let total_pages = max_page_number(
            document
                .select(&PAGE_BUTTON)
                .map(|button| button.text().collect::<String>()),
        );

        Ok(Extraction {
            records,
            total_pages,
        })
    }
}

fn parse_item(item: ElementRef<'_>) -> NewsRecord {
    let headline = item.select(&HEADLINE).next().map(element_text).unwrap_or_default();
    let short_desc = item.select(&SHORT_DESC).next().map(element_text).unwrap_or_default();

    let mut date = UNKNOWN.to_string();
    let mut author = UNKNOWN.to_string();
    let mut region = UNKNOWN.to_string();

    if let Some(meta) = item.select(&META).next() {
        let text = element_text(meta);
        if let Some(found) = META_DATE.captures(&text).and_then(|c| c.get(1)) {
            date = clean_text(found.as_str());
        }
        if let Some(found) = META_AUTHOR.captures(&text).and_then(|c| c.get(1)) {
            author = clean_text(found.as_str());
        }
        if let Some(flag) = meta.select(&FLAG).next() {
            region = region_from_classes(flag.value().classes());
        }
    }

    NewsRecord {
        headline,
        short_desc,
        date,
        author,
        region,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> NewsExtractor {
        NewsExtractor::new(Url::parse("https://www.vlr.gg").unwrap())
    }

    const LISTING: &str = r#"
        <div class="wf-card">
          <a class="wf-module-item" href="/1">
            <div style="font-weight: 700; font-size: 15px;">
               Patch 10.08   notes
            </div>
            <div style="font-size: 13px; padding: 5px 0;">Agent   changes
               and map pool</div>
            <div class="ge-text-light">
              <i class="flag mod-un"></i> • May 6, 2025 • by   thothgow
            </div>
          </a>
          <a class="wf-module-item" href="/2">
            <div style="font-size: 13px;">Description without headline</div>
          </a>
          <a class="wf-module-item" href="/3">
            <div style="font-weight: 700;">Bare teaser</div>
          </a>
        </div>
        <div class="action-container-pages">
          <span class="btn mod-page">1</span><a class="btn mod-page">2</a>
          <a class="btn mod-page">1613</a><a class="btn mod-page">›</a>
        </div>"#;

    #[test]
    fn test_news_fields() {
        let out = extractor().extract(LISTING, 1).unwrap();
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.total_pages, 1613);

        let Record::News(first) = &out.records[0] else {
            panic!("expected a news record");
        };
        assert_eq!(first.headline, "Patch 10.08 notes");
        assert_eq!(first.short_desc, "Agent changes and map pool");
        assert_eq!(first.date, "May 6, 2025");
        assert_eq!(first.author, "thothgow");
        assert_eq!(first.region, "UN");
    }

    #[test]
    fn test_missing_meta_defaults_to_unknown() {
        let out = extractor().extract(LISTING, 1).unwrap();
        let Record::News(bare) = &out.records[1] else {
            panic!("expected a news record");
        };
        assert_eq!(bare.headline, "Bare teaser");
        assert_eq!(bare.short_desc, "");
        assert_eq!(bare.date, "Unknown");
        assert_eq!(bare.author, "Unknown");
        assert_eq!(bare.region, "Unknown");
    }

    #[test]
    fn test_page_url_keeps_trailing_slash() {
        let e = extractor();
        assert_eq!(e.page_url(1).unwrap(), "https://www.vlr.gg/news");
        assert_eq!(e.page_url(3).unwrap(), "https://www.vlr.gg/news/?page=3");
    }
}
