//! Upcoming and live matches from the vlr.gg matches listing.
//!
//! # URL Pattern
//!
//! Page 1 is `https://www.vlr.gg/matches`; later pages are
//! `https://www.vlr.gg/matches?page=N`.

use super::match_items::{self, MATCH_ITEM_MARKER};
use super::{paged_url, Extraction, Extractor};
use crate::error::ScrapeError;
use crate::models::{MatchRecord, Record, ResourceType};
use scraper::Html;
use tracing::{debug, instrument};
use url::Url;

#[derive(Debug, Clone)]
pub struct MatchesExtractor {
    base: Url,
}

impl MatchesExtractor {
    pub fn new(base: Url) -> Self {
        Self { base }
    }
}

impl Extractor for MatchesExtractor {
    fn resource(&self) -> ResourceType {
        ResourceType::Matches
    }

    fn page_url(&self, page: u32) -> Result<String, ScrapeError> {
        paged_url(&self.base, "matches", "matches", page)
    }

    fn content_marker(&self) -> &'static str {
        MATCH_ITEM_MARKER
    }

    #[instrument(level = "debug", skip(self, html))]
    fn extract(&self, html: &str, page: u32) -> Result<Extraction, ScrapeError> {
        let document = Html::parse_document(html);
        let items = match_items::collect(&document);
        if items.is_empty() {
            return Err(ScrapeError::Extraction(format!(
                "no {MATCH_ITEM_MARKER} blocks on matches page {page}"
            )));
        }

        let mut records = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match item.into_pair() {
                Ok(([a, b], item)) => records.push(Record::Match(MatchRecord {
                    date: item.date,
                    team_a: a.name,
                    region_a: a.region,
                    team_b: b.name,
                    region_b: b.region,
                    time: item.time,
                    event: item.event,
                    status: item.status,
                })),
                Err(reason) => debug!(index, %reason, "Dropping malformed match item"),
            }
        }

        Ok(Extraction {
            records,
            total_pages: match_items::total_pages(&document),
        })
    }
}
