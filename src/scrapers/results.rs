//! Completed matches from the vlr.gg results listing.
//!
//! Same item markup as the matches page, plus per-team scores. Page 1 is
//! `https://www.vlr.gg/matches/results`; later pages append `?page=N`.

use super::match_items::{self, MATCH_ITEM_MARKER};
use super::{paged_url, Extraction, Extractor};
use crate::error::ScrapeError;
use crate::models::{Record, ResourceType, ResultRecord};
use scraper::Html;
use tracing::{debug, instrument};
use url::Url;

#[derive(Debug, Clone)]
pub struct ResultsExtractor {
    base: Url,
}

impl ResultsExtractor {
    pub fn new(base: Url) -> Self {
        Self { base }
    }
}

impl Extractor for ResultsExtractor {
    fn resource(&self) -> ResourceType {
        ResourceType::Results
    }

    fn page_url(&self, page: u32) -> Result<String, ScrapeError> {
        paged_url(&self.base, "matches/results", "matches/results", page)
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
                "no {MATCH_ITEM_MARKER} blocks on results page {page}"
            )));
        }

        let records = items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match item.into_pair() {
                Ok(([a, b], item)) => {
                    let mut scores = item.scores.into_iter();
                    Some(Record::Result(ResultRecord {
                        date: item.date,
                        team_a: a.name,
                        region_a: a.region,
                        team_b: b.name,
                        region_b: b.region,
                        score_a: scores.next().unwrap_or_default(),
                        score_b: scores.next().unwrap_or_default(),
                        time: item.time,
                        event: item.event,
                        status: item.status,
                    }))
                }
                Err(reason) => {
                    debug!(index, %reason, "Dropping malformed result item");
                    None
                }
            })
            .collect();

        Ok(Extraction {
            records,
            total_pages: match_items::total_pages(&document),
        })
    }
}
