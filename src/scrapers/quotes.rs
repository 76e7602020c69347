//! Quotes from quotes.toscrape.com.
//!
//! Pages are path-addressed (`/page/N/`) rather than query-addressed, and
//! the pager only offers a "Next" link, so the page count is inferred from
//! whether that link exists.

use super::{Extraction, Extractor};
use crate::error::ScrapeError;
use crate::models::{QuoteRecord, Record, ResourceType};
use crate::utils::element_text;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

const QUOTE_MARKER: &str = ".quote";

static QUOTE: Lazy<Selector> = Lazy::new(|| Selector::parse(QUOTE_MARKER).unwrap());
static TEXT: Lazy<Selector> = Lazy::new(|| Selector::parse(".text").unwrap());
static AUTHOR: Lazy<Selector> = Lazy::new(|| Selector::parse(".author").unwrap());
static TAG: Lazy<Selector> = Lazy::new(|| Selector::parse(".tags .tag").unwrap());
static NEXT: Lazy<Selector> = Lazy::new(|| Selector::parse(".pager li.next a").unwrap());

#[derive(Debug, Clone)]
pub struct QuotesExtractor {
    base: Url,
}

impl QuotesExtractor {
    pub fn new(base: Url) -> Self {
        Self { base }
    }
}

impl Extractor for QuotesExtractor {
    fn resource(&self) -> ResourceType {
        ResourceType::Quotes
    }

    fn page_url(&self, page: u32) -> Result<String, ScrapeError> {
        let path = if page <= 1 {
            "/".to_string()
        } else {
            format!("/page/{page}/")
        };
        Ok(self.base.join(&path)?.to_string())
    }

    fn content_marker(&self) -> &'static str {
        QUOTE_MARKER
    }

    #[instrument(level = "debug", skip(self, html))]
    fn extract(&self, html: &str, page: u32) -> Result<Extraction, ScrapeError> {
        let document = Html::parse_document(html);

        let mut blocks = 0usize;
        let mut records = Vec::new();
        for (index, quote) in document.select(&QUOTE).enumerate() {
            blocks += 1;
            let text = quote.select(&TEXT).next().map(element_text).unwrap_or_default();
            if text.is_empty() {
                debug!(index, "Dropping quote without text");
                continue;
            }
            records.push(Record::Quote(QuoteRecord {
                text,
                author: quote.select(&AUTHOR).next().map(element_text).unwrap_or_default(),
                tags: quote
                    .select(&TAG)
                    .map(element_text)
                    .filter(|tag| !tag.is_empty())
                    .collect(),
            }));
        }

        if blocks == 0 {
            return Err(ScrapeError::Extraction(format!(
                "no {QUOTE_MARKER} blocks on quotes page {page}"
            )));
        }

        let page = page.max(1);
        let has_next = document.select(&NEXT).next().is_some();
        Ok(Extraction {
            records,
            total_pages: if has_next { page.saturating_add(1) } else { page },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> QuotesExtractor {
        QuotesExtractor::new(Url::parse("http://quotes.toscrape.com").unwrap())
    }

    const PAGE: &str = r#"
        <div class="quote">
          <span class="text">“The world as we have created it is a process of our thinking.”</span>
          <span>by <small class="author">Albert Einstein</small></span>
          <div class="tags">Tags:
            <a class="tag" href="/tag/change/">change</a>
            <a class="tag" href="/tag/deep-thoughts/"> deep-thoughts </a>
          </div>
        </div>
        <div class="quote"><span class="text">   </span></div>
        <nav><ul class="pager"><li class="next"><a href="/page/2/">Next <span>→</span></a></li></ul></nav>"#;

    #[test]
    fn test_quotes_and_tags() {
        let out = extractor().extract(PAGE, 1).unwrap();
        assert_eq!(out.records.len(), 1);
        let Record::Quote(q) = &out.records[0] else {
            panic!("expected a quote record");
        };
        assert!(q.text.starts_with("“The world"));
        assert_eq!(q.author, "Albert Einstein");
        assert_eq!(q.tags, vec!["change", "deep-thoughts"]);
    }

    #[test]
    fn test_total_pages_follow_next_link() {
        assert_eq!(extractor().extract(PAGE, 1).unwrap().total_pages, 2);
        let last = r#"<div class="quote"><span class="text">End</span></div>"#;
        assert_eq!(extractor().extract(last, 10).unwrap().total_pages, 10);
    }

    #[test]
    fn test_total_pages_saturate_on_last_representable_page() {
        let out = extractor().extract(PAGE, u32::MAX).unwrap();
        assert_eq!(out.total_pages, u32::MAX);
    }

    #[test]
    fn test_page_url() {
        let e = extractor();
        assert_eq!(e.page_url(1).unwrap(), "http://quotes.toscrape.com/");
        assert_eq!(e.page_url(3).unwrap(), "http://quotes.toscrape.com/page/3/");
    }
}
