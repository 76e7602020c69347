//! Render sessions: the page-fetch capability behind the orchestrator.
//!
//! Defines the [`Renderer`] and [`RenderSession`] traits that abstract over
//! how an upstream page is loaded, plus [`HttpRenderer`], the default
//! implementation on top of `reqwest`.
//!
//! A session is disposable: acquire one per scrape attempt, navigate, wait
//! for the content marker, read the body, close. [`HttpSession`] also
//! releases itself on drop so a session can never outlive the attempt that
//! acquired it.

use crate::error::ScrapeError;
use crate::utils::truncate_for_log;
use async_trait::async_trait;
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use scraper::{Html, Selector};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, instrument};

/// Desktop Chrome user agent sent with every upstream request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Fixed locale so upstream dates and labels render the same way every time.
const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.9";

/// Something that can hand out disposable render sessions.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Acquire a fresh, isolated session.
    async fn acquire(&self) -> Result<Box<dyn RenderSession>, ScrapeError>;
    /// Number of sessions acquired and not yet released.
    fn active_sessions(&self) -> usize;
}

/// One isolated page-loading context.
#[async_trait]
pub trait RenderSession: Send {
    /// Load `url`. Callers bound this with their own timeout.
    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError>;
    /// Resolve once the loaded page contains an element matching `marker`.
    async fn wait_for(&mut self, marker: &str) -> Result<(), ScrapeError>;
    /// The loaded document's HTML.
    fn content(&self) -> Result<String, ScrapeError>;
    /// Release the session.
    async fn close(self: Box<Self>) -> Result<(), ScrapeError>;
}

/// Renderer that loads the HTML document over plain HTTP.
///
/// Only the document itself is requested, so images, fonts and media are
/// never downloaded. User agent and `Accept-Language` are fixed per renderer.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: reqwest::Client,
    active: Arc<AtomicUsize>,
}

impl HttpRenderer {
    pub fn new(user_agent: &str) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE),
        );
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            active: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn acquire(&self) -> Result<Box<dyn RenderSession>, ScrapeError> {
        let active = self.active.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(active, "Acquired render session");
        Ok(Box::new(HttpSession {
            client: self.client.clone(),
            page: None,
            active: Arc::clone(&self.active),
            released: false,
        }))
    }

    fn active_sessions(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }
}

/// A loaded page: where it came from and its body.
#[derive(Debug)]
struct LoadedPage {
    url: String,
    body: String,
}

/// Session handed out by [`HttpRenderer`].
#[derive(Debug)]
pub struct HttpSession {
    client: reqwest::Client,
    page: Option<LoadedPage>,
    active: Arc<AtomicUsize>,
    released: bool,
}

impl HttpSession {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            let remaining = self.active.fetch_sub(1, Ordering::Relaxed) - 1;
            debug!(active = remaining, "Released render session");
        }
    }
}

impl Drop for HttpSession {
    fn drop(&mut self) {
        self.release();
    }
}

#[async_trait]
impl RenderSession for HttpSession {
    #[instrument(level = "debug", skip(self))]
    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError> {
        let t0 = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                status,
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Loaded upstream page"
        );
        self.page = Some(LoadedPage {
            url: url.to_string(),
            body,
        });
        Ok(())
    }

    async fn wait_for(&mut self, marker: &str) -> Result<(), ScrapeError> {
        let page = self.page.as_ref().ok_or(ScrapeError::NotNavigated)?;
        if contains_marker(&page.body, marker)? {
            Ok(())
        } else {
            debug!(
                marker,
                body_preview = %truncate_for_log(&page.body, 300),
                "Content marker missing"
            );
            Err(ScrapeError::ContentMarkerMissing {
                marker: marker.to_string(),
                url: page.url.clone(),
            })
        }
    }

    fn content(&self) -> Result<String, ScrapeError> {
        self.page
            .as_ref()
            .map(|page| page.body.clone())
            .ok_or(ScrapeError::NotNavigated)
    }

    async fn close(mut self: Box<Self>) -> Result<(), ScrapeError> {
        self.page = None;
        self.release();
        Ok(())
    }
}

/// Whether `html` has at least one element matching the CSS selector `marker`.
pub fn contains_marker(html: &str, marker: &str) -> Result<bool, ScrapeError> {
    let selector = Selector::parse(marker).map_err(|_| ScrapeError::Selector(marker.to_string()))?;
    let document = Html::parse_document(html);
    Ok(document.select(&selector).next().is_some())
}
