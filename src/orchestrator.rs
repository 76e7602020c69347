//! Fetch orchestration: cache first, scrape on miss, degrade on failure.
//!
//! Every call ends in one of three states:
//!
//! | State | When | Provenance | `fetchedAt` |
//! |-------|------|------------|-------------|
//! | Cache hit | snapshot younger than the TTL | `cache` | snapshot's |
//! | Scrape ok | miss or stale, extraction succeeded | `scrape` | now |
//! | Scrape failed | acquisition, navigation, wait or extraction failed | `error` | snapshot's, or now |
//!
//! A failed scrape serves the last snapshot for the key even when it is
//! stale; with no snapshot it returns an empty page with `totalPages: 0`.
//! Failures are logged here and never returned as errors.
//!
//! The scrape cycle runs on its own task: a caller that goes away does not
//! cancel an extraction already under way, and the render session is closed
//! on every path out of the cycle.
//!
//! Concurrent misses on the same key are not coalesced; both scrape and the
//! later write wins unless it carries an older timestamp.

use crate::cache::{is_fresh, Clock, FreshnessCache};
use crate::error::ScrapeError;
use crate::models::{CacheKey, FetchResult, Provenance, ResourceType, Snapshot};
use crate::render::{RenderSession, Renderer};
use crate::scrapers::{Extraction, Extractor};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

/// Timing knobs for the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// How long a snapshot is served without rescraping.
    pub ttl: Duration,
    /// Upper bound on loading the upstream page.
    pub navigation_timeout: Duration,
    /// Upper bound on waiting for the content marker.
    pub content_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5 * 60),
            navigation_timeout: Duration::from_secs(30),
            content_timeout: Duration::from_secs(10),
        }
    }
}

pub struct Orchestrator {
    cache: Arc<FreshnessCache>,
    renderer: Arc<dyn Renderer>,
    clock: Arc<dyn Clock>,
    extractors: HashMap<ResourceType, Arc<dyn Extractor>>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        cache: Arc<FreshnessCache>,
        renderer: Arc<dyn Renderer>,
        clock: Arc<dyn Clock>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            cache,
            renderer,
            clock,
            extractors: HashMap::new(),
            config,
        }
    }

    /// Register `extractor` for its resource, replacing any earlier one.
    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractors.insert(extractor.resource(), extractor);
        self
    }

    pub fn with_extractors(self, extractors: impl IntoIterator<Item = Arc<dyn Extractor>>) -> Self {
        extractors.into_iter().fold(self, Self::with_extractor)
    }

    /// Serve one page of `resource`, truncated to `limit` records.
    #[instrument(level = "info", skip(self, resource), fields(resource = %resource))]
    pub async fn fetch(&self, resource: ResourceType, page: u32, limit: u32) -> FetchResult {
        let key = CacheKey::new(resource, page);

        if let Some(snapshot) = self.cache.get(&key) {
            if is_fresh(&snapshot, self.clock.now(), self.config.ttl) {
                debug!(%key, fetched_at = %snapshot.fetched_at, "Cache hit");
                return FetchResult::from_snapshot(Provenance::Cache, &snapshot, page, limit);
            }
            debug!(%key, fetched_at = %snapshot.fetched_at, "Cached snapshot is stale");
        }

        let Some(extractor) = self.extractors.get(&resource).cloned() else {
            error!(%key, "No extractor registered for resource");
            return self.degraded(key, limit);
        };

        let t0 = Instant::now();
        match self.run_cycle(key, extractor).await {
            Ok(snapshot) => {
                info!(
                    %key,
                    records = snapshot.records.len(),
                    total_pages = snapshot.total_pages,
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "Scrape succeeded"
                );
                FetchResult::from_snapshot(Provenance::Scrape, &snapshot, page, limit)
            }
            Err(e) => {
                warn!(
                    %key,
                    error = %e,
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "Scrape failed; serving fallback"
                );
                self.degraded(key, limit)
            }
        }
    }

    /// Run one scrape cycle on its own task and cache what it produced.
    async fn run_cycle(
        &self,
        key: CacheKey,
        extractor: Arc<dyn Extractor>,
    ) -> Result<Snapshot, ScrapeError> {
        let renderer = Arc::clone(&self.renderer);
        let cache = Arc::clone(&self.cache);
        let clock = Arc::clone(&self.clock);
        let config = self.config;
        tokio::spawn(async move {
            let extraction = scrape(renderer, extractor, key.page, config).await?;
            let snapshot = Snapshot {
                records: extraction.records,
                total_pages: extraction.total_pages.max(1),
                fetched_at: clock.now(),
            };
            store(&cache, key, snapshot.clone());
            Ok::<_, ScrapeError>(snapshot)
        })
        .await
        .map_err(|e| ScrapeError::Aborted(e.to_string()))?
    }

    /// The error-path result: last snapshot if any, else an empty page.
    fn degraded(&self, key: CacheKey, limit: u32) -> FetchResult {
        match self.cache.get(&key) {
            Some(snapshot) => {
                info!(%key, fetched_at = %snapshot.fetched_at, "Serving last known snapshot");
                FetchResult::from_snapshot(Provenance::Error, &snapshot, key.page, limit)
            }
            None => FetchResult::empty_error(self.clock.now(), key.page, limit),
        }
    }
}

/// Write a fresh snapshot unless a newer one landed while we were scraping.
fn store(cache: &FreshnessCache, key: CacheKey, snapshot: Snapshot) {
    if !cache.put_if_newer(key, snapshot) {
        debug!(%key, "Newer snapshot already cached; keeping it");
    }
}

/// Acquire a session, drive it, and close it whatever the outcome.
async fn scrape(
    renderer: Arc<dyn Renderer>,
    extractor: Arc<dyn Extractor>,
    page: u32,
    config: OrchestratorConfig,
) -> Result<Extraction, ScrapeError> {
    let url = extractor.page_url(page)?;
    let mut session = renderer.acquire().await?;
    let outcome = drive(session.as_mut(), extractor.as_ref(), &url, page, &config).await;
    if let Err(e) = session.close().await {
        warn!(%url, error = %e, "Failed to close render session");
    }
    outcome
}

async fn drive(
    session: &mut dyn RenderSession,
    extractor: &dyn Extractor,
    url: &str,
    page: u32,
    config: &OrchestratorConfig,
) -> Result<Extraction, ScrapeError> {
    timeout(config.navigation_timeout, session.navigate(url))
        .await
        .map_err(|_| ScrapeError::NavigationTimeout {
            url: url.to_string(),
            timeout: config.navigation_timeout,
        })??;

    let marker = extractor.content_marker();
    timeout(config.content_timeout, session.wait_for(marker))
        .await
        .map_err(|_| ScrapeError::ContentTimeout {
            marker: marker.to_string(),
            timeout: config.content_timeout,
        })??;

    let html = session.content()?;
    extractor.extract(&html, page)
}
