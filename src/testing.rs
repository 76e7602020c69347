//! Fakes shared by unit tests: a hand-driven clock, a scriptable renderer
//! and an extractor that returns a fixed number of records.

use crate::cache::Clock;
use crate::error::ScrapeError;
use crate::models::{QuoteRecord, Record, ResourceType};
use crate::render::{RenderSession, Renderer};
use crate::scrapers::{Extraction, Extractor};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new() -> Self {
        Self(Mutex::new(Utc.timestamp_opt(1_700_000_000, 0).unwrap()))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now += TimeDelta::from_std(by).unwrap();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// How the next [`FakeRenderer`] session behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Serve,
    FailAcquire,
    FailNavigate,
    HangNavigate,
    HangWait,
}

pub struct FakeRenderer {
    behavior: Mutex<Behavior>,
    delay: Mutex<Duration>,
    acquired: AtomicUsize,
    active: Arc<AtomicUsize>,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self {
            behavior: Mutex::new(Behavior::Serve),
            delay: Mutex::new(Duration::ZERO),
            acquired: AtomicUsize::new(0),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Make every navigation take this long before succeeding.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn acquire(&self) -> Result<Box<dyn RenderSession>, ScrapeError> {
        let behavior = *self.behavior.lock().unwrap();
        if behavior == Behavior::FailAcquire {
            return Err(ScrapeError::Aborted("browser failed to launch".to_string()));
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        self.active.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            behavior,
            delay: *self.delay.lock().unwrap(),
            active: Arc::clone(&self.active),
            loaded: false,
        }))
    }

    fn active_sessions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

struct FakeSession {
    behavior: Behavior,
    delay: Duration,
    active: Arc<AtomicUsize>,
    loaded: bool,
}

#[async_trait]
impl RenderSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError> {
        tokio::task::yield_now().await;
        match self.behavior {
            Behavior::FailNavigate => Err(ScrapeError::Aborted(format!("net::ERR_FAILED {url}"))),
            Behavior::HangNavigate => std::future::pending().await,
            _ => {
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                self.loaded = true;
                Ok(())
            }
        }
    }

    async fn wait_for(&mut self, _marker: &str) -> Result<(), ScrapeError> {
        if self.behavior == Behavior::HangWait {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    fn content(&self) -> Result<String, ScrapeError> {
        if self.loaded {
            Ok("<html></html>".to_string())
        } else {
            Err(ScrapeError::NotNavigated)
        }
    }

    async fn close(self: Box<Self>) -> Result<(), ScrapeError> {
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Extractor that ignores the page and yields `count` quote records.
pub struct FixedExtractor {
    count: usize,
    fail: AtomicBool,
    generation: AtomicUsize,
}

impl FixedExtractor {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            fail: AtomicBool::new(false),
            generation: AtomicUsize::new(0),
        }
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl Extractor for FixedExtractor {
    fn resource(&self) -> ResourceType {
        ResourceType::Quotes
    }

    fn page_url(&self, page: u32) -> Result<String, ScrapeError> {
        Ok(format!("http://fake.test/page/{page}/"))
    }

    fn content_marker(&self) -> &'static str {
        ".quote"
    }

    fn extract(&self, _html: &str, _page: u32) -> Result<Extraction, ScrapeError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ScrapeError::Extraction("layout changed".to_string()));
        }
        // Records differ per extraction so tests can tell a rescrape apart.
        let generation = self.generation.fetch_add(1, Ordering::SeqCst);
        let records = (0..self.count)
            .map(|i| {
                Record::Quote(QuoteRecord {
                    text: format!("quote {i}"),
                    author: format!("author {generation}"),
                    tags: vec![],
                })
            })
            .collect();
        Ok(Extraction {
            records,
            total_pages: 3,
        })
    }
}
