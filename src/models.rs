//! Data models for scraped records, cached snapshots and fetch results.
//!
//! This module defines the core data structures used throughout the service:
//! - [`ResourceType`] and [`CacheKey`]: what is being asked for
//! - [`Record`]: one validated row extracted from an upstream page
//! - [`Snapshot`]: the cached output of one successful extraction
//! - [`FetchResult`]: the value handed back to the HTTP layer
//!
//! Record fields serialise in camelCase to match the public JSON envelope.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// The record categories the service knows how to scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Matches,
    Results,
    News,
    Quotes,
}

impl ResourceType {
    /// Stable lowercase name used in logs and cache keys.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Matches => "matches",
            ResourceType::Results => "results",
            ResourceType::News => "news",
            ResourceType::Quotes => "quotes",
        }
    }

    /// Page size used when the caller does not pass `limit`.
    pub fn default_limit(self) -> u32 {
        match self {
            ResourceType::Matches => 10,
            ResourceType::Results => 50,
            ResourceType::News => 30,
            ResourceType::Quotes => 10,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one cached snapshot: a resource and an upstream page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub resource: ResourceType,
    pub page: u32,
}

impl CacheKey {
    pub fn new(resource: ResourceType, page: u32) -> Self {
        Self { resource, page }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:page{}", self.resource, self.page)
    }
}

/// An upcoming or live match listed on the matches page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub date: String,
    pub team_a: String,
    pub region_a: String,
    pub team_b: String,
    pub region_b: String,
    /// Empty, or strict `H:MM` / `HH:MM`.
    pub time: String,
    pub event: String,
    pub status: String,
}

/// A completed match listed on the results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub date: String,
    pub team_a: String,
    pub region_a: String,
    pub team_b: String,
    pub region_b: String,
    pub score_a: String,
    pub score_b: String,
    pub time: String,
    pub event: String,
    pub status: String,
}

/// A news article teaser from the news listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsRecord {
    pub headline: String,
    pub short_desc: String,
    pub date: String,
    pub author: String,
    pub region: String,
}

/// A quote with its author and tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    pub text: String,
    pub author: String,
    pub tags: Vec<String>,
}

/// One validated record, tagged by the resource it came from.
///
/// Serialised untagged: the envelope already says which resource was asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Match(MatchRecord),
    Result(ResultRecord),
    News(NewsRecord),
    Quote(QuoteRecord),
}

/// The cached output of one successful extraction for one [`CacheKey`].
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Records in the order they appear on the upstream page.
    pub records: Vec<Record>,
    /// Always at least 1.
    pub total_pages: u32,
    pub fetched_at: DateTime<Utc>,
}

/// Where the data in a [`FetchResult`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Cache,
    Scrape,
    Error,
}

impl Provenance {
    pub fn as_str(self) -> &'static str {
        match self {
            Provenance::Cache => "cache",
            Provenance::Scrape => "scrape",
            Provenance::Error => "error",
        }
    }
}

/// The value returned to the HTTP layer for one request.
///
/// Serialises directly into the public response envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResult {
    #[serde(rename = "source")]
    pub provenance: Provenance,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub fetched_at: DateTime<Utc>,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub data: Vec<Record>,
}

impl FetchResult {
    /// Build a result from a snapshot, truncating its records to `limit`.
    pub fn from_snapshot(
        provenance: Provenance,
        snapshot: &Snapshot,
        page: u32,
        limit: u32,
    ) -> Self {
        Self {
            provenance,
            fetched_at: snapshot.fetched_at,
            page,
            limit,
            total_pages: snapshot.total_pages,
            data: truncate(&snapshot.records, limit),
        }
    }

    /// The degraded result used when a scrape fails and nothing is cached.
    pub fn empty_error(now: DateTime<Utc>, page: u32, limit: u32) -> Self {
        Self {
            provenance: Provenance::Error,
            fetched_at: now,
            page,
            limit,
            total_pages: 0,
            data: Vec::new(),
        }
    }
}

/// First `limit` records in page order, or all of them when `limit` covers the page.
pub fn truncate(records: &[Record], limit: u32) -> Vec<Record> {
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    records.iter().take(limit).cloned().collect()
}
