//! Freshness cache: last successful snapshot per `(resource, page)`.
//!
//! Uses `DashMap` so concurrent requests for different keys never contend.
//! The cache is a plain store: freshness is judged by comparing one
//! timestamp, and the orchestrator decides when to write.
//!
//! Time is read through [`Clock`] so callers and tests agree on "now".

use crate::models::{CacheKey, Snapshot};
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// In-memory snapshot store keyed by [`CacheKey`].
#[derive(Debug, Default)]
pub struct FreshnessCache {
    entries: DashMap<CacheKey, Arc<Snapshot>>,
}

impl FreshnessCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The snapshot stored for `key`, fresh or not.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<Snapshot>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Store `snapshot` under `key`, replacing whatever was there.
    #[allow(dead_code)]
    pub fn put(&self, key: CacheKey, snapshot: Snapshot) {
        self.entries.insert(key, Arc::new(snapshot));
    }

    /// Store `snapshot` unless `key` already holds a strictly newer one.
    ///
    /// The comparison and the write happen under the entry's shard lock, so
    /// concurrent writers for one key can never leave the older snapshot in
    /// place. Returns whether the write happened.
    pub fn put_if_newer(&self, key: CacheKey, snapshot: Snapshot) -> bool {
        match self.entries.entry(key) {
            Entry::Occupied(mut entry) => {
                if entry.get().fetched_at > snapshot.fetched_at {
                    return false;
                }
                entry.insert(Arc::new(snapshot));
                true
            }
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(snapshot));
                true
            }
        }
    }

    /// Remove every entry older than `max_age` at `now`; returns how many went.
    pub fn evict_older_than(&self, max_age: Duration, now: DateTime<Utc>) -> usize {
        let max_age = to_delta(max_age);
        let before = self.entries.len();
        self.entries
            .retain(|_, snapshot| now.signed_duration_since(snapshot.fetched_at) <= max_age);
        let evicted = before.saturating_sub(self.entries.len());
        debug!(evicted, remaining = self.entries.len(), "Cache sweep finished");
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether `snapshot` is younger than `ttl` at `now`.
pub fn is_fresh(snapshot: &Snapshot, now: DateTime<Utc>, ttl: Duration) -> bool {
    now.signed_duration_since(snapshot.fetched_at) < to_delta(ttl)
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceType;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn snapshot(fetched_at: DateTime<Utc>) -> Snapshot {
        Snapshot {
            records: vec![],
            total_pages: 1,
            fetched_at,
        }
    }

    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn test_get_put_overwrite() {
        let cache = FreshnessCache::new();
        let key = CacheKey::new(ResourceType::News, 1);
        assert!(cache.get(&key).is_none());

        cache.put(key, snapshot(at(0)));
        cache.put(key, snapshot(at(10)));
        assert_eq!(cache.get(&key).unwrap().fetched_at, at(10));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let cache = FreshnessCache::new();
        cache.put(CacheKey::new(ResourceType::News, 1), snapshot(at(0)));
        assert!(cache.get(&CacheKey::new(ResourceType::News, 2)).is_none());
        assert!(cache.get(&CacheKey::new(ResourceType::Matches, 1)).is_none());
    }

    #[test]
    fn test_is_fresh_boundary() {
        let s = snapshot(at(0));
        assert!(is_fresh(&s, at(0), TTL));
        assert!(is_fresh(&s, at(299), TTL));
        assert!(!is_fresh(&s, at(300), TTL));
        assert!(!is_fresh(&s, at(1_000), TTL));
    }

    #[test]
    fn test_evict_older_than() {
        let cache = FreshnessCache::new();
        cache.put(CacheKey::new(ResourceType::Matches, 1), snapshot(at(0)));
        cache.put(CacheKey::new(ResourceType::Matches, 2), snapshot(at(200)));
        cache.put(CacheKey::new(ResourceType::Results, 1), snapshot(at(400)));

        let evicted = cache.evict_older_than(TTL, at(550));
        assert_eq!(evicted, 1);
        assert!(cache.get(&CacheKey::new(ResourceType::Matches, 1)).is_none());
        assert!(cache.get(&CacheKey::new(ResourceType::Matches, 2)).is_some());
        assert!(cache.get(&CacheKey::new(ResourceType::Results, 1)).is_some());

        assert_eq!(cache.evict_older_than(TTL, at(10_000)), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_if_newer_keeps_newest() {
        let cache = FreshnessCache::new();
        let key = CacheKey::new(ResourceType::Quotes, 1);

        assert!(cache.put_if_newer(key, snapshot(at(20))));
        assert!(!cache.put_if_newer(key, snapshot(at(10))));
        assert_eq!(cache.get(&key).unwrap().fetched_at, at(20));

        assert!(cache.put_if_newer(key, snapshot(at(20))));
        assert!(cache.put_if_newer(key, snapshot(at(30))));
        assert_eq!(cache.get(&key).unwrap().fetched_at, at(30));
    }

    #[test]
    fn test_put_if_newer_under_contention() {
        let cache = Arc::new(FreshnessCache::new());
        let key = CacheKey::new(ResourceType::Matches, 1);

        let writers: Vec<_> = (0..16)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for round in 0..100 {
                        cache.put_if_newer(key, snapshot(at((round * 16 + i) % 997)));
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let newest = (0..16)
            .flat_map(|i| (0..100).map(move |round| (round * 16 + i) % 997))
            .max()
            .unwrap();
        assert_eq!(cache.get(&key).unwrap().fetched_at, at(newest));
    }
}
