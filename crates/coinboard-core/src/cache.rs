//! In-memory cache of normalized records.
//!
//! Entries are keyed by the canonical [`CacheKey`] of their logical query and
//! expire lazily: a lookup at `now` returns an entry only while
//! `now - fetched_at < ttl`. Nothing is swept in the background.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::clock::Clock;
use crate::query::{CacheKey, LogicalQuery};
use crate::NormalizedRecord;

/// Stored result of one successful fetch. Replaced on refetch, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub query: LogicalQuery,
    pub payload: NormalizedRecord,
    pub fetched_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) < self.ttl
    }

    /// Time left before expiry, zero once stale.
    pub fn remaining_at(&self, now: Instant) -> Duration {
        (self.fetched_at + self.ttl).saturating_duration_since(now)
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    map: HashMap<CacheKey, CacheEntry>,
}

impl CacheInner {
    fn get(&self, key: &CacheKey, now: Instant) -> Option<CacheEntry> {
        self.map
            .get(key)
            .filter(|entry| entry.is_fresh_at(now))
            .cloned()
    }

    fn put(&mut self, entry: CacheEntry) {
        self.map.insert(entry.query.cache_key(), entry);
    }

    fn clear_expired(&mut self, now: Instant) {
        self.map.retain(|_, entry| entry.is_fresh_at(now));
    }
}

/// Thread-safe response cache sharing one clock with the rest of the pipeline.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Arc<RwLock<CacheInner>>,
    clock: Arc<dyn Clock>,
}

impl ResponseCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner::default())),
            clock,
        }
    }

    /// Returns the entry for `query` if one exists and has not expired.
    pub async fn get(&self, query: &LogicalQuery) -> Option<CacheEntry> {
        let now = self.clock.now();
        let store = self.inner.read().await;
        store.get(&query.cache_key(), now)
    }

    /// Stores `payload` for `query`, replacing any previous entry.
    ///
    /// A zero `ttl` stores nothing.
    pub async fn put(&self, query: LogicalQuery, payload: NormalizedRecord, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }

        let entry = CacheEntry {
            query,
            payload,
            fetched_at: self.clock.now(),
            ttl,
        };
        self.inner.write().await.put(entry);
    }

    pub async fn clear_expired(&self) {
        let now = self.clock.now();
        self.inner.write().await.clear_expired(now);
    }

    pub async fn clear(&self) {
        self.inner.write().await.map.clear();
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache").finish_non_exhaustive()
    }
}
