use crate::core::clock::{Clock, SystemClock};
use crate::core::config::DEFAULT_CACHE_TTL_SECONDS;
use crate::core::types::TickerSnapshot;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// A cached snapshot and the time it was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub snapshot: TickerSnapshot,
    pub inserted_at: DateTime<Utc>,
}

/// Symbol-keyed ticker cache with a freshness TTL.
///
/// Entries are overwritten on every successful fetch and never evicted, so an
/// expired entry stays available as a stale fallback.
pub struct MarketDataCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for MarketDataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketDataCache")
            .field("entries", &self.entries.len())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl MarketDataCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self::new(ttl, Arc::new(SystemClock))
    }

    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, symbol: &str) -> Option<CacheEntry> {
        self.entries
            .get(&cache_key(symbol))
            .map(|entry| entry.value().clone())
    }

    /// Store `snapshot`, replacing any previous entry (last write wins)
    pub fn put(&self, symbol: &str, snapshot: TickerSnapshot) {
        let entry = CacheEntry {
            snapshot,
            inserted_at: self.clock.now(),
        };
        self.entries.insert(cache_key(symbol), entry);
    }

    pub fn is_fresh(&self, entry: &CacheEntry) -> bool {
        self.clock.now() - entry.inserted_at < self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MarketDataCache {
    fn default() -> Self {
        Self::with_ttl(Duration::seconds(DEFAULT_CACHE_TTL_SECONDS as i64))
    }
}

fn cache_key(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}
