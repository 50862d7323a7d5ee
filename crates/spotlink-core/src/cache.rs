//! In-memory TTL cache shared by every lookup kind.
//!
//! The TTL is supplied on read rather than on write, so one entry can be
//! judged fresh by a lenient reader and stale by a strict one. Expiry is lazy:
//! a stale entry is purged by the read that notices it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::clock::{Clock, SystemClock};

/// Values cached by the market data client.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    /// Every tradeable symbol on the exchange.
    SymbolSet(Arc<HashSet<String>>),
    /// Last traded price, decimal as string.
    Price(String),
    /// 24 hour ticker statistics, passed through verbatim.
    Ticker(Value),
}

/// The cache shared by resolver validation and market data lookups.
pub type MarketCache = TtlCache<CachedValue>;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    recorded_at: Instant,
    value: V,
}

/// Thread-safe TTL cache keyed by string.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: Arc<RwLock<HashMap<String, CacheEntry<V>>>>,
    clock: Arc<dyn Clock>,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Returns the value stored under `key` if it was recorded at most `ttl` ago.
    ///
    /// A stale entry is removed, so a later read with a longer TTL also misses.
    pub async fn get(&self, key: &str, ttl: Duration) -> Option<V> {
        {
            let entries = self.entries.read().await;
            let entry = entries.get(key)?;
            if self.is_fresh(entry, ttl) {
                return Some(entry.value.clone());
            }
        }

        let mut entries = self.entries.write().await;
        // A writer may have refreshed the entry between the two locks.
        match entries.get(key) {
            Some(entry) if self.is_fresh(entry, ttl) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub async fn set(&self, key: impl Into<String>, value: V) {
        let entry = CacheEntry {
            recorded_at: self.clock.now(),
            value,
        };
        self.entries.write().await.insert(key.into(), entry);
    }

    /// Number of entries currently held, stale ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    fn is_fresh(&self, entry: &CacheEntry<V>, ttl: Duration) -> bool {
        self.clock
            .now()
            .saturating_duration_since(entry.recorded_at)
            <= ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn manual_cache() -> (TtlCache<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (TtlCache::with_clock(clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_cache_basic_operations() {
        let (cache, _clock) = manual_cache();

        assert!(cache.get("key1", Duration::from_secs(5)).await.is_none());

        cache.set("key1", String::from("value1")).await;
        assert_eq!(
            cache.get("key1", Duration::from_secs(5)).await,
            Some(String::from("value1"))
        );

        cache.set("key1", String::from("value2")).await;
        assert_eq!(
            cache.get("key1", Duration::from_secs(5)).await,
            Some(String::from("value2"))
        );
    }

    #[tokio::test]
    async fn test_cache_entry_at_exact_ttl_is_fresh() {
        let (cache, clock) = manual_cache();
        cache.set("key1", String::from("value1")).await;

        clock.advance(Duration::from_secs(5));
        assert!(cache.get("key1", Duration::from_secs(5)).await.is_some());
    }

    #[tokio::test]
    async fn test_cache_expired_entry_is_purged() {
        let (cache, clock) = manual_cache();
        cache.set("key1", String::from("value1")).await;

        clock.advance(Duration::from_millis(5_001));
        assert!(cache.get("key1", Duration::from_secs(5)).await.is_none());
        assert_eq!(cache.len().await, 0);

        // Purged, so a more lenient reader misses too.
        assert!(cache.get("key1", Duration::from_secs(60)).await.is_none());
    }

    #[tokio::test]
    async fn test_cache_ttl_is_chosen_by_the_reader() {
        let (cache, clock) = manual_cache();
        cache.set("key1", String::from("value1")).await;
        clock.advance(Duration::from_secs(30));

        assert!(cache.get("key1", Duration::from_secs(60)).await.is_some());
        assert!(cache.get("key1", Duration::from_secs(10)).await.is_none());
    }

    #[tokio::test]
    async fn test_cache_set_restamps_entry() {
        let (cache, clock) = manual_cache();
        cache.set("key1", String::from("old")).await;
        clock.advance(Duration::from_secs(4));
        cache.set("key1", String::from("new")).await;
        clock.advance(Duration::from_secs(4));

        assert_eq!(
            cache.get("key1", Duration::from_secs(5)).await,
            Some(String::from("new"))
        );
    }

    #[tokio::test]
    async fn test_cache_clones_share_entries() {
        let (cache, _clock) = manual_cache();
        let other = cache.clone();

        other.set("key1", String::from("value1")).await;
        assert!(cache.get("key1", Duration::from_secs(1)).await.is_some());

        cache.clear().await;
        assert!(other.is_empty().await);
    }
}
