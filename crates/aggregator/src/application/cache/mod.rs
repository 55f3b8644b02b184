//! Read-through cache in front of the holdings and trade queries.
//!
//! Entries are immutable `Arc<[T]>` snapshots. Coherence with the store is
//! kept by explicit invalidation plus per-entity generation stamps:
//!
//! 1. A fill records the generation of its scope observed *before* the
//!    store read starts.
//! 2. `invalidate(entity)` bumps that entity's generation, then evicts every
//!    key scoped to the entity or to `all`.
//! 3. A lookup only hits when the entry's stamp equals the current
//!    generation of its scope.
//!
//! A fill that raced with a write therefore carries an old stamp and is
//! never served after the write's invalidation returns. Concurrent misses
//! for the same key are not coalesced; each performs its own store read.
//! The cache never talks to the store: callers pass the fill future.

mod generation;
mod keys;
mod snapshot;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use holdings_core::{Entity, Holding, Trade};
use tracing::trace;

pub use generation::Generations;
pub use keys::{HoldingsKey, ScopedKey, TradesKey};

use snapshot::SnapshotMap;

/// Point-in-time cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
    pub evictions: u64,
    pub entries: usize,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
    evictions: AtomicU64,
}

pub struct QueryCache {
    generations: Generations,
    holdings: SnapshotMap<HoldingsKey, Holding>,
    trades: SnapshotMap<TradesKey, Trade>,
    counters: Counters,
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            generations: Generations::new(),
            holdings: SnapshotMap::new(),
            trades: SnapshotMap::new(),
            counters: Counters::default(),
        }
    }

    /// Cached holdings for `key`, or the result of `fill` on a miss
    pub async fn holdings<F, Fut, E>(&self, key: HoldingsKey, fill: F) -> Result<Arc<[Holding]>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Holding>, E>>,
    {
        self.read_through(&self.holdings, key, fill).await
    }

    /// Cached trade page for `key`, or the result of `fill` on a miss
    pub async fn trades<F, Fut, E>(&self, key: TradesKey, fill: F) -> Result<Arc<[Trade]>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Trade>, E>>,
    {
        self.read_through(&self.trades, key, fill).await
    }

    /// Currently valid holdings entry, without filling
    pub fn peek_holdings(&self, key: &HoldingsKey) -> Option<Arc<[Holding]>> {
        self.holdings.get(key, self.generations.stamp(key.scope()))
    }

    /// Currently valid trades entry, without filling
    pub fn peek_trades(&self, key: &TradesKey) -> Option<Arc<[Trade]>> {
        self.trades.get(key, self.generations.stamp(key.scope()))
    }

    /// Mark everything a trade for `entity` could affect as stale.
    ///
    /// Must be called after the write is durable.
    pub fn invalidate(&self, entity: Entity) {
        self.generations.bump(entity);
        let evicted = self.holdings.evict(entity) + self.trades.evict(entity);

        self.counters.invalidations.fetch_add(1, Ordering::Relaxed);
        self.counters
            .evictions
            .fetch_add(evicted as u64, Ordering::Relaxed);
        trace!(entity = %entity, evicted, "cache invalidated");
    }

    /// Invalidate every entity and drop all entries
    pub fn invalidate_all(&self) {
        for entity in Entity::ALL {
            self.generations.bump(entity);
        }
        let evicted = self.holdings.len() + self.trades.len();
        self.holdings.clear();
        self.trades.clear();

        self.counters.invalidations.fetch_add(1, Ordering::Relaxed);
        self.counters
            .evictions
            .fetch_add(evicted as u64, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            invalidations: self.counters.invalidations.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            entries: self.holdings.len() + self.trades.len(),
        }
    }

    async fn read_through<K, T, F, Fut, E>(
        &self,
        map: &SnapshotMap<K, T>,
        key: K,
        fill: F,
    ) -> Result<Arc<[T]>, E>
    where
        K: ScopedKey,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        // Stamp before reading so a concurrent write makes this fill stale
        let stamp = self.generations.stamp(key.scope());
        if let Some(rows) = map.get(&key, stamp) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(rows);
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);

        let rows: Arc<[T]> = fill().await?.into();
        map.put(key, stamp, Arc::clone(&rows));
        Ok(rows)
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdings_core::{EntityScope, HoldingKey, InstrumentType, Symbol, TradeLimit};
    use rust_decimal_macros::dec;
    use std::convert::Infallible;

    fn holding(entity: Entity, symbol: &str) -> Holding {
        Holding::new(
            HoldingKey::new(entity, InstrumentType::Stock, Symbol::new(symbol).unwrap()),
            dec!(1),
        )
    }

    async fn fill_holdings(
        cache: &QueryCache,
        key: HoldingsKey,
        rows: Vec<Holding>,
    ) -> Arc<[Holding]> {
        cache
            .holdings(key, || async move { Ok::<_, Infallible>(rows) })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_second_read_is_hit() {
        let cache = QueryCache::new();
        let key = HoldingsKey::all();

        fill_holdings(&cache, key, vec![holding(Entity::Zurich, "AAPL")]).await;
        let rows = fill_holdings(&cache, key, vec![]).await;

        assert_eq!(rows.len(), 1);
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_empty_result_is_cached() {
        let cache = QueryCache::new();
        let key = HoldingsKey::entity(Entity::NewYork);

        let first = fill_holdings(&cache, key, vec![]).await;
        assert!(first.is_empty());
        assert!(cache.peek_holdings(&key).is_some());

        let second = fill_holdings(&cache, key, vec![holding(Entity::NewYork, "X")]).await;
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_fill_error_is_not_cached() {
        let cache = QueryCache::new();
        let key = HoldingsKey::all();

        let result = cache
            .holdings(key, || async { Err::<Vec<Holding>, _>("boom") })
            .await;
        assert_eq!(result.unwrap_err(), "boom");
        assert!(cache.peek_holdings(&key).is_none());
    }

    #[tokio::test]
    async fn test_invalidate_evicts_entity_and_all_scopes() {
        let cache = QueryCache::new();
        let all = HoldingsKey::all();
        let zurich = HoldingsKey::entity(Entity::Zurich);
        let new_york = HoldingsKey::entity(Entity::NewYork);
        let zurich_trades = TradesKey::new(EntityScope::Entity(Entity::Zurich), TradeLimit::default());

        fill_holdings(&cache, all, vec![]).await;
        fill_holdings(&cache, zurich, vec![]).await;
        fill_holdings(&cache, new_york, vec![]).await;
        cache
            .trades(zurich_trades, || async { Ok::<_, Infallible>(vec![]) })
            .await
            .unwrap();

        cache.invalidate(Entity::Zurich);

        assert!(cache.peek_holdings(&all).is_none());
        assert!(cache.peek_holdings(&zurich).is_none());
        assert!(cache.peek_trades(&zurich_trades).is_none());
        assert!(cache.peek_holdings(&new_york).is_some());
        assert_eq!(cache.stats().invalidations, 1);
        assert_eq!(cache.stats().evictions, 3);
    }

    #[tokio::test]
    async fn test_fill_racing_with_invalidation_is_never_served() {
        let cache = QueryCache::new();
        let key = HoldingsKey::all();

        // The write lands while the fill is reading the old state
        let stale = cache
            .holdings(key, || async {
                cache.invalidate(Entity::Zurich);
                Ok::<_, Infallible>(vec![])
            })
            .await
            .unwrap();
        assert!(stale.is_empty());

        assert!(cache.peek_holdings(&key).is_none());
        let fresh = fill_holdings(&cache, key, vec![holding(Entity::Zurich, "AAPL")]).await;
        assert_eq!(fresh.len(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_all_clears_everything() {
        let cache = QueryCache::new();
        fill_holdings(&cache, HoldingsKey::all(), vec![]).await;
        fill_holdings(&cache, HoldingsKey::entity(Entity::NewYork), vec![]).await;

        cache.invalidate_all();

        assert_eq!(cache.stats().entries, 0);
        assert!(cache.peek_holdings(&HoldingsKey::all()).is_none());
    }
}
