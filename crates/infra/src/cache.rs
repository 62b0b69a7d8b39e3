//! Time-bounded memo in front of the stock engine.
//!
//! Entries are keyed by everything that can change a result: series kind,
//! location, simulation and the correction set revision. A correction write
//! therefore misses the cache on its own; ledger imports and simulation edits
//! are picked up when entries expire or after [`CachedStockEngine::invalidate`].

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use railstock_core::{Location, SimulationId};
use railstock_stock::StockPoint;

use crate::config::CacheConfig;
use crate::engine::{SimulationOverlay, StockEngine, StockQuery};
use crate::error::EngineError;
use crate::sources::{CorrectionStore, MovementSource, SimulationStore};

/// Keyed memo whose entries expire `ttl` after insertion.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, (Instant, V)>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Fresh value for `key`, if any. A poisoned lock reads as a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().ok()?;
        let (stored_at, value) = entries.get(key)?;
        (stored_at.elapsed() < self.ttl).then(|| value.clone())
    }

    pub fn insert(&self, key: K, value: V) {
        if let Ok(mut entries) = self.entries.write() {
            let ttl = self.ttl;
            entries.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);
            entries.insert(key, (Instant::now(), value));
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesKind {
    Base,
    Corrected,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: SeriesKind,
    pub location: Option<Location>,
    pub simulation_id: Option<SimulationId>,
    pub corrections_version: u64,
}

/// [`StockEngine`] with memoized results.
///
/// Draft simulations are never cached: their events are not part of the key.
/// With caching disabled every call goes straight to the engine.
#[derive(Debug)]
pub struct CachedStockEngine<M, C, S> {
    engine: StockEngine<M, C, S>,
    cache: Option<TtlCache<CacheKey, Vec<StockPoint>>>,
}

impl<M, C, S> CachedStockEngine<M, C, S>
where
    M: MovementSource,
    C: CorrectionStore,
    S: SimulationStore,
{
    pub fn new(engine: StockEngine<M, C, S>, config: &CacheConfig) -> Self {
        Self {
            engine,
            cache: config.enabled.then(|| TtlCache::new(config.ttl())),
        }
    }

    pub fn engine(&self) -> &StockEngine<M, C, S> {
        &self.engine
    }

    pub fn compute_base_stock(&self, location: Option<&Location>) -> Result<Vec<StockPoint>, EngineError> {
        let key = CacheKey {
            kind: SeriesKind::Base,
            location: location.cloned(),
            simulation_id: None,
            corrections_version: 0,
        };
        self.memo(key, || self.engine.compute_base_stock(location))
    }

    pub fn compute_corrected_stock(
        &self,
        location: Option<&Location>,
        simulation: Option<&SimulationOverlay>,
    ) -> Result<Vec<StockPoint>, EngineError> {
        let simulation_id = match simulation {
            None => None,
            Some(SimulationOverlay::Stored(id)) => Some(*id),
            Some(SimulationOverlay::Draft { .. }) => {
                return self.engine.compute_corrected_stock(location, simulation);
            }
        };
        let key = CacheKey {
            kind: SeriesKind::Corrected,
            location: location.cloned(),
            simulation_id,
            corrections_version: self.engine.corrections_version(),
        };
        self.memo(key, || self.engine.compute_corrected_stock(location, simulation))
    }

    pub fn query(&self, query: &StockQuery) -> Result<Vec<StockPoint>, EngineError> {
        self.compute_corrected_stock(query.location.as_ref(), query.simulation.as_ref())
    }

    /// Drop every memoized series.
    pub fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
            tracing::debug!("stock cache cleared");
        }
    }

    fn memo(
        &self,
        key: CacheKey,
        compute: impl FnOnce() -> Result<Vec<StockPoint>, EngineError>,
    ) -> Result<Vec<StockPoint>, EngineError> {
        let Some(cache) = &self.cache else {
            return compute();
        };
        if let Some(points) = cache.get(&key) {
            tracing::debug!(?key, "stock cache hit");
            return Ok(points);
        }
        let points = compute()?;
        cache.insert(key, points.clone());
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_expire_after_ttl() {
        let cache: TtlCache<&str, i64> = TtlCache::new(Duration::from_millis(20));
        cache.insert("a", 1);
        assert_eq!(cache.get(&"a"), Some(1));
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get(&"a"), None);
    }

    #[test]
    fn insert_evicts_expired_entries() {
        let cache: TtlCache<&str, i64> = TtlCache::new(Duration::from_millis(20));
        cache.insert("old", 1);
        std::thread::sleep(Duration::from_millis(40));
        cache.insert("new", 2);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn keys_differ_by_correction_revision() {
        let cache: TtlCache<CacheKey, i64> = TtlCache::new(Duration::from_secs(60));
        let key = |corrections_version| CacheKey {
            kind: SeriesKind::Corrected,
            location: Some(Location::new("AMB")),
            simulation_id: None,
            corrections_version,
        };
        cache.insert(key(1), 10);
        assert_eq!(cache.get(&key(1)), Some(10));
        assert_eq!(cache.get(&key(2)), None);
    }
}
