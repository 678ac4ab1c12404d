use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};

use lru::LruCache;
use tracing::{trace, warn};

use crate::models::{CacheKey, SymbolRecord};
use crate::store::WarmStore;

/// Which tier answered a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    Hot,
    Warm,
}

/// Bounded in-process LRU in front of the persistent warm store. Only
/// verified records are held; misses are never memoised.
pub struct TieredCache {
    hot: Mutex<LruCache<CacheKey, SymbolRecord>>,
    warm: WarmStore,
}

impl TieredCache {
    pub fn new(warm: WarmStore, hot_capacity: NonZeroUsize) -> Self {
        Self {
            hot: Mutex::new(LruCache::new(hot_capacity)),
            warm,
        }
    }

    /// Hot tier first, then warm; a warm hit is promoted into the hot tier.
    /// A failing warm read is logged and reported as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<(SymbolRecord, CacheTier)> {
        if let Some(record) = self.hot().get(key) {
            trace!(stage = "cache", event = "cache.hot.hit", symbol = %key.name, "hot tier hit");
            return Some((record.clone(), CacheTier::Hot));
        }

        match self.warm.get(key) {
            Ok(Some(record)) => {
                trace!(stage = "cache", event = "cache.warm.hit", symbol = %key.name, "warm tier hit");
                self.hot().put(key.clone(), record.clone());
                Some((record, CacheTier::Warm))
            }
            Ok(None) => None,
            Err(err) => {
                warn!(
                    stage = "cache",
                    event = "cache.warm.get",
                    result = "fail",
                    sha = %key.content_hash,
                    symbol = %key.name,
                    error = %err,
                    "warm tier read failed"
                );
                None
            }
        }
    }

    /// Insert-or-replace into the warm tier, then drop the key from the hot
    /// tier so the next read observes the stored row.
    pub fn put(&self, key: &CacheKey, record: &SymbolRecord) {
        if let Err(err) = self.warm.put(key, record) {
            warn!(
                stage = "cache",
                event = "cache.warm.put",
                result = "fail",
                sha = %key.content_hash,
                symbol = %key.name,
                error = %err,
                "warm tier write failed"
            );
        }
        self.hot().pop(key);
    }

    pub fn clear_hot(&self) {
        self.hot().clear();
    }

    pub fn hot_len(&self) -> usize {
        self.hot().len()
    }

    fn hot(&self) -> std::sync::MutexGuard<'_, LruCache<CacheKey, SymbolRecord>> {
        self.hot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
