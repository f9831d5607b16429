//! Cache manager.

use super::backend::{CacheBackend, MemoryCache, NullCache};
use super::key::CacheKey;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
}

impl AtomicStats {
    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
        }
    }
}

/// Response cache keyed by normalized prompt text.
///
/// Callers pass raw prompt text; normalization happens here so the backend never
/// sees an unnormalized key.
pub struct CacheManager {
    backend: Arc<dyn CacheBackend>,
    stats: AtomicStats,
}

impl CacheManager {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            stats: AtomicStats::default(),
        }
    }

    /// In-memory cache when `enabled`, otherwise a no-op cache.
    pub fn with_enabled(enabled: bool) -> Self {
        if enabled {
            Self::new(Arc::new(MemoryCache::new()))
        } else {
            Self::new(Arc::new(NullCache::new()))
        }
    }

    pub fn get(&self, prompt: &str) -> Option<String> {
        let value = self.backend.get(&CacheKey::new(prompt));
        let counter = if value.is_some() {
            &self.stats.hits
        } else {
            &self.stats.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        value
    }

    pub fn set(&self, prompt: &str, value: impl Into<String>) {
        self.backend.set(CacheKey::new(prompt), value.into());
        self.stats.sets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.backend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backend.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::with_enabled(true)
    }
}
