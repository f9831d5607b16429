//! Cache backend implementations.

use super::key::CacheKey;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Store for generated responses.
///
/// Operations cannot fail: a miss is reported as `None`.
pub trait CacheBackend: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<String>;
    fn set(&self, key: CacheKey, value: String);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn name(&self) -> &'static str;
}

/// Unbounded in-memory cache that lives for the process lifetime.
///
/// Readers share the lock; a write holds it exclusively for the single insert.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<CacheKey, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheBackend for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<String> {
        // Inserts are a single HashMap::insert; poisoning never leaves a partial value.
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    fn set(&self, key: CacheKey, value: String) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, value);
    }

    fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// No-op cache used when caching is disabled.
#[derive(Debug, Default)]
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        Self
    }
}

impl CacheBackend for NullCache {
    fn get(&self, _: &CacheKey) -> Option<String> {
        None
    }
    fn set(&self, _: CacheKey, _: String) {}
    fn len(&self) -> usize {
        0
    }
    fn name(&self) -> &'static str {
        "null"
    }
}
