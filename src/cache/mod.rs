//! # Response Caching Module
//!
//! In-process cache of generated responses, keyed by normalized prompt text.
//!
//! Entries have no TTL and no size bound; they live until the process exits.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CacheManager`] | Prompt-level `get`/`set` with hit/miss statistics |
//! | [`CacheBackend`] | Trait for cache stores |
//! | [`MemoryCache`] | `RwLock`-guarded map, shared readers, exclusive writers |
//! | [`NullCache`] | No-op cache for disabling caching |
//! | [`CacheKey`] | Trimmed, case-folded prompt text |
//!
//! ## Example
//!
//! ```rust
//! use promptme::cache::CacheManager;
//!
//! let cache = CacheManager::default();
//! cache.set(" Foo ", "bar");
//! assert_eq!(cache.get("foo").as_deref(), Some("bar"));
//! assert_eq!(cache.get("nonexistent"), None);
//! ```

mod backend;
mod key;
mod manager;

pub use backend::{CacheBackend, MemoryCache, NullCache};
pub use key::CacheKey;
pub use manager::{CacheManager, CacheStats};
