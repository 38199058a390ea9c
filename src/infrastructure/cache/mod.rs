//! Caching layer for fast redirect lookups.
//!
//! Provides the [`CacheService`] trait and its Redis implementation
//! [`RedisCache`]. A deployment without Redis simply has no cache; callers
//! hold an `Option<Arc<dyn CacheService>>` and branch on presence.

mod redis_cache;
mod service;

pub use redis_cache::RedisCache;
pub use service::{CacheError, CacheResult, CacheService, cache_key};

#[cfg(test)]
pub use service::MockCacheService;
