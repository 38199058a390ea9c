//! Cache service trait and error types.

use async_trait::async_trait;
use std::time::Duration;

/// Namespace prefix for link entries.
pub const KEY_PREFIX: &str = "link:";

/// Builds the cache key for a shortcode, e.g. `link:abc123`.
pub fn cache_key(short_code: &str) -> String {
    format!("{KEY_PREFIX}{short_code}")
}

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(String),

    #[error("Cache operation error: {0}")]
    Operation(#[from] redis::RedisError),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Trait for caching shortcode to URL mappings.
///
/// Implementations report failures honestly; the link service decides that a
/// failing cache degrades to store-only operation.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves the destination URL cached for a shortcode.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(url))` on cache hit
    /// - `Ok(None)` on cache miss
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the backend is unreachable or misbehaving.
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>>;

    /// Stores a mapping that expires after `ttl`.
    async fn set_url(&self, short_code: &str, original_url: &str, ttl: Duration)
    -> CacheResult<()>;

    /// Removes a cached mapping. Removing an absent key is not an error.
    async fn invalidate(&self, short_code: &str) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    ///
    /// Used by the health endpoint to report cache status.
    async fn health_check(&self) -> bool;
}
