//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService, cache_key};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;
use tracing::{debug, info};

/// Redis cache implementation for fast URL lookups.
///
/// Uses `ConnectionManager` for connection reuse and transparent reconnects.
/// Errors are returned to the caller, which treats them as cache misses.
pub struct RedisCache {
    client: ConnectionManager,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            CacheError::Connection(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connection(format!("Failed to connect to Redis: {}", e)))?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::Connection(format!("Redis PING failed: {}", e)))?;

        info!("Connected to Redis");

        Ok(Self { client: manager })
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>> {
        let key = cache_key(short_code);
        let mut conn = self.client.clone();

        let url = conn.get::<_, Option<String>>(&key).await?;
        debug!(key, hit = url.is_some(), "Redis GET");
        Ok(url)
    }

    async fn set_url(
        &self,
        short_code: &str,
        original_url: &str,
        ttl: Duration,
    ) -> CacheResult<()> {
        let key = cache_key(short_code);
        let mut conn = self.client.clone();
        // SETEX rejects a zero TTL.
        let ttl_seconds = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(&key, original_url, ttl_seconds)
            .await?;
        debug!(key, ttl_seconds, "Redis SETEX");
        Ok(())
    }

    async fn invalidate(&self, short_code: &str) -> CacheResult<()> {
        let key = cache_key(short_code);
        let mut conn = self.client.clone();

        let deleted = conn.del::<_, i32>(&key).await?;
        if deleted > 0 {
            debug!(key, "Redis DEL");
        }
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
