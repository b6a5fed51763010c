//! Redis cache module.
//!
//! Wraps a `redis::Client` with the small set of operations the services
//! need: get/set with TTL, delete, and a health check.

use crate::error::{CacheError, CacheResult};
use redis::{AsyncCommands, Client};
use tracing::info;

/// Configuration for Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

impl RedisConfig {
    /// Create a new RedisConfig from environment variables
    ///
    /// # Environment Variables
    /// - `REDIS_URL`: Redis connection URL (default: "redis://localhost:6379")
    /// - `REDIS_MAX_CONNECTIONS`: Maximum number of connections (default: 10)
    pub fn from_env() -> CacheResult<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let max_connections = std::env::var("REDIS_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Ok(RedisConfig {
            url,
            max_connections,
        })
    }
}

/// Redis connection pool
pub struct RedisPool {
    client: Client,
}

impl RedisPool {
    /// Initialize a new Redis connection pool
    pub fn new(config: &RedisConfig) -> CacheResult<Self> {
        let client = Client::open(config.url.clone()).map_err(CacheError::Connection)?;
        info!("Redis client initialized with URL: {}", config.url);
        Ok(RedisPool { client })
    }

    async fn get_connection(&self) -> CacheResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(CacheError::Connection)
    }

    /// Set a key-value pair with optional TTL in seconds
    pub async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> CacheResult<()> {
        let mut conn = self.get_connection().await?;

        if let Some(ttl) = ttl_seconds {
            let _: () = conn
                .set_ex(key, value, ttl)
                .await
                .map_err(CacheError::Command)?;
        } else {
            let _: () = conn.set(key, value).await.map_err(CacheError::Command)?;
        }

        Ok(())
    }

    /// Get a value by key
    pub async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(key).await.map_err(CacheError::Command)?;
        Ok(value)
    }

    /// Delete a key
    pub async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.get_connection().await?;
        let _: u64 = conn.del(key).await.map_err(CacheError::Command)?;
        Ok(())
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> CacheResult<bool> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(CacheError::Command)?;
        Ok(pong == "PONG")
    }
}
