//! Refresh-session store backed by Redis
//!
//! One entry per user under `session:{user_id}` holding the currently valid
//! refresh token. Rotation overwrites the entry; sign-out deletes it. A
//! presented refresh token that differs from the stored one is revoked.
//!
//! Every Redis command runs under a fixed timeout and is retried once on
//! failure. All commands here are idempotent, so the retry is safe.

use common::cache::RedisPool;
use common::error::{CacheError, CacheResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AuthError;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Session store for refresh-token bookkeeping
#[derive(Clone)]
pub struct SessionStore {
    redis: Arc<RedisPool>,
    ttl_seconds: u64,
}

impl SessionStore {
    /// Create a new session store; `ttl_seconds` should match the refresh
    /// token expiry so abandoned sessions age out on their own.
    pub fn new(redis: Arc<RedisPool>, ttl_seconds: u64) -> Self {
        Self { redis, ttl_seconds }
    }

    fn key(user_id: Uuid) -> String {
        format!("session:{}", user_id)
    }

    /// Store (or rotate to) the given refresh token for a user
    pub async fn put(&self, user_id: Uuid, refresh_token: &str) -> Result<(), AuthError> {
        info!("Storing session for user: {}", user_id);
        let key = Self::key(user_id);
        match bounded(self.redis.set(&key, refresh_token, Some(self.ttl_seconds))).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!("Session store write failed, retrying once: {}", err);
                bounded(self.redis.set(&key, refresh_token, Some(self.ttl_seconds))).await?;
                Ok(())
            }
        }
    }

    /// Fetch the currently stored refresh token for a user
    pub async fn current(&self, user_id: Uuid) -> Result<Option<String>, AuthError> {
        let key = Self::key(user_id);
        let token = match bounded(self.redis.get(&key)).await {
            Ok(token) => token,
            Err(err) => {
                warn!("Session store read failed, retrying once: {}", err);
                bounded(self.redis.get(&key)).await?
            }
        };
        Ok(token)
    }

    /// Drop the stored session for a user
    pub async fn remove(&self, user_id: Uuid) -> Result<(), AuthError> {
        info!("Deleting session for user: {}", user_id);
        let key = Self::key(user_id);
        match bounded(self.redis.delete(&key)).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!("Session store delete failed, retrying once: {}", err);
                bounded(self.redis.delete(&key)).await?;
                Ok(())
            }
        }
    }

    /// Check whether the presented refresh token matches the stored one
    pub async fn matches(&self, user_id: Uuid, refresh_token: &str) -> Result<bool, AuthError> {
        let stored = self.current(user_id).await?;
        Ok(stored.as_deref() == Some(refresh_token))
    }

    /// Session store reachability
    pub async fn health_check(&self) -> Result<bool, AuthError> {
        let healthy = bounded(self.redis.health_check()).await?;
        Ok(healthy)
    }
}

async fn bounded<T>(command: impl Future<Output = CacheResult<T>>) -> CacheResult<T> {
    match tokio::time::timeout(COMMAND_TIMEOUT, command).await {
        Ok(result) => result,
        Err(_) => Err(CacheError::Timeout),
    }
}
