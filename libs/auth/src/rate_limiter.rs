//! Sign-in throttle for slowing down credential guessing

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::info;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of attempts allowed within the window
    pub max_attempts: u32,
    /// Time window in seconds
    pub window_seconds: u64,
    /// Ban duration in seconds once the limit is exceeded
    pub ban_duration_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_seconds: 300,        // 5 minutes
            ban_duration_seconds: 3600, // 1 hour
        }
    }
}

#[derive(Debug)]
struct RateLimiterEntry {
    attempts: u32,
    last_attempt: Instant,
    ban_expires: Option<Instant>,
}

/// Per-key sliding-window attempt counter with a ban once exceeded
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<HashMap<String, RateLimiterEntry>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record an attempt for `key` and report whether it is allowed
    pub async fn is_allowed(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let entry = entries.entry(key.to_string()).or_insert(RateLimiterEntry {
            attempts: 0,
            last_attempt: now,
            ban_expires: None,
        });

        if let Some(ban_expires) = entry.ban_expires {
            if now >= ban_expires {
                entry.attempts = 0;
                entry.ban_expires = None;
            } else {
                return false;
            }
        }

        if now.duration_since(entry.last_attempt) >= Duration::from_secs(self.config.window_seconds)
        {
            entry.attempts = 0;
        }

        if entry.attempts >= self.config.max_attempts {
            entry.ban_expires = Some(now + Duration::from_secs(self.config.ban_duration_seconds));
            info!(
                "Banned key {} for {} seconds",
                key, self.config.ban_duration_seconds
            );
            return false;
        }

        entry.attempts += 1;
        entry.last_attempt = now;

        true
    }

    /// Clear the counter for `key` after a successful sign-in
    pub async fn reset(&self, key: &str) {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
    }

    /// Get the rate limiter configuration
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }
}
