//! Redis-backed status cache.
//!
//! The cache is a read accelerator, never a source of truth. Every
//! failure path (connection, command, decode, stale schema) degrades to
//! a miss so callers always fall through to the store.

use std::time::Duration;

use metrics::counter;
use redis::AsyncCommands;
use tracing::{debug, warn};

use crate::entry::{decode, CacheEntry};

/// Cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis URL
    pub redis_url: String,
    /// Key prefix for item entries
    pub key_prefix: String,
    /// Entry time-to-live
    pub ttl: Duration,
    /// Age past which an entry is evicted instead of served
    pub near_expiry_after: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            key_prefix: "mediaq:item".to_string(),
            ttl: Duration::from_secs(15 * 60),
            near_expiry_after: Duration::from_secs(14 * 60),
        }
    }
}

impl CacheConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            key_prefix: std::env::var("CACHE_KEY_PREFIX").unwrap_or(defaults.key_prefix),
            ttl: Duration::from_secs(
                std::env::var("CACHE_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.ttl.as_secs()),
            ),
            near_expiry_after: Duration::from_secs(
                std::env::var("CACHE_NEAR_EXPIRY_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.near_expiry_after.as_secs()),
            ),
        }
    }
}

/// Status cache client.
pub struct StatusCache {
    client: redis::Client,
    config: CacheConfig,
}

impl StatusCache {
    /// Create a new status cache.
    pub fn new(config: CacheConfig) -> redis::RedisResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> redis::RedisResult<Self> {
        Self::new(CacheConfig::from_env())
    }

    fn key(&self, id: i64) -> String {
        format!("{}:{}", self.config.key_prefix, id)
    }

    /// Look up a cached entry.
    ///
    /// Near-expiry entries are evicted and reported as misses so the
    /// caller refreshes them from the store before the TTL fires.
    pub async fn get(&self, id: i64) -> Option<CacheEntry> {
        let key = self.key(id);

        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                debug!(key = %key, error = %e, "Cache unavailable, treating as miss");
                counter!("mediaq_cache_errors_total", "operation" => "get").increment(1);
                return None;
            }
        };

        let payload: Option<String> = match conn.get(&key).await {
            Ok(payload) => payload,
            Err(e) => {
                debug!(key = %key, error = %e, "Cache read failed, treating as miss");
                counter!("mediaq_cache_errors_total", "operation" => "get").increment(1);
                return None;
            }
        };

        let Some(payload) = payload else {
            counter!("mediaq_cache_misses_total").increment(1);
            return None;
        };

        let Some(entry) = decode(&payload) else {
            // Unreadable payloads are poison until the TTL clears them
            self.invalidate(id).await;
            counter!("mediaq_cache_misses_total").increment(1);
            return None;
        };

        if entry.is_near_expiry(chrono::Utc::now(), self.config.near_expiry_after) {
            debug!(key = %key, "Cache entry near expiry, evicting");
            counter!("mediaq_cache_evictions_total").increment(1);
            self.invalidate(id).await;
            return None;
        }

        counter!("mediaq_cache_hits_total").increment(1);
        Some(entry)
    }

    /// Write an entry with the configured TTL. Failures are logged and
    /// swallowed; the store remains correct without the cache.
    pub async fn set(&self, entry: &CacheEntry) {
        let key = self.key(entry.id);

        let payload = match serde_json::to_string(entry) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to encode cache entry");
                return;
            }
        };

        let result: Result<(), redis::RedisError> = async {
            let mut conn = self.client.get_multiplexed_async_connection().await?;
            conn.set_ex(&key, payload, self.config.ttl.as_secs()).await
        }
        .await;

        match result {
            Ok(()) => debug!(key = %key, "Cached status entry"),
            Err(e) => {
                warn!(key = %key, error = %e, "Cache write failed");
                counter!("mediaq_cache_errors_total", "operation" => "set").increment(1);
            }
        }
    }

    /// Remove an entry. Failures are logged and swallowed.
    pub async fn invalidate(&self, id: i64) {
        let key = self.key(id);

        let result: Result<(), redis::RedisError> = async {
            let mut conn = self.client.get_multiplexed_async_connection().await?;
            conn.del(&key).await
        }
        .await;

        match result {
            Ok(()) => debug!(key = %key, "Invalidated cache entry"),
            Err(e) => {
                warn!(key = %key, error = %e, "Cache invalidation failed");
                counter!("mediaq_cache_errors_total", "operation" => "invalidate").increment(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ttl_and_eviction_window() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(900));
        assert_eq!(config.near_expiry_after, Duration::from_secs(840));
        assert!(config.near_expiry_after < config.ttl);
    }

    #[test]
    fn key_layout() {
        let cache = StatusCache::new(CacheConfig::default()).unwrap();
        assert_eq!(cache.key(42), "mediaq:item:42");
    }
}
