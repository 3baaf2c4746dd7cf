//! Cache integration tests against a live Redis.

use std::time::Duration;

use mediaq_cache::{CacheConfig, CacheEntry, StatusCache};
use mediaq_models::MediaStatus;

fn live_cache() -> StatusCache {
    dotenvy::dotenv().ok();
    StatusCache::from_env().expect("Failed to create cache")
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn set_then_get_returns_entry() {
    let cache = live_cache();

    let entry = CacheEntry::new(900_001, MediaStatus::Processing).with_duration(Some(42));
    cache.set(&entry).await;

    let fetched = cache.get(900_001).await.expect("entry should be cached");
    assert_eq!(fetched.id, entry.id);
    assert_eq!(fetched.status, MediaStatus::Processing);
    assert_eq!(fetched.duration, Some(42));

    cache.invalidate(900_001).await;
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn invalidate_removes_entry() {
    let cache = live_cache();

    let entry = CacheEntry::new(900_002, MediaStatus::Queued);
    cache.set(&entry).await;
    assert!(cache.get(900_002).await.is_some());

    cache.invalidate(900_002).await;
    assert!(cache.get(900_002).await.is_none());
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn near_expiry_entry_is_evicted_on_read() {
    dotenvy::dotenv().ok();

    let mut config = CacheConfig::from_env();
    config.near_expiry_after = Duration::from_secs(0);
    let cache = StatusCache::new(config).expect("Failed to create cache");

    let entry = CacheEntry::new(900_003, MediaStatus::Completed);
    cache.set(&entry).await;

    // Zero eviction window: every entry is already near expiry
    assert!(cache.get(900_003).await.is_none());
    assert!(cache.get(900_003).await.is_none());
}

#[tokio::test]
async fn unreachable_redis_degrades_to_miss() {
    let config = CacheConfig {
        redis_url: "redis://127.0.0.1:1".to_string(),
        ..CacheConfig::default()
    };
    let cache = StatusCache::new(config).expect("client creation is lazy");

    let entry = CacheEntry::new(900_004, MediaStatus::Queued);
    cache.set(&entry).await;
    assert!(cache.get(900_004).await.is_none());
    cache.invalidate(900_004).await;
}
