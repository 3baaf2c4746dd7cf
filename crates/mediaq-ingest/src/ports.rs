//! Seams between the orchestrator and its backing services.
//!
//! The pipeline depends on these traits, never on the concrete adapters,
//! so each component can be tested against mocks in isolation.

use async_trait::async_trait;

use mediaq_cache::CacheEntry;
use mediaq_models::{JobMessage, MediaItem, MediaStatus, ResultEntry};
use mediaq_queue::PublishReceipt;

use crate::error::IngestResult;

/// Issues unique, strictly increasing item identities.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdSequence: Send + Sync {
    async fn next_id(&self) -> IngestResult<i64>;
}

/// Durable store of item status records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn insert(&self, item: MediaItem) -> IngestResult<()>;

    /// Bounded read; a record that cannot be fetched in time is absent.
    async fn fetch_by_id(&self, id: i64) -> IngestResult<Option<MediaItem>>;

    async fn update_status(
        &self,
        id: i64,
        status: MediaStatus,
        error_message: Option<String>,
        duration: Option<u64>,
    ) -> IngestResult<()>;

    async fn append_results(&self, id: i64, entries: Vec<ResultEntry>) -> IngestResult<()>;
}

/// Non-authoritative status view cache. Infallible by contract: the
/// adapter swallows its own failures and degrades to misses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ViewCache: Send + Sync {
    async fn get(&self, id: i64) -> Option<CacheEntry>;
    async fn set(&self, entry: CacheEntry);
    async fn invalidate(&self, id: i64);
}

/// Confirmed publisher of job messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobPublisher: Send + Sync {
    async fn publish(&self, message: JobMessage) -> IngestResult<PublishReceipt>;
    async fn is_healthy(&self) -> bool;
}
