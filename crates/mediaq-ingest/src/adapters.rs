//! Port implementations for the concrete backing services.

use async_trait::async_trait;

use mediaq_cache::{CacheEntry, StatusCache};
use mediaq_models::{JobMessage, MediaItem, MediaStatus, ResultEntry};
use mediaq_queue::{PublishReceipt, Publisher};
use mediaq_store::{ItemRepository, SequenceGenerator};

use crate::error::IngestResult;
use crate::ports::{IdSequence, ItemStore, JobPublisher, ViewCache};

#[async_trait]
impl IdSequence for SequenceGenerator {
    async fn next_id(&self) -> IngestResult<i64> {
        Ok(SequenceGenerator::next_id(self).await?)
    }
}

#[async_trait]
impl ItemStore for ItemRepository {
    async fn insert(&self, item: MediaItem) -> IngestResult<()> {
        Ok(ItemRepository::insert(self, &item).await?)
    }

    async fn fetch_by_id(&self, id: i64) -> IngestResult<Option<MediaItem>> {
        Ok(ItemRepository::fetch_by_id(self, id).await?)
    }

    async fn update_status(
        &self,
        id: i64,
        status: MediaStatus,
        error_message: Option<String>,
        duration: Option<u64>,
    ) -> IngestResult<()> {
        Ok(ItemRepository::update_status(self, id, status, error_message.as_deref(), duration)
            .await?)
    }

    async fn append_results(&self, id: i64, entries: Vec<ResultEntry>) -> IngestResult<()> {
        Ok(ItemRepository::append_results(self, id, &entries).await?)
    }
}

#[async_trait]
impl ViewCache for StatusCache {
    async fn get(&self, id: i64) -> Option<CacheEntry> {
        StatusCache::get(self, id).await
    }

    async fn set(&self, entry: CacheEntry) {
        StatusCache::set(self, &entry).await;
    }

    async fn invalidate(&self, id: i64) {
        StatusCache::invalidate(self, id).await;
    }
}

#[async_trait]
impl JobPublisher for Publisher {
    async fn publish(&self, message: JobMessage) -> IngestResult<PublishReceipt> {
        Ok(Publisher::publish(self, &message).await?)
    }

    async fn is_healthy(&self) -> bool {
        Publisher::is_healthy(self).await
    }
}
