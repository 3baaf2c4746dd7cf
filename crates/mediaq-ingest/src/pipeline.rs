//! Ingestion pipeline.
//!
//! Plain composition over explicit dependencies: the pipeline is handed
//! a sequence generator, a store, a cache, and a publisher at
//! construction and owns no hidden state beyond them. Every operation
//! is awaited to completion before the call returns; nothing is
//! detached fire-and-forget.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use mediaq_cache::CacheEntry;
use mediaq_models::{JobMessage, MediaItem, MediaStatus, ResultEntry, Transition, ValidationError};

use crate::error::{IngestError, IngestResult};
use crate::metrics::IngestMetrics;
use crate::ports::{IdSequence, ItemStore, JobPublisher, ViewCache};

/// Upload boundary input.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub title: String,
    pub description: Option<String>,
    pub locator: String,
}

/// Read boundary output: the cached or stored view of an item's status.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusView {
    pub id: i64,
    pub status: MediaStatus,
    pub duration: Option<u64>,
    pub error_message: Option<String>,
}

impl From<CacheEntry> for StatusView {
    fn from(entry: CacheEntry) -> Self {
        Self {
            id: entry.id,
            status: entry.status,
            duration: entry.duration,
            error_message: entry.error_message,
        }
    }
}

impl From<&MediaItem> for StatusView {
    fn from(item: &MediaItem) -> Self {
        Self {
            id: item.id,
            status: item.status,
            duration: item.duration,
            error_message: item.error_message.clone(),
        }
    }
}

/// Composes the backing services into the upload, worker, and read
/// entry points.
pub struct IngestPipeline<S, St, C, P> {
    sequence: S,
    store: St,
    cache: C,
    publisher: P,
    metrics: Arc<dyn IngestMetrics>,
}

impl<S, St, C, P> IngestPipeline<S, St, C, P>
where
    S: IdSequence,
    St: ItemStore,
    C: ViewCache,
    P: JobPublisher,
{
    pub fn new(
        sequence: S,
        store: St,
        cache: C,
        publisher: P,
        metrics: Arc<dyn IngestMetrics>,
    ) -> Self {
        Self {
            sequence,
            store,
            cache,
            publisher,
            metrics,
        }
    }

    /// Upload entry point: issue an id, persist the initial record,
    /// hand the job to the broker, return the id.
    ///
    /// A publish failure after the record is persisted marks the item
    /// `Failed` so the caller never sees an upload acknowledged as
    /// queued when no job exists for it.
    pub async fn issue_and_enqueue(&self, upload: NewItem) -> IngestResult<i64> {
        // Malformed input must not consume a sequence id
        if upload.title.trim().is_empty() {
            return Err(ValidationError::BlankTitle.into());
        }
        if upload.locator.trim().is_empty() {
            return Err(ValidationError::BlankLocator.into());
        }

        let id = self.sequence.next_id().await?;
        let item = MediaItem::new(id, upload.title, upload.locator)
            .with_description(upload.description);

        if let Err(e) = self.store.insert(item.clone()).await {
            if matches!(e, IngestError::Conflict(_)) {
                // The sequence generator promised this id was fresh
                error!(id, "Duplicate id on insert, sequence integrity suspect");
                self.metrics.upload("conflict");
            } else {
                self.metrics.upload("store_error");
            }
            return Err(e);
        }

        let message = JobMessage::new(id, item.locator.clone());
        match self.publisher.publish(message).await {
            Ok(receipt) => {
                debug!(id, entry_id = %receipt.entry_id, "Job enqueued");
            }
            Err(e) => {
                warn!(id, error = %e, "Publish failed, marking item failed");
                if let Err(mark) = self
                    .store
                    .update_status(
                        id,
                        MediaStatus::Failed,
                        Some("job could not be enqueued".to_string()),
                        None,
                    )
                    .await
                {
                    error!(id, error = %mark, "Failed to mark unpublished item failed");
                }
                self.cache.invalidate(id).await;
                self.metrics.upload("publish_failed");
                return Err(e);
            }
        }

        info!(id, "Accepted upload");
        self.metrics.upload("accepted");
        Ok(id)
    }

    /// Worker entry point: move an item through the status machine.
    ///
    /// Re-applying the current status succeeds without writing. A
    /// terminal-to-terminal overwrite is accepted last-write-wins but
    /// flagged as an anomaly. Backward moves are rejected before any
    /// write.
    pub async fn update_status(
        &self,
        id: i64,
        status: MediaStatus,
        error_message: Option<String>,
        duration: Option<u64>,
    ) -> IngestResult<()> {
        let current = self
            .store
            .fetch_by_id(id)
            .await?
            .ok_or_else(|| IngestError::NotFound(id.to_string()))?;

        match current.status.classify_transition(status) {
            Transition::Idempotent => {
                debug!(id, status = %status, "Status already current, no-op");
                self.metrics.status_update("idempotent");
                return Ok(());
            }
            Transition::Rejected => {
                self.metrics.status_update("rejected");
                return Err(IngestError::InvalidTransition {
                    from: current.status,
                    to: status,
                });
            }
            Transition::TerminalOverwrite => {
                warn!(
                    id,
                    from = %current.status,
                    to = %status,
                    "Terminal status overwritten, accepting last write"
                );
                self.metrics.status_update("terminal_overwrite");
            }
            Transition::Advance => {
                self.metrics.status_update("advance");
            }
        }

        self.store
            .update_status(id, status, error_message, duration)
            .await?;
        self.cache.invalidate(id).await;

        info!(id, status = %status, "Updated item status");
        Ok(())
    }

    /// Worker entry point: merge result entries into an item's record.
    pub async fn append_results(&self, id: i64, entries: Vec<ResultEntry>) -> IngestResult<()> {
        let submitted = entries.len();
        self.store.append_results(id, entries).await?;
        self.cache.invalidate(id).await;

        self.metrics.results_append(submitted);
        Ok(())
    }

    /// Read entry point: cache-aside status lookup.
    pub async fn get_status(&self, id: i64) -> IngestResult<StatusView> {
        if let Some(entry) = self.cache.get(id).await {
            self.metrics.read("cache");
            return Ok(StatusView::from(entry));
        }

        let item = self
            .store
            .fetch_by_id(id)
            .await?
            .ok_or_else(|| IngestError::NotFound(id.to_string()))?;

        let entry = CacheEntry::new(item.id, item.status)
            .with_duration(item.duration)
            .with_error_message(item.error_message.clone());
        self.cache.set(entry).await;

        self.metrics.read("store");
        Ok(StatusView::from(&item))
    }

    /// Read entry point: result entries, always from the store.
    pub async fn get_results(&self, id: i64) -> IngestResult<Vec<ResultEntry>> {
        let item = self
            .store
            .fetch_by_id(id)
            .await?
            .ok_or_else(|| IngestError::NotFound(id.to_string()))?;
        Ok(item.results)
    }

    /// Broker liveness, for readiness probes at the outer boundary.
    pub async fn is_healthy(&self) -> bool {
        self.publisher.is_healthy().await
    }
}

// =============================================================================
// Tests
// =============================================================================
