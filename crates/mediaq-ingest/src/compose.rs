//! Environment-driven wiring of the concrete pipeline.

use std::sync::Arc;

use tracing::info;

use mediaq_cache::StatusCache;
use mediaq_queue::Publisher;
use mediaq_store::{ItemRepository, SequenceGenerator, StoreClient};

use crate::error::{IngestError, IngestResult};
use crate::metrics::RecorderMetrics;
use crate::pipeline::IngestPipeline;

/// Counter document the sequence generator increments.
const SEQUENCE_COUNTER_ID: &str = "media_items";

/// Pipeline over the concrete backing services.
pub type DefaultPipeline =
    IngestPipeline<SequenceGenerator, ItemRepository, StatusCache, Publisher>;

/// Build the pipeline from environment configuration and bootstrap the
/// broker topology. Bootstrap is idempotent, so restarts are safe.
pub async fn pipeline_from_env() -> IngestResult<DefaultPipeline> {
    let client = StoreClient::from_env()
        .await
        .map_err(|e| IngestError::Composition(format!("store client: {}", e)))?;
    let sequence = SequenceGenerator::new(client.clone(), SEQUENCE_COUNTER_ID);
    let store = ItemRepository::new(client);

    let cache = StatusCache::from_env()
        .map_err(|e| IngestError::Composition(format!("cache client: {}", e)))?;

    let publisher = Publisher::from_env()
        .map_err(|e| IngestError::Composition(format!("queue client: {}", e)))?;
    publisher
        .bootstrap()
        .await
        .map_err(|e| IngestError::Composition(format!("broker bootstrap: {}", e)))?;

    info!("Ingestion pipeline wired from environment");
    Ok(IngestPipeline::new(
        sequence,
        store,
        cache,
        publisher,
        Arc::new(RecorderMetrics),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_store_config_is_a_composition_error() {
        std::env::remove_var("GCP_PROJECT_ID");
        match pipeline_from_env().await {
            Err(IngestError::Composition(msg)) => assert!(msg.contains("store client")),
            Err(other) => panic!("expected Composition, got {}", other),
            Ok(_) => panic!("expected composition failure"),
        }
    }
}
