//! Media ingestion orchestration.
//!
//! This crate composes the backing services into the ingestion core:
//! - Upload: issue an id, persist a `Queued` record, enqueue the job
//! - Worker: status transitions and result appends, cache invalidation
//! - Read: cache-aside status views and result listings

pub mod adapters;
pub mod compose;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod ports;

pub use compose::{pipeline_from_env, DefaultPipeline};
pub use error::{IngestError, IngestResult};
pub use metrics::{IngestMetrics, NoopMetrics, RecorderMetrics};
pub use pipeline::{IngestPipeline, NewItem, StatusView};
pub use ports::{IdSequence, ItemStore, JobPublisher, ViewCache};
