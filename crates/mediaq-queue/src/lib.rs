//! Redis Streams job publisher.
//!
//! This crate provides:
//! - Idempotent bootstrap of the job and dead-letter topology
//! - Confirmed, retried publishing of job messages
//! - A broker health probe and a TTL sweep for stuck messages

pub mod error;
pub mod publisher;

pub use error::{QueueError, QueueResult};
pub use publisher::{
    backoff_delay, publish_with_retry, PublishReceipt, Publisher, PublisherConfig,
};
