//! Queue error types.

use thiserror::Error;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Publish failed after {attempts} attempts: {last_error}")]
    PublishFailed { attempts: u32, last_error: String },

    #[error("Bootstrap failed: {0}")]
    BootstrapFailed(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QueueError {
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed(msg.into())
    }

    pub fn bootstrap_failed(msg: impl Into<String>) -> Self {
        Self::BootstrapFailed(msg.into())
    }
}
