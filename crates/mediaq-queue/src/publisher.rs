//! Job publisher using Redis Streams.
//!
//! The main stream plus its consumer group and a dead-letter stream form
//! the broker topology. Bootstrap is idempotent, publishes are confirmed
//! by the broker-assigned entry id, and transient failures are retried
//! with exponential backoff before surfacing as `PublishFailed`.

use std::future::Future;
use std::time::Duration;

use metrics::counter;
use redis::AsyncCommands;
use tracing::{debug, info, warn};
use uuid::Uuid;

use mediaq_models::JobMessage;

use crate::error::{QueueError, QueueResult};

/// Stream field carrying the message payload.
const FIELD_PAYLOAD: &str = "payload";

/// Max pending entries inspected per sweep pass.
const SWEEP_BATCH: usize = 100;

/// Publisher configuration.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Redis URL
    pub redis_url: String,
    /// Stream name for jobs
    pub stream_name: String,
    /// Consumer group name
    pub consumer_group: String,
    /// Dead letter stream name
    pub dlq_stream_name: String,
    /// Approximate max stream length; older entries are trimmed
    pub max_length: u64,
    /// Pending messages idle longer than this are dead-lettered
    pub message_ttl: Duration,
    /// Publish attempts before giving up
    pub max_publish_attempts: u32,
    /// Base unit of the exponential backoff between attempts
    pub backoff_base: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            stream_name: "mediaq:jobs".to_string(),
            consumer_group: "mediaq:workers".to_string(),
            dlq_stream_name: "mediaq:dlq".to_string(),
            max_length: 10_000,
            message_ttl: Duration::from_secs(300),
            max_publish_attempts: 3,
            backoff_base: Duration::from_secs(1),
        }
    }
}

impl PublisherConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            stream_name: std::env::var("QUEUE_STREAM").unwrap_or(defaults.stream_name),
            consumer_group: std::env::var("QUEUE_CONSUMER_GROUP")
                .unwrap_or(defaults.consumer_group),
            dlq_stream_name: std::env::var("QUEUE_DLQ_STREAM").unwrap_or(defaults.dlq_stream_name),
            max_length: std::env::var("QUEUE_MAX_LENGTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_length),
            message_ttl: Duration::from_secs(
                std::env::var("QUEUE_MESSAGE_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.message_ttl.as_secs()),
            ),
            max_publish_attempts: std::env::var("QUEUE_MAX_PUBLISH_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_publish_attempts),
            backoff_base: defaults.backoff_base,
        }
    }
}

/// Broker confirmation for a published message.
#[derive(Debug, Clone)]
pub struct PublishReceipt {
    /// Stream entry id assigned by the broker
    pub entry_id: String,
    /// Correlation id stamped on the message
    pub correlation_id: String,
}

/// Job publisher client.
pub struct Publisher {
    client: redis::Client,
    config: PublisherConfig,
}

impl Publisher {
    /// Create a new publisher.
    pub fn new(config: PublisherConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> QueueResult<Self> {
        Self::new(PublisherConfig::from_env())
    }

    /// Declare the broker topology. Safe to call any number of times;
    /// existing streams and groups are left untouched.
    ///
    /// The dead-letter stream is declared first so a message can never
    /// be rejected into a stream that does not exist yet.
    pub async fn bootstrap(&self) -> QueueResult<()> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| QueueError::bootstrap_failed(format!("broker connection: {}", e)))?;

        self.create_group(&mut conn, &self.config.dlq_stream_name)
            .await?;
        self.create_group(&mut conn, &self.config.stream_name)
            .await?;

        Ok(())
    }

    async fn create_group(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        stream: &str,
    ) -> QueueResult<()> {
        let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(stream)
            .arg(&self.config.consumer_group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(conn)
            .await;

        match result {
            Ok(_) => info!(stream, group = %self.config.consumer_group, "Created consumer group"),
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!(stream, group = %self.config.consumer_group, "Consumer group already exists");
            }
            Err(e) => return Err(QueueError::Redis(e)),
        }

        Ok(())
    }

    /// Publish a job message, retrying transient failures.
    ///
    /// The broker-assigned entry id in the receipt is the confirmation
    /// that the message is durably in the stream.
    pub async fn publish(&self, message: &JobMessage) -> QueueResult<PublishReceipt> {
        let payload = serde_json::to_string(message)?;
        let correlation_id = Uuid::new_v4().to_string();

        let receipt = publish_with_retry(
            self.config.max_publish_attempts,
            self.config.backoff_base,
            || self.publish_once(&payload, &correlation_id),
        )
        .await?;

        info!(
            id = message.id,
            entry_id = %receipt.entry_id,
            correlation_id = %receipt.correlation_id,
            "Published job message"
        );
        Ok(receipt)
    }

    async fn publish_once(
        &self,
        payload: &str,
        correlation_id: &str,
    ) -> QueueResult<PublishReceipt> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let entry_id: String = redis::cmd("XADD")
            .arg(&self.config.stream_name)
            .arg("MAXLEN")
            .arg("~")
            .arg(self.config.max_length)
            .arg("*")
            .arg(FIELD_PAYLOAD)
            .arg(payload)
            .arg("correlation_id")
            .arg(correlation_id)
            .arg("source")
            .arg("mediaq-ingest")
            .arg("published_at")
            .arg(chrono::Utc::now().to_rfc3339())
            .query_async(&mut conn)
            .await?;

        Ok(PublishReceipt {
            entry_id,
            correlation_id: correlation_id.to_string(),
        })
    }

    /// Probe broker liveness.
    pub async fn is_healthy(&self) -> bool {
        let result: Result<String, redis::RedisError> = async {
            let mut conn = self.client.get_multiplexed_async_connection().await?;
            redis::cmd("PING").query_async(&mut conn).await
        }
        .await;

        match result {
            Ok(reply) => reply == "PONG",
            Err(e) => {
                warn!(error = %e, "Broker health probe failed");
                false
            }
        }
    }

    /// Main stream length.
    pub async fn len(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = conn.xlen(&self.config.stream_name).await?;
        Ok(len)
    }

    /// Dead-letter stream length.
    pub async fn dlq_len(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = conn.xlen(&self.config.dlq_stream_name).await?;
        Ok(len)
    }

    /// Dead-letter pending messages that outlived the message TTL.
    ///
    /// Claims entries idle longer than the TTL from the consumer group,
    /// copies them to the dead-letter stream, and removes them from the
    /// main stream. Returns the number of messages moved.
    pub async fn sweep_expired(&self, sweeper_name: &str) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        // XCLAIM only accepts concrete entry ids, so list the overdue
        // ones first with the extended XPENDING form
        let pending: redis::streams::StreamPendingCountReply = redis::cmd("XPENDING")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("IDLE")
            .arg(self.config.message_ttl.as_millis() as u64)
            .arg("-")
            .arg("+")
            .arg(SWEEP_BATCH)
            .query_async(&mut conn)
            .await?;
        if pending.ids.is_empty() {
            return Ok(0);
        }

        let mut claim = redis::cmd("XCLAIM");
        claim
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(sweeper_name)
            .arg(self.config.message_ttl.as_millis() as u64);
        for overdue in &pending.ids {
            claim.arg(&overdue.id);
        }
        let claimed: redis::streams::StreamClaimReply = claim.query_async(&mut conn).await?;

        let mut moved = 0u64;
        for entry in claimed.ids {
            let payload = match entry.map.get(FIELD_PAYLOAD) {
                Some(redis::Value::BulkString(bytes)) => String::from_utf8_lossy(bytes).to_string(),
                _ => {
                    warn!(entry_id = %entry.id, "Expired entry has no payload field");
                    String::new()
                }
            };

            redis::cmd("XADD")
                .arg(&self.config.dlq_stream_name)
                .arg("*")
                .arg(FIELD_PAYLOAD)
                .arg(&payload)
                .arg("reason")
                .arg("message_ttl_exceeded")
                .arg("original_id")
                .arg(&entry.id)
                .query_async::<()>(&mut conn)
                .await?;

            redis::cmd("XACK")
                .arg(&self.config.stream_name)
                .arg(&self.config.consumer_group)
                .arg(&entry.id)
                .query_async::<()>(&mut conn)
                .await?;
            redis::cmd("XDEL")
                .arg(&self.config.stream_name)
                .arg(&entry.id)
                .query_async::<()>(&mut conn)
                .await?;

            warn!(entry_id = %entry.id, "Dead-lettered expired message");
            counter!("mediaq_queue_dead_lettered_total").increment(1);
            moved += 1;
        }

        Ok(moved)
    }
}

/// Backoff before the next attempt after `failed_attempts` failures.
pub fn backoff_delay(base: Duration, failed_attempts: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(failed_attempts))
}

/// Run `attempt` up to `max_attempts` times with exponential backoff.
///
/// Every failed attempt is counted; the final error reports how many
/// attempts were spent and the last underlying failure.
pub async fn publish_with_retry<T, F, Fut>(
    max_attempts: u32,
    backoff_base: Duration,
    mut attempt: F,
) -> QueueResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = QueueResult<T>>,
{
    let mut last_error = String::new();

    for n in 1..=max_attempts {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(attempt = n, max_attempts, error = %e, "Publish attempt failed");
                counter!("mediaq_queue_publish_retries_total").increment(1);
                last_error = e.to_string();
                if n < max_attempts {
                    tokio::time::sleep(backoff_delay(backoff_base, n)).await;
                }
            }
        }
    }

    Err(QueueError::PublishFailed {
        attempts: max_attempts,
        last_error,
    })
}
