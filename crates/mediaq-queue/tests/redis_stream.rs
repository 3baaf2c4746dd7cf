//! Publisher integration tests against a live Redis.

use std::time::Duration;

use mediaq_models::JobMessage;
use mediaq_queue::{Publisher, PublisherConfig};

fn live_publisher() -> Publisher {
    dotenvy::dotenv().ok();

    let mut config = PublisherConfig::from_env();
    config.stream_name = "mediaq:test:jobs".to_string();
    config.dlq_stream_name = "mediaq:test:dlq".to_string();
    config.consumer_group = "mediaq:test:workers".to_string();
    Publisher::new(config).expect("Failed to create publisher")
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn bootstrap_is_idempotent() {
    let publisher = live_publisher();

    publisher.bootstrap().await.expect("first bootstrap");
    publisher.bootstrap().await.expect("second bootstrap");
    publisher.bootstrap().await.expect("third bootstrap");
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn publish_returns_broker_confirmation() {
    let publisher = live_publisher();
    publisher.bootstrap().await.expect("bootstrap");

    let before = publisher.len().await.expect("stream length");

    let message = JobMessage::new(12345, "media/12345.mp4");
    let receipt = publisher.publish(&message).await.expect("publish");

    assert!(receipt.entry_id.contains('-'), "entry id is a stream id");
    assert!(!receipt.correlation_id.is_empty());

    let after = publisher.len().await.expect("stream length");
    assert_eq!(after, before + 1);
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn sweep_dead_letters_messages_pending_past_ttl() {
    dotenvy::dotenv().ok();

    let mut config = PublisherConfig::from_env();
    config.stream_name = "mediaq:test:sweep:jobs".to_string();
    config.dlq_stream_name = "mediaq:test:sweep:dlq".to_string();
    config.consumer_group = "mediaq:test:sweep:workers".to_string();
    config.message_ttl = Duration::from_millis(50);
    let redis_url = config.redis_url.clone();
    let publisher = Publisher::new(config).expect("Failed to create publisher");

    let client = redis::Client::open(redis_url.as_str()).expect("redis client");
    let mut conn = client
        .get_multiplexed_async_connection()
        .await
        .expect("redis connection");

    // Fresh streams so the sweep count is deterministic
    redis::cmd("DEL")
        .arg("mediaq:test:sweep:jobs")
        .arg("mediaq:test:sweep:dlq")
        .query_async::<()>(&mut conn)
        .await
        .expect("reset streams");
    publisher.bootstrap().await.expect("bootstrap");

    publisher
        .publish(&JobMessage::new(555, "media/555.mp4"))
        .await
        .expect("publish");

    // Deliver the entry to a consumer so it lands in the pending list
    let _: redis::streams::StreamReadReply = redis::cmd("XREADGROUP")
        .arg("GROUP")
        .arg("mediaq:test:sweep:workers")
        .arg("worker-1")
        .arg("COUNT")
        .arg(1)
        .arg("STREAMS")
        .arg("mediaq:test:sweep:jobs")
        .arg(">")
        .query_async(&mut conn)
        .await
        .expect("read into pending");

    tokio::time::sleep(Duration::from_millis(80)).await;

    let moved = publisher.sweep_expired("sweeper-1").await.expect("sweep");
    assert_eq!(moved, 1, "the overdue pending entry must be dead-lettered");
    assert_eq!(publisher.dlq_len().await.expect("dlq length"), 1);
    assert_eq!(publisher.len().await.expect("stream length"), 0);

    // A second pass finds nothing left to move
    assert_eq!(publisher.sweep_expired("sweeper-1").await.expect("sweep"), 0);
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn health_probe_reports_live_broker() {
    let publisher = live_publisher();
    assert!(publisher.is_healthy().await);
}

#[tokio::test]
async fn health_probe_reports_dead_broker() {
    let config = PublisherConfig {
        redis_url: "redis://127.0.0.1:1".to_string(),
        ..PublisherConfig::default()
    };
    let publisher = Publisher::new(config).expect("client creation is lazy");
    assert!(!publisher.is_healthy().await);
}
