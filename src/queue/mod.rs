//! Message distribution.
//!
//! A [`MessageBroker`] moves opaque payloads between named topics. The
//! in-process [`MemoryBroker`] is the default; Kafka is available behind the
//! `kafka` feature. [`route`] decides where a processed record goes.

pub mod memory;
pub mod routing;

#[cfg(feature = "kafka")]
pub mod kafka;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{QueueBackend, QueueConfig};

pub use memory::MemoryBroker;
pub use routing::{Delivery, route};

#[cfg(feature = "kafka")]
pub use kafka::KafkaBroker;

/// Trait for message broker backends.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Publish one payload to a topic.
    async fn publish(&self, topic: &str, key: Option<&str>, payload: &[u8]) -> Result<()>;

    /// Wait up to `timeout` for the next payload on `topic`.
    async fn poll(&self, topic: &str, timeout: Duration) -> Result<Option<Vec<u8>>>;

    /// Block until queued messages are delivered.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Serialize `value` as JSON and publish it.
pub async fn publish_json<T>(
    broker: &dyn MessageBroker,
    topic: &str,
    key: Option<&str>,
    value: &T,
) -> Result<()>
where
    T: Serialize + Sync + ?Sized,
{
    let payload = serde_json::to_vec(value)?;
    broker.publish(topic, key, &payload).await
}

/// Build the broker selected by the configuration.
pub fn connect(config: &QueueConfig) -> Result<Arc<dyn MessageBroker>> {
    match config.backend {
        QueueBackend::Memory => {
            log::info!(
                "Using in-process message broker ({} messages per topic)",
                config.memory_capacity
            );
            Ok(Arc::new(MemoryBroker::with_capacity(config.memory_capacity)))
        }
        #[cfg(feature = "kafka")]
        QueueBackend::Kafka => {
            log::info!(
                "Connecting to Kafka at {}",
                config.bootstrap_servers.join(",")
            );
            Ok(Arc::new(KafkaBroker::new(config)?))
        }
        #[cfg(not(feature = "kafka"))]
        QueueBackend::Kafka => Err(AppError::config(
            "queue.backend = \"kafka\" requires building with the `kafka` feature",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_memory() {
        assert!(connect(&QueueConfig::default()).is_ok());
    }

    #[cfg(not(feature = "kafka"))]
    #[test]
    fn test_connect_kafka_without_feature() {
        let config = QueueConfig {
            backend: QueueBackend::Kafka,
            ..QueueConfig::default()
        };
        assert!(matches!(connect(&config), Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_publish_json() {
        let broker = MemoryBroker::new();
        publish_json(&broker, "t", None, &serde_json::json!({"id": "1"}))
            .await
            .unwrap();
        let payload = broker
            .poll("t", Duration::from_millis(10))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payload, br#"{"id":"1"}"#.to_vec());
    }
}
