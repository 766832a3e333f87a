//! Kafka broker backed by rdkafka.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::ClientConfig;
use rdkafka::Message;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::QueueConfig;
use crate::queue::MessageBroker;

const SEND_TIMEOUT: Duration = Duration::from_secs(5);
const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Kafka producer plus one lazily created consumer per polled topic.
pub struct KafkaBroker {
    producer: FutureProducer,
    consumers: Mutex<HashMap<String, Arc<StreamConsumer>>>,
    brokers: String,
    group_id: String,
}

impl KafkaBroker {
    pub fn new(config: &QueueConfig) -> Result<Self> {
        let brokers = config.bootstrap_servers.join(",");
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("client.id", &config.client_id)
            .create()
            .map_err(|e| AppError::queue("producer", e))?;

        Ok(Self {
            producer,
            consumers: Mutex::new(HashMap::new()),
            brokers,
            group_id: config.group_id.clone(),
        })
    }

    async fn consumer(&self, topic: &str) -> Result<Arc<StreamConsumer>> {
        let mut consumers = self.consumers.lock().await;
        if let Some(consumer) = consumers.get(topic) {
            return Ok(Arc::clone(consumer));
        }

        let consumer: StreamConsumer = ClientConfig::new()
            .set("group.id", &self.group_id)
            .set("bootstrap.servers", &self.brokers)
            .set("auto.offset.reset", "latest")
            .set("enable.auto.commit", "true")
            .create()
            .map_err(|e| AppError::queue(topic, e))?;
        consumer
            .subscribe(&[topic])
            .map_err(|e| AppError::queue(topic, e))?;
        log::info!("Subscribed to {}", topic);

        let consumer = Arc::new(consumer);
        consumers.insert(topic.to_string(), Arc::clone(&consumer));
        Ok(consumer)
    }
}

#[async_trait]
impl MessageBroker for KafkaBroker {
    async fn publish(&self, topic: &str, key: Option<&str>, payload: &[u8]) -> Result<()> {
        let mut record = FutureRecord::<str, [u8]>::to(topic).payload(payload);
        if let Some(key) = key {
            record = record.key(key);
        }
        let (partition, _offset) = self
            .producer
            .send(record, SEND_TIMEOUT)
            .await
            .map_err(|(e, _)| AppError::queue(topic, e))?;
        log::debug!("Message delivered to {} [{}]", topic, partition);
        Ok(())
    }

    async fn poll(&self, topic: &str, timeout: Duration) -> Result<Option<Vec<u8>>> {
        let consumer = self.consumer(topic).await?;
        match tokio::time::timeout(timeout, consumer.recv()).await {
            Ok(Ok(message)) => Ok(message.payload().map(<[u8]>::to_vec)),
            Ok(Err(e)) => Err(AppError::queue(topic, e)),
            Err(_) => Ok(None),
        }
    }

    async fn flush(&self) -> Result<()> {
        self.producer
            .flush(FLUSH_TIMEOUT)
            .map_err(|e| AppError::queue("producer", e))
    }
}
