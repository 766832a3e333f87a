// src/pipeline/consume.rs

//! Consume-and-process: read raw tweets from the broker and process them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::Result;
use crate::models::RawTweet;
use crate::pipeline::TweetProcessor;
use crate::queue::MessageBroker;

/// Counters for a consumer run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConsumeStats {
    pub received: usize,
    pub processed: usize,
    pub decode_errors: usize,
    pub failed: usize,
}

/// Polls the raw topic and hands each message to a [`TweetProcessor`].
pub struct TweetConsumer {
    processor: Arc<TweetProcessor>,
    broker: Arc<dyn MessageBroker>,
    topic: String,
    poll_timeout: Duration,
}

impl TweetConsumer {
    pub fn new(
        processor: Arc<TweetProcessor>,
        broker: Arc<dyn MessageBroker>,
        topic: impl Into<String>,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            processor,
            broker,
            topic: topic.into(),
            poll_timeout,
        }
    }

    /// Consume until `duration` has elapsed.
    pub async fn run_for(&self, duration: Duration) -> ConsumeStats {
        let deadline = Instant::now() + duration;
        let mut stats = ConsumeStats::default();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let polled = self
                .broker
                .poll(&self.topic, self.poll_timeout.min(remaining))
                .await;
            self.handle(polled, &mut stats).await;
        }
        stats
    }

    /// Consume until the shutdown flag flips to `true` or its sender drops.
    pub async fn run_until(&self, mut shutdown: watch::Receiver<bool>) -> ConsumeStats {
        log::info!("Starting tweet consumer on {}", self.topic);
        let mut stats = ConsumeStats::default();

        while !*shutdown.borrow() {
            let polled = tokio::select! {
                _ = shutdown.changed() => break,
                polled = self.broker.poll(&self.topic, self.poll_timeout) => polled,
            };
            self.handle(polled, &mut stats).await;
        }

        log::info!(
            "Consumer stopped: {} received, {} processed",
            stats.received,
            stats.processed
        );
        stats
    }

    async fn handle(&self, polled: Result<Option<Vec<u8>>>, stats: &mut ConsumeStats) {
        let payload = match polled {
            Ok(Some(payload)) => payload,
            Ok(None) => return,
            Err(e) => {
                log::error!("Consumer error: {}", e);
                tokio::time::sleep(self.poll_timeout).await;
                return;
            }
        };
        stats.received += 1;

        let tweet: RawTweet = match serde_json::from_slice(&payload) {
            Ok(tweet) => tweet,
            Err(e) => {
                stats.decode_errors += 1;
                log::error!("Error decoding message: {}", e);
                return;
            }
        };

        if self.processor.process(&tweet).await.is_some() {
            stats.processed += 1;
        } else {
            stats.failed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TopicConfig, Vocabulary};
    use crate::queue::MemoryBroker;
    use crate::services::{Classifier, VaderScorer};
    use crate::storage::{SqliteStore, TweetStore};

    async fn setup() -> (TweetConsumer, Arc<MemoryBroker>, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        store.create_tables().await.unwrap();
        let broker = Arc::new(MemoryBroker::new());
        let processor = Arc::new(TweetProcessor::new(
            Classifier::new(Arc::new(Vocabulary::default())),
            Arc::new(VaderScorer::new()),
            store.clone(),
            broker.clone(),
            TopicConfig::default(),
        ));
        let consumer = TweetConsumer::new(
            processor,
            broker.clone(),
            "raw",
            Duration::from_millis(20),
        );
        (consumer, broker, store)
    }

    #[tokio::test]
    async fn test_run_for_processes_and_skips_bad_json() {
        let (consumer, broker, store) = setup().await;
        broker
            .publish("raw", None, br#"{"id": "1", "text": "go harambee stars go"}"#)
            .await
            .unwrap();
        broker.publish("raw", None, b"not json").await.unwrap();
        broker
            .publish("raw", None, br#"{"id": "2", "text": "good morning everyone"}"#)
            .await
            .unwrap();

        let stats = consumer.run_for(Duration::from_millis(200)).await;
        assert_eq!(
            stats,
            ConsumeStats {
                received: 3,
                processed: 2,
                decode_errors: 1,
                failed: 0,
            }
        );
        assert_eq!(store.tweet_count().await.unwrap(), 2);
        assert_eq!(broker.len("kenya-hashtags").await, 1);
    }

    #[tokio::test]
    async fn test_run_until_stops_on_shutdown() {
        let (consumer, broker, _store) = setup().await;
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { consumer.run_until(rx).await });
        broker
            .publish("raw", None, br#"{"id": "1", "text": "caf"}"#)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(true).unwrap();

        let stats = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats.processed, 1);
    }
}
