//! In-process broker: one bounded FIFO queue per topic.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use crate::error::Result;
use crate::queue::MessageBroker;

/// Messages kept per topic unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Default)]
struct TopicQueue {
    messages: VecDeque<Vec<u8>>,
    dropped: u64,
}

/// Per-topic FIFO queues shared by producers and consumers in the same
/// process. Each message is delivered to exactly one poller.
///
/// A topic holds at most `capacity` messages; publishing to a full topic
/// evicts its oldest message.
pub struct MemoryBroker {
    topics: Mutex<HashMap<String, TopicQueue>>,
    notify: Notify,
    capacity: usize,
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
            notify: Notify::new(),
            capacity: capacity.max(1),
        }
    }

    /// Number of messages waiting on a topic.
    pub async fn len(&self, topic: &str) -> usize {
        self.topics
            .lock()
            .await
            .get(topic)
            .map_or(0, |q| q.messages.len())
    }

    /// Messages evicted from a full topic so far.
    pub async fn dropped(&self, topic: &str) -> u64 {
        self.topics.lock().await.get(topic).map_or(0, |q| q.dropped)
    }

    /// Remove and return every message waiting on a topic.
    pub async fn drain(&self, topic: &str) -> Vec<Vec<u8>> {
        self.topics
            .lock()
            .await
            .get_mut(topic)
            .map(|q| q.messages.drain(..).collect())
            .unwrap_or_default()
    }

    async fn try_pop(&self, topic: &str) -> Option<Vec<u8>> {
        self.topics.lock().await.get_mut(topic)?.messages.pop_front()
    }
}

#[async_trait]
impl MessageBroker for MemoryBroker {
    async fn publish(&self, topic: &str, _key: Option<&str>, payload: &[u8]) -> Result<()> {
        {
            let mut topics = self.topics.lock().await;
            let queue = topics.entry(topic.to_string()).or_default();
            if queue.messages.len() >= self.capacity {
                queue.messages.pop_front();
                queue.dropped += 1;
                if queue.dropped == 1 || queue.dropped % 1_000 == 0 {
                    log::warn!(
                        "Topic {} is full ({} messages); {} oldest dropped so far",
                        topic,
                        self.capacity,
                        queue.dropped
                    );
                }
            }
            queue.messages.push_back(payload.to_vec());
        }
        self.notify.notify_waiters();
        log::debug!("Message delivered to {}", topic);
        Ok(())
    }

    async fn poll(&self, topic: &str, timeout: Duration) -> Result<Option<Vec<u8>>> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            // Register before checking so a publish in between is not missed.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(payload) = self.try_pop(topic).await {
                return Ok(Some(payload));
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }
}
