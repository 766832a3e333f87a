// src/pipeline/process.rs

//! Turning raw tweets into stored, distributed records.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{ProcessedTweet, RawTweet, TopicConfig};
use crate::queue::{self, MessageBroker};
use crate::services::text::{clean_text, extract_hashtags};
use crate::services::{Classifier, SentimentScorer};
use crate::storage::{InsertOutcome, TweetStore};

/// Classifies, scores, stores and publishes tweets.
pub struct TweetProcessor {
    classifier: Classifier,
    scorer: Arc<dyn SentimentScorer>,
    store: Arc<dyn TweetStore>,
    broker: Arc<dyn MessageBroker>,
    topics: TopicConfig,
}

impl TweetProcessor {
    pub fn new(
        classifier: Classifier,
        scorer: Arc<dyn SentimentScorer>,
        store: Arc<dyn TweetStore>,
        broker: Arc<dyn MessageBroker>,
        topics: TopicConfig,
    ) -> Self {
        Self {
            classifier,
            scorer,
            store,
            broker,
            topics,
        }
    }

    /// Build the processed record without side effects.
    pub fn assemble(&self, raw: &RawTweet) -> ProcessedTweet {
        let cleaned = clean_text(&raw.text);
        let hashtags = extract_hashtags(&raw.text);

        let verdict = self.classifier.classify_detailed(&raw.text, &hashtags);
        log::debug!(
            "Tweet {} classified as {} at stage {} (scores {:?})",
            raw.id,
            verdict.category,
            verdict.stage,
            verdict.scores
        );

        let (sentiment_score, sentiment_label) = self.scorer.analyze(&cleaned);
        let metrics = raw.public_metrics;

        ProcessedTweet {
            tweet_id: raw.id.clone(),
            text: raw.text.clone(),
            author_id: raw.author_id.clone(),
            created_at: raw.created_at,
            hashtags,
            country: verdict.category,
            sentiment_score,
            sentiment_label,
            retweet_count: metrics.retweet_count,
            like_count: metrics.like_count,
            reply_count: metrics.reply_count,
            is_shared_content: verdict.category.is_shared(),
            shared_for_country: None,
        }
    }

    /// Process one tweet; failures are logged and yield `None`.
    pub async fn process(&self, raw: &RawTweet) -> Option<ProcessedTweet> {
        match self.try_process(raw).await {
            Ok(record) => Some(record),
            Err(e) => {
                log::error!("Error processing tweet {}: {}", raw.id, e);
                None
            }
        }
    }

    async fn try_process(&self, raw: &RawTweet) -> Result<ProcessedTweet> {
        let record = self.assemble(raw);

        if self.store.insert_tweet(&record).await? == InsertOutcome::Duplicate {
            log::debug!("Tweet {} already stored", record.tweet_id);
        }

        let key = Some(record.tweet_id.as_str());
        for delivery in queue::route(&record, &self.topics) {
            queue::publish_json(self.broker.as_ref(), &delivery.topic, key, &delivery.record)
                .await?;
        }
        queue::publish_json(self.broker.as_ref(), &self.topics.processed, key, &record).await?;
        self.broker.flush().await?;

        log::info!(
            "Processed tweet from {}: {} sentiment",
            record.country,
            record.sentiment_label
        );
        Ok(record)
    }
}

/// Parse raw tweets from a JSON array or from one JSON object per line.
pub fn parse_raw_tweets(content: &str) -> Result<Vec<RawTweet>> {
    let trimmed = content.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .map_err(|e| AppError::validation(format!("line {}: {}", i + 1, e)))
        })
        .collect()
}
