// src/pipeline/context.rs

//! Shared handles for a pipeline run.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::pipeline::fetch::{FetchOutcome, fetch_and_produce};
use crate::pipeline::process::parse_raw_tweets;
use crate::pipeline::{TweetConsumer, TweetProcessor};
use crate::queue::{self, MessageBroker};
use crate::services::{Classifier, MetricsCalculator, TweetSource, TwitterClient, VaderScorer};
use crate::storage::{SqliteStore, TweetStore};

/// Configuration plus the store, broker and tweet source a run works with.
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<Config>,
    store: Arc<dyn TweetStore>,
    broker: Arc<dyn MessageBroker>,
    source: Option<Arc<dyn TweetSource>>,
    processor: Arc<TweetProcessor>,
}

impl Pipeline {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn TweetStore>,
        broker: Arc<dyn MessageBroker>,
        source: Option<Arc<dyn TweetSource>>,
    ) -> Self {
        let classifier = Classifier::new(Arc::new(config.vocabulary.clone()));
        let processor = Arc::new(TweetProcessor::new(
            classifier,
            Arc::new(VaderScorer::new()),
            Arc::clone(&store),
            Arc::clone(&broker),
            config.queue.topics.clone(),
        ));
        Self {
            config,
            store,
            broker,
            source,
            processor,
        }
    }

    /// Open the configured database and broker. The search client is
    /// optional so offline commands work without a bearer token.
    pub fn from_config(config: Config) -> Result<Self> {
        let store: Arc<dyn TweetStore> = Arc::new(SqliteStore::open(&config.database.path)?);
        let broker = queue::connect(&config.queue)?;
        let source = match TwitterClient::new(&config.twitter) {
            Ok(client) => Some(Arc::new(client) as Arc<dyn TweetSource>),
            Err(e) => {
                log::warn!("Search client unavailable: {}", e);
                None
            }
        };
        Ok(Self::new(Arc::new(config), store, broker, source))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn TweetStore> {
        &self.store
    }

    pub fn processor(&self) -> &Arc<TweetProcessor> {
        &self.processor
    }

    pub fn metrics(&self) -> MetricsCalculator {
        MetricsCalculator::new(
            Arc::clone(&self.store),
            self.config.analysis.hashtag_min_usage,
        )
    }

    /// Consumer on the raw topic using the configured poll timeout.
    pub fn consumer(&self) -> TweetConsumer {
        TweetConsumer::new(
            Arc::clone(&self.processor),
            Arc::clone(&self.broker),
            self.config.queue.topics.raw.clone(),
            Duration::from_millis(self.config.analysis.poll_timeout_ms),
        )
    }

    pub async fn init_db(&self) -> Result<()> {
        self.store.create_tables().await?;
        log::info!("Database setup completed");
        Ok(())
    }

    /// One fetch-and-produce round.
    pub async fn fetch(&self) -> Result<FetchOutcome> {
        let source = self
            .source
            .as_deref()
            .ok_or_else(|| AppError::config("no tweet source: set TWITTER_BEARER_TOKEN"))?;
        fetch_and_produce(&self.config, source, self.broker.as_ref()).await
    }

    /// Process raw tweets from a JSON file directly, bypassing the broker.
    pub async fn process_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        let tweets = parse_raw_tweets(&content)?;
        log::info!(
            "Loaded {} raw tweets from {}",
            tweets.len(),
            path.as_ref().display()
        );

        let mut processed = 0;
        for tweet in &tweets {
            if self.processor.process(tweet).await.is_some() {
                processed += 1;
            }
        }
        Ok(processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::MemoryBroker;

    fn offline() -> Pipeline {
        Pipeline::new(
            Arc::new(Config::default()),
            Arc::new(SqliteStore::in_memory().unwrap()),
            Arc::new(MemoryBroker::new()),
            None,
        )
    }

    #[tokio::test]
    async fn test_fetch_without_source_fails() {
        let pipeline = offline();
        assert!(matches!(pipeline.fetch().await, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_process_file() {
        let pipeline = offline();
        pipeline.init_db().await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tweets.json");
        std::fs::write(
            &path,
            r#"[{"id": "1", "text": "Nyayo is loud #HarambeeStars"},
                {"id": "2", "text": "Mkapa sold out #TaifaStars"},
                {"id": "1", "text": "Nyayo is loud #HarambeeStars"}]"#,
        )
        .unwrap();

        assert_eq!(pipeline.process_file(&path).await.unwrap(), 3);
        assert_eq!(pipeline.store().tweet_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_from_config_without_token() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.database.path = dir.path().join("db.sqlite").display().to_string();

        let pipeline = Pipeline::from_config(config).unwrap();
        pipeline.init_db().await.unwrap();
        assert!(pipeline.fetch().await.is_err());
    }
}
