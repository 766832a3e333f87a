// src/pipeline/fetch.rs

//! Fetch-and-produce: search every host country and publish raw tweets.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};

use crate::error::Result;
use crate::models::{Config, RawTweet};
use crate::queue::{self, MessageBroker};
use crate::services::{TweetSource, build_query};

/// Summary of a fetch round.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub query_total: usize,
    pub query_failures: usize,
    pub fetched: usize,
    /// Unique tweets published to the raw topic
    pub published: usize,
}

/// Run every country query concurrently, dedupe by tweet id, and publish
/// the survivors to the raw topic.
pub async fn fetch_and_produce(
    config: &Config,
    source: &dyn TweetSource,
    broker: &dyn MessageBroker,
) -> Result<FetchOutcome> {
    let jobs: Vec<_> = config
        .vocabulary
        .ordered()
        .into_iter()
        .map(|terms| (terms.country, build_query(terms)))
        .collect();

    let mut outcome = FetchOutcome {
        query_total: jobs.len(),
        ..FetchOutcome::default()
    };

    let max_results = config.twitter.max_results;
    let mut results = stream::iter(jobs)
        .map(|(country, query)| async move {
            let result = source.search_recent(&query, max_results).await;
            (country, result)
        })
        .buffered(config.twitter.max_concurrent.max(1));

    let mut all = Vec::new();
    while let Some((country, result)) = results.next().await {
        match result {
            Ok(tweets) => {
                log::info!("Fetched {} tweets for {}-focused query", tweets.len(), country);
                all.extend(tweets);
            }
            Err(e) => {
                outcome.query_failures += 1;
                log::warn!("Search failed for {}-focused query: {}", country, e);
            }
        }
    }
    outcome.fetched = all.len();

    let unique = dedupe(all);
    for tweet in &unique {
        queue::publish_json(broker, &config.queue.topics.raw, Some(tweet.id.as_str()), tweet).await?;
    }
    broker.flush().await?;

    outcome.published = unique.len();
    log::info!("Sent {} unique tweets to {}", unique.len(), config.queue.topics.raw);
    Ok(outcome)
}

/// Keep the first occurrence of each tweet id, preserving order.
fn dedupe(tweets: Vec<RawTweet>) -> Vec<RawTweet> {
    let mut seen = HashSet::new();
    tweets
        .into_iter()
        .filter(|t| seen.insert(t.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::queue::MemoryBroker;
    use async_trait::async_trait;

    /// Returns canned tweets keyed on the team hashtag in the query.
    struct CannedSource;

    fn tweet(id: &str) -> RawTweet {
        serde_json::from_value(serde_json::json!({"id": id, "text": "t"})).unwrap()
    }

    #[async_trait]
    impl TweetSource for CannedSource {
        async fn search_recent(&self, query: &str, _max: usize) -> Result<Vec<RawTweet>> {
            if query.contains("#HarambeeStars") {
                Ok(vec![tweet("1"), tweet("2")])
            } else if query.contains("#UgandaCranes") {
                Ok(vec![tweet("2"), tweet("3")])
            } else {
                Err(AppError::twitter(503, "unavailable"))
            }
        }
    }

    #[tokio::test]
    async fn test_fetch_dedupes_and_publishes() {
        let config = Config::default();
        let broker = MemoryBroker::new();

        let outcome = fetch_and_produce(&config, &CannedSource, &broker)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            FetchOutcome {
                query_total: 3,
                query_failures: 1,
                fetched: 4,
                published: 3,
            }
        );
        let ids: Vec<String> = broker
            .drain(&config.queue.topics.raw)
            .await
            .iter()
            .map(|m| serde_json::from_slice::<RawTweet>(m).unwrap().id)
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let tweets = vec![tweet("a"), tweet("b"), tweet("a")];
        let ids: Vec<_> = dedupe(tweets).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
