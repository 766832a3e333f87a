//! Storage abstractions for processed tweets.
//!
//! The store keeps one row per tweet id and answers the aggregate queries
//! behind the analytics report:
//!
//! - per-country daily sentiment breakdowns
//! - host-country comparison (volume, sentiment, engagement)
//! - per-country hashtag usage

pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::models::{Category, Country, ProcessedTweet};

// Re-export for convenience
pub use sqlite::SqliteStore;

/// Result of inserting a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same tweet id already exists; nothing was written
    Duplicate,
}

/// Which categories an analytics query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountryFilter {
    /// Every category
    #[default]
    Any,
    /// Host countries plus shared content (Pamoja, CHAN-General)
    AllHosts,
    /// One category only
    Only(Category),
}

/// Parameters for [`TweetStore::analytics_data`].
#[derive(Debug, Clone)]
pub struct AnalyticsQuery {
    pub filter: CountryFilter,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub include_shared: bool,
}

impl AnalyticsQuery {
    /// Everything created at or after `from`.
    pub fn since(from: DateTime<Utc>) -> Self {
        Self {
            filter: CountryFilter::Any,
            from: Some(from),
            to: None,
            include_shared: true,
        }
    }

    pub fn with_filter(mut self, filter: CountryFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Sentiment breakdown for one category on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStats {
    pub country: Category,
    pub date: NaiveDate,
    pub tweet_count: i64,
    pub avg_sentiment: f64,
    pub positive_tweets: i64,
    pub negative_tweets: i64,
    pub neutral_tweets: i64,
    pub shared_content_count: i64,
}

/// Aggregate figures for one host country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryStats {
    pub country: Country,
    pub tweet_count: i64,
    pub avg_sentiment: f64,
    pub positive_tweets: i64,
    pub negative_tweets: i64,
    pub neutral_tweets: i64,
    pub avg_engagement: f64,
}

/// Usage of one hashtag by one host country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HashtagUsage {
    pub country: Country,
    pub hashtag: String,
    pub usage_count: i64,
    pub avg_sentiment: f64,
    pub avg_engagement: f64,
}

/// Trait for tweet storage backends.
#[async_trait]
pub trait TweetStore: Send + Sync {
    /// Create tables and indexes if they do not exist.
    async fn create_tables(&self) -> Result<()>;

    /// Insert a processed tweet; an existing tweet id is left untouched.
    async fn insert_tweet(&self, tweet: &ProcessedTweet) -> Result<InsertOutcome>;

    /// Daily breakdowns grouped by category and date, newest first.
    async fn analytics_data(&self, query: &AnalyticsQuery) -> Result<Vec<DailyStats>>;

    /// Host-country aggregates since `from`, by tweet count descending.
    async fn country_comparison(&self, from: DateTime<Utc>) -> Result<Vec<CountryStats>>;

    /// Host-country hashtag usage since `from`, keeping only pairs used
    /// more than `min_usage` times.
    async fn hashtag_performance(
        &self,
        from: DateTime<Utc>,
        min_usage: i64,
    ) -> Result<Vec<HashtagUsage>>;

    /// Number of stored tweets.
    async fn tweet_count(&self) -> Result<i64>;
}
