//! SQLite storage implementation.
//!
//! A single connection guarded by a mutex; every statement runs on the
//! blocking pool. Hashtags are kept as a JSON array and expanded with
//! `json_each` for the hashtag query.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};

use crate::error::{AppError, Result};
use crate::models::{Category, Country, ProcessedTweet};
use crate::storage::{
    AnalyticsQuery, CountryFilter, CountryStats, DailyStats, HashtagUsage, InsertOutcome,
    TweetStore,
};

/// Timestamp layout stored in `created_at`; sorts lexically and works with
/// SQLite's `DATE()`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tweets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tweet_id TEXT UNIQUE NOT NULL,
    text TEXT NOT NULL,
    author_id TEXT,
    created_at TEXT NOT NULL,
    hashtags TEXT NOT NULL DEFAULT '[]',
    country TEXT NOT NULL,
    sentiment_score REAL NOT NULL,
    sentiment_label TEXT NOT NULL,
    retweet_count INTEGER NOT NULL DEFAULT 0,
    like_count INTEGER NOT NULL DEFAULT 0,
    reply_count INTEGER NOT NULL DEFAULT 0,
    is_shared_content INTEGER NOT NULL DEFAULT 0,
    processed_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_tweets_country ON tweets(country);
CREATE INDEX IF NOT EXISTS idx_tweets_created_at ON tweets(created_at);
CREATE INDEX IF NOT EXISTS idx_tweets_shared ON tweets(is_shared_content);
";

const HOST_COUNTRIES_SQL: &str = "('Kenya', 'Uganda', 'Tanzania')";
const ALL_HOSTS_SQL: &str = "('Kenya', 'Uganda', 'Tanzania', 'Pamoja', 'CHAN-General')";

/// SQLite-backed tweet store.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a database file, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        log::info!("Database connection established: {}", path.display());
        Ok(Self::from_connection(conn))
    }

    /// Private in-memory database.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| std::io::Error::other("sqlite connection lock poisoned"))?;
            f(&guard)
        })
        .await?
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_category(raw: &str) -> Result<Category> {
    raw.parse()
}

fn parse_country(raw: &str) -> Result<Country> {
    parse_category(raw)?
        .country()
        .ok_or_else(|| AppError::validation(format!("'{raw}' is not a host country")))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| AppError::validation(format!("bad date '{raw}': {e}")))
}

/// Build the WHERE clause and bound values for an analytics query.
fn analytics_clause(query: &AnalyticsQuery) -> (String, Vec<Value>) {
    let mut clause = String::from("WHERE 1=1");
    let mut values = Vec::new();

    match query.filter {
        CountryFilter::Any => {}
        CountryFilter::AllHosts => {
            clause.push_str(&format!(" AND country IN {ALL_HOSTS_SQL}"));
        }
        CountryFilter::Only(category) => {
            clause.push_str(" AND country = ?");
            values.push(Value::Text(category.as_str().to_string()));
        }
    }
    if !query.include_shared {
        clause.push_str(" AND is_shared_content = 0");
    }
    if let Some(from) = query.from {
        clause.push_str(" AND created_at >= ?");
        values.push(Value::Text(format_timestamp(from)));
    }
    if let Some(to) = query.to {
        clause.push_str(" AND created_at <= ?");
        values.push(Value::Text(format_timestamp(to)));
    }
    (clause, values)
}

#[async_trait]
impl TweetStore for SqliteStore {
    async fn create_tables(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;
        log::info!("Tables created successfully");
        Ok(())
    }

    async fn insert_tweet(&self, tweet: &ProcessedTweet) -> Result<InsertOutcome> {
        let tweet = tweet.clone();
        let hashtags = serde_json::to_string(&tweet.hashtags)?;
        let created_at = format_timestamp(tweet.created_at.unwrap_or_else(Utc::now));

        self.with_conn(move |conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO tweets (tweet_id, text, author_id, created_at, hashtags,
                    country, sentiment_score, sentiment_label,
                    retweet_count, like_count, reply_count, is_shared_content)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    tweet.tweet_id,
                    tweet.text,
                    tweet.author_id,
                    created_at,
                    hashtags,
                    tweet.country.as_str(),
                    tweet.sentiment_score,
                    tweet.sentiment_label.as_str(),
                    tweet.retweet_count,
                    tweet.like_count,
                    tweet.reply_count,
                    tweet.country.is_shared(),
                ],
            )?;
            Ok(if changed == 0 {
                InsertOutcome::Duplicate
            } else {
                InsertOutcome::Inserted
            })
        })
        .await
    }

    async fn analytics_data(&self, query: &AnalyticsQuery) -> Result<Vec<DailyStats>> {
        let (clause, values) = analytics_clause(query);
        let sql = format!(
            "SELECT country,
                    DATE(created_at) AS date,
                    COUNT(*) AS tweet_count,
                    AVG(sentiment_score) AS avg_sentiment,
                    SUM(CASE WHEN sentiment_label = 'positive' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN sentiment_label = 'negative' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN sentiment_label = 'neutral' THEN 1 ELSE 0 END),
                    SUM(is_shared_content)
             FROM tweets
             {clause}
             GROUP BY country, DATE(created_at)
             ORDER BY date DESC, tweet_count DESC, country"
        );

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, i64>(7)?,
                ))
            })?;

            let mut stats = Vec::new();
            for row in rows {
                let (country, date, count, avg, pos, neg, neu, shared) = row?;
                stats.push(DailyStats {
                    country: parse_category(&country)?,
                    date: parse_date(&date)?,
                    tweet_count: count,
                    avg_sentiment: avg,
                    positive_tweets: pos,
                    negative_tweets: neg,
                    neutral_tweets: neu,
                    shared_content_count: shared,
                });
            }
            Ok(stats)
        })
        .await
    }

    async fn country_comparison(&self, from: DateTime<Utc>) -> Result<Vec<CountryStats>> {
        let from = format_timestamp(from);
        let sql = format!(
            "SELECT country,
                    COUNT(*) AS tweet_count,
                    AVG(sentiment_score),
                    SUM(CASE WHEN sentiment_label = 'positive' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN sentiment_label = 'negative' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN sentiment_label = 'neutral' THEN 1 ELSE 0 END),
                    AVG(retweet_count + like_count + reply_count)
             FROM tweets
             WHERE country IN {HOST_COUNTRIES_SQL} AND created_at >= ?1
             GROUP BY country
             ORDER BY tweet_count DESC"
        );

        let mut stats = self
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![from], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, f64>(6)?,
                    ))
                })?;

                let mut stats = Vec::new();
                for row in rows {
                    let (country, count, avg, pos, neg, neu, engagement) = row?;
                    stats.push(CountryStats {
                        country: parse_country(&country)?,
                        tweet_count: count,
                        avg_sentiment: avg,
                        positive_tweets: pos,
                        negative_tweets: neg,
                        neutral_tweets: neu,
                        avg_engagement: engagement,
                    });
                }
                Ok(stats)
            })
            .await?;

        // Equal counts fall back to country priority.
        stats.sort_by(|a, b| {
            b.tweet_count
                .cmp(&a.tweet_count)
                .then(a.country.cmp(&b.country))
        });
        Ok(stats)
    }

    async fn hashtag_performance(
        &self,
        from: DateTime<Utc>,
        min_usage: i64,
    ) -> Result<Vec<HashtagUsage>> {
        let from = format_timestamp(from);
        let sql = format!(
            "SELECT t.country,
                    j.value AS hashtag,
                    COUNT(*) AS usage_count,
                    AVG(t.sentiment_score),
                    AVG(t.retweet_count + t.like_count + t.reply_count)
             FROM tweets t, json_each(t.hashtags) j
             WHERE t.country IN {HOST_COUNTRIES_SQL} AND t.created_at >= ?1
             GROUP BY t.country, j.value
             HAVING COUNT(*) > ?2
             ORDER BY t.country, usage_count DESC, hashtag"
        );

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![from, min_usage], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                ))
            })?;

            let mut usage = Vec::new();
            for row in rows {
                let (country, hashtag, count, sentiment, engagement) = row?;
                usage.push(HashtagUsage {
                    country: parse_country(&country)?,
                    hashtag,
                    usage_count: count,
                    avg_sentiment: sentiment,
                    avg_engagement: engagement,
                });
            }
            Ok(usage)
        })
        .await
    }

    async fn tweet_count(&self) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM tweets", [], |row| row.get(0))?)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SentimentLabel;
    use chrono::{Duration, TimeZone};

    fn tweet(id: &str, country: Category, score: f64, hashtags: &[&str]) -> ProcessedTweet {
        ProcessedTweet {
            tweet_id: id.to_string(),
            text: format!("tweet {id}"),
            author_id: Some("42".into()),
            created_at: Some(Utc.with_ymd_and_hms(2025, 8, 3, 18, 0, 0).unwrap()),
            hashtags: hashtags.iter().map(|h| h.to_string()).collect(),
            country,
            sentiment_score: score,
            sentiment_label: SentimentLabel::from_compound(score),
            retweet_count: 1,
            like_count: 2,
            reply_count: 3,
            is_shared_content: country.is_shared(),
            shared_for_country: None,
        }
    }

    fn since() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap()
    }

    async fn store() -> SqliteStore {
        let store = SqliteStore::in_memory().unwrap();
        store.create_tables().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_noop() {
        let store = store().await;
        let first = tweet("1", Category::Kenya, 0.5, &[]);
        let mut second = first.clone();
        second.country = Category::Uganda;

        assert_eq!(store.insert_tweet(&first).await.unwrap(), InsertOutcome::Inserted);
        assert_eq!(store.insert_tweet(&second).await.unwrap(), InsertOutcome::Duplicate);
        assert_eq!(store.tweet_count().await.unwrap(), 1);

        let rows = store
            .analytics_data(&AnalyticsQuery::since(since()))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].country, Category::Kenya);
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() {
        let store = store().await;
        store.create_tables().await.unwrap();
        assert_eq!(store.tweet_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_open_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tweets.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.create_tables().await.unwrap();
            store
                .insert_tweet(&tweet("1", Category::Tanzania, 0.2, &[]))
                .await
                .unwrap();
        }
        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.tweet_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_analytics_filters() {
        let store = store().await;
        for t in [
            tweet("1", Category::Kenya, 0.5, &[]),
            tweet("2", Category::Kenya, -0.5, &[]),
            tweet("3", Category::Pamoja, 0.0, &[]),
            tweet("4", Category::General, 0.3, &[]),
        ] {
            store.insert_tweet(&t).await.unwrap();
        }

        let kenya = store
            .analytics_data(
                &AnalyticsQuery::since(since()).with_filter(CountryFilter::Only(Category::Kenya)),
            )
            .await
            .unwrap();
        assert_eq!(kenya.len(), 1);
        assert_eq!(kenya[0].tweet_count, 2);
        assert_eq!(kenya[0].positive_tweets, 1);
        assert_eq!(kenya[0].negative_tweets, 1);
        assert_eq!(kenya[0].date, NaiveDate::from_ymd_opt(2025, 8, 3).unwrap());

        let hosts = store
            .analytics_data(&AnalyticsQuery::since(since()).with_filter(CountryFilter::AllHosts))
            .await
            .unwrap();
        let total: i64 = hosts.iter().map(|r| r.tweet_count).sum();
        assert_eq!(total, 3);
        let shared: i64 = hosts.iter().map(|r| r.shared_content_count).sum();
        assert_eq!(shared, 1);

        let mut no_shared = AnalyticsQuery::since(since());
        no_shared.include_shared = false;
        let rows = store.analytics_data(&no_shared).await.unwrap();
        assert!(rows.iter().all(|r| !r.country.is_shared()));

        let future = store
            .analytics_data(&AnalyticsQuery::since(since() + Duration::days(30)))
            .await
            .unwrap();
        assert!(future.is_empty());
    }

    #[tokio::test]
    async fn test_country_comparison_hosts_only() {
        let store = store().await;
        for t in [
            tweet("1", Category::Uganda, 0.4, &[]),
            tweet("2", Category::Uganda, 0.2, &[]),
            tweet("3", Category::Kenya, 0.1, &[]),
            tweet("4", Category::Pamoja, 0.9, &[]),
        ] {
            store.insert_tweet(&t).await.unwrap();
        }

        let stats = store.country_comparison(since()).await.unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].country, Country::Uganda);
        assert_eq!(stats[0].tweet_count, 2);
        assert!((stats[0].avg_sentiment - 0.3).abs() < 1e-9);
        assert_eq!(stats[0].avg_engagement, 6.0);
        assert_eq!(stats[1].country, Country::Kenya);
    }

    #[tokio::test]
    async fn test_hashtag_performance_threshold() {
        let store = store().await;
        for i in 0..3 {
            store
                .insert_tweet(&tweet(&format!("k{i}"), Category::Kenya, 0.5, &["#chan2024"]))
                .await
                .unwrap();
        }
        for i in 0..2 {
            store
                .insert_tweet(&tweet(&format!("u{i}"), Category::Uganda, 0.5, &["#chan2024"]))
                .await
                .unwrap();
        }

        let usage = store.hashtag_performance(since(), 2).await.unwrap();
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].country, Country::Kenya);
        assert_eq!(usage[0].hashtag, "#chan2024");
        assert_eq!(usage[0].usage_count, 3);

        let usage = store.hashtag_performance(since(), 1).await.unwrap();
        assert_eq!(usage.len(), 2);
    }
}
