//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Country, Vocabulary};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Search API client settings
    #[serde(default)]
    pub twitter: TwitterConfig,

    /// SQLite store settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Message broker settings
    #[serde(default)]
    pub queue: QueueConfig,

    /// Scheduling and reporting settings
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Classification tables
    #[serde(default)]
    pub vocabulary: Vocabulary,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply overrides from process environment variables.
    pub fn with_env(self) -> Self {
        self.with_env_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Recognized: `TWITTER_BEARER_TOKEN`, `DB_PATH`, `KAFKA_BOOTSTRAP_SERVERS`
    /// (comma separated), `KAFKA_TOPIC_RAW`, `KAFKA_TOPIC_PROCESSED`.
    pub fn with_env_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty("TWITTER_BEARER_TOKEN") {
            self.twitter.bearer_token = Some(token);
        }
        if let Some(path) = non_empty("DB_PATH") {
            self.database.path = path;
        }
        if let Some(servers) = non_empty("KAFKA_BOOTSTRAP_SERVERS") {
            self.queue.bootstrap_servers = servers
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(topic) = non_empty("KAFKA_TOPIC_RAW") {
            self.queue.topics.raw = topic;
        }
        if let Some(topic) = non_empty("KAFKA_TOPIC_PROCESSED") {
            self.queue.topics.processed = topic;
        }
        self
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.twitter.api_base_url)?;
        if self.twitter.user_agent.trim().is_empty() {
            return Err(AppError::validation("twitter.user_agent is empty"));
        }
        if self.twitter.timeout_secs == 0 {
            return Err(AppError::validation("twitter.timeout_secs must be > 0"));
        }
        if self.twitter.max_results == 0 {
            return Err(AppError::validation("twitter.max_results must be > 0"));
        }
        if !(10..=100).contains(&self.twitter.page_size) {
            return Err(AppError::validation(
                "twitter.page_size must be between 10 and 100",
            ));
        }
        if self.twitter.max_concurrent == 0 {
            return Err(AppError::validation("twitter.max_concurrent must be > 0"));
        }
        if self.database.path.trim().is_empty() {
            return Err(AppError::validation("database.path is empty"));
        }
        if self.queue.backend == QueueBackend::Kafka && self.queue.bootstrap_servers.is_empty() {
            return Err(AppError::validation(
                "queue.bootstrap_servers is required for the kafka backend",
            ));
        }
        if self.queue.memory_capacity == 0 {
            return Err(AppError::validation("queue.memory_capacity must be > 0"));
        }
        self.queue.topics.validate()?;
        if self.analysis.fetch_interval_secs == 0 || self.analysis.report_interval_secs == 0 {
            return Err(AppError::validation("analysis intervals must be > 0"));
        }
        if self.analysis.poll_timeout_ms == 0 {
            return Err(AppError::validation("analysis.poll_timeout_ms must be > 0"));
        }
        if self.analysis.report_days <= 0 {
            return Err(AppError::validation("analysis.report_days must be > 0"));
        }
        self.vocabulary.validate()
    }
}

/// Search API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterConfig {
    /// Base URL of the v2 API
    #[serde(default = "defaults::api_base_url")]
    pub api_base_url: String,

    /// Bearer token (usually supplied through `TWITTER_BEARER_TOKEN`)
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Tweets to collect per query
    #[serde(default = "defaults::max_results")]
    pub max_results: usize,

    /// Tweets requested per page (API accepts 10-100)
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Longest wait for a rate-limit window to reset
    #[serde(default = "defaults::max_rate_limit_wait")]
    pub max_rate_limit_wait_secs: u64,

    /// Country queries run concurrently
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            api_base_url: defaults::api_base_url(),
            bearer_token: None,
            max_results: defaults::max_results(),
            page_size: defaults::page_size(),
            timeout_secs: defaults::timeout(),
            user_agent: defaults::user_agent(),
            max_rate_limit_wait_secs: defaults::max_rate_limit_wait(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// SQLite store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "defaults::database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: defaults::database_path(),
        }
    }
}

/// Which broker implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueueBackend {
    /// In-process queues; nothing leaves the process
    #[default]
    Memory,
    /// Kafka (requires the `kafka` feature)
    Kafka,
}

/// Message broker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default)]
    pub backend: QueueBackend,

    #[serde(default = "defaults::bootstrap_servers")]
    pub bootstrap_servers: Vec<String>,

    #[serde(default = "defaults::client_id")]
    pub client_id: String,

    #[serde(default = "defaults::group_id")]
    pub group_id: String,

    /// Messages kept per topic by the in-process broker
    #[serde(default = "defaults::memory_capacity")]
    pub memory_capacity: usize,

    #[serde(default)]
    pub topics: TopicConfig,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: QueueBackend::default(),
            bootstrap_servers: defaults::bootstrap_servers(),
            client_id: defaults::client_id(),
            group_id: defaults::group_id(),
            memory_capacity: defaults::memory_capacity(),
            topics: TopicConfig::default(),
        }
    }
}

/// Topic names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicConfig {
    #[serde(default = "defaults::topic_raw")]
    pub raw: String,
    #[serde(default = "defaults::topic_processed")]
    pub processed: String,
    #[serde(default = "defaults::topic_kenya")]
    pub kenya: String,
    #[serde(default = "defaults::topic_uganda")]
    pub uganda: String,
    #[serde(default = "defaults::topic_tanzania")]
    pub tanzania: String,
}

impl TopicConfig {
    /// Topic carrying a host country's records.
    pub fn for_country(&self, country: Country) -> &str {
        match country {
            Country::Kenya => &self.kenya,
            Country::Uganda => &self.uganda,
            Country::Tanzania => &self.tanzania,
        }
    }

    fn validate(&self) -> Result<()> {
        let all = [
            &self.raw,
            &self.processed,
            &self.kenya,
            &self.uganda,
            &self.tanzania,
        ];
        if all.iter().any(|t| t.trim().is_empty()) {
            return Err(AppError::validation("queue.topics entries must not be empty"));
        }
        if self.raw == self.processed {
            return Err(AppError::validation(
                "queue.topics.raw and queue.topics.processed must differ",
            ));
        }
        Ok(())
    }
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            raw: defaults::topic_raw(),
            processed: defaults::topic_processed(),
            kenya: defaults::topic_kenya(),
            uganda: defaults::topic_uganda(),
            tanzania: defaults::topic_tanzania(),
        }
    }
}

/// Scheduling and reporting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Seconds between fetch rounds in real-time mode
    #[serde(default = "defaults::fetch_interval")]
    pub fetch_interval_secs: u64,

    /// Seconds between console reports in real-time mode
    #[serde(default = "defaults::report_interval")]
    pub report_interval_secs: u64,

    /// How long batch mode keeps consuming after the fetch
    #[serde(default = "defaults::batch_timeout")]
    pub batch_timeout_secs: u64,

    /// Consumer poll timeout
    #[serde(default = "defaults::poll_timeout")]
    pub poll_timeout_ms: u64,

    /// Look-back window for reports
    #[serde(default = "defaults::report_days")]
    pub report_days: i64,

    /// A country must use a hashtag more than this many times to compete for it
    #[serde(default = "defaults::hashtag_min_usage")]
    pub hashtag_min_usage: i64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fetch_interval_secs: defaults::fetch_interval(),
            report_interval_secs: defaults::report_interval(),
            batch_timeout_secs: defaults::batch_timeout(),
            poll_timeout_ms: defaults::poll_timeout(),
            report_days: defaults::report_days(),
            hashtag_min_usage: defaults::hashtag_min_usage(),
        }
    }
}

mod defaults {
    // Twitter defaults
    pub fn api_base_url() -> String {
        "https://api.twitter.com/2".into()
    }
    pub fn max_results() -> usize {
        50
    }
    pub fn page_size() -> usize {
        100
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn user_agent() -> String {
        "chan-pulse/0.1".into()
    }
    pub fn max_rate_limit_wait() -> u64 {
        900
    }
    pub fn max_concurrent() -> usize {
        3
    }

    // Database defaults
    pub fn database_path() -> String {
        "storage/chan2024_analytics.db".into()
    }

    // Queue defaults
    pub fn bootstrap_servers() -> Vec<String> {
        vec!["localhost:9092".into()]
    }
    pub fn client_id() -> String {
        "chan2024-producer".into()
    }
    pub fn group_id() -> String {
        "chan2024-consumer-group".into()
    }
    pub fn memory_capacity() -> usize {
        10_000
    }
    pub fn topic_raw() -> String {
        "chan2024-tweets-raw".into()
    }
    pub fn topic_processed() -> String {
        "chan2024-tweets-processed".into()
    }
    pub fn topic_kenya() -> String {
        "kenya-hashtags".into()
    }
    pub fn topic_uganda() -> String {
        "uganda-hashtags".into()
    }
    pub fn topic_tanzania() -> String {
        "tanzania-hashtags".into()
    }

    // Analysis defaults
    pub fn fetch_interval() -> u64 {
        60
    }
    pub fn report_interval() -> u64 {
        300
    }
    pub fn batch_timeout() -> u64 {
        60
    }
    pub fn poll_timeout() -> u64 {
        1000
    }
    pub fn report_days() -> i64 {
        7
    }
    pub fn hashtag_min_usage() -> i64 {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_page_size() {
        let mut config = Config::default();
        config.twitter.page_size = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_api_url() {
        let mut config = Config::default();
        config.twitter.api_base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_kafka_without_servers() {
        let mut config = Config::default();
        config.queue.backend = QueueBackend::Kafka;
        config.queue.bootstrap_servers.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_memory_capacity() {
        let mut config = Config::default();
        config.queue.memory_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_same_raw_and_processed_topic() {
        let mut config = Config::default();
        config.queue.topics.processed = config.queue.topics.raw.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let config = Config::default().with_env_lookup(|key| match key {
            "TWITTER_BEARER_TOKEN" => Some("secret".to_string()),
            "KAFKA_BOOTSTRAP_SERVERS" => Some("a:9092, b:9092".to_string()),
            "KAFKA_TOPIC_RAW" => Some("".to_string()),
            _ => None,
        });
        assert_eq!(config.twitter.bearer_token.as_deref(), Some("secret"));
        assert_eq!(config.queue.bootstrap_servers, vec!["a:9092", "b:9092"]);
        assert_eq!(config.queue.topics.raw, "chan2024-tweets-raw");
    }

    #[test]
    fn load_reports_toml_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[queue\nbackend = ").unwrap();
        assert!(matches!(Config::load(&path), Err(AppError::Toml(_))));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [queue]
            backend = "kafka"

            [queue.topics]
            kenya = "ke-topic"

            [analysis]
            report_days = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.queue.backend, QueueBackend::Kafka);
        assert_eq!(config.queue.topics.for_country(Country::Kenya), "ke-topic");
        assert_eq!(config.queue.topics.uganda, "uganda-hashtags");
        assert_eq!(config.analysis.report_days, 3);
        assert_eq!(config.analysis.fetch_interval_secs, 60);
        assert!(config.validate().is_ok());
    }
}
