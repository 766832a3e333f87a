// src/services/twitter.rs

//! Recent-search client for the Twitter v2 API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{CountryTerms, RawTweet, TwitterConfig};
use crate::services::text::extract_hashtags;

/// Page size bounds accepted by the search endpoint.
const MIN_PAGE: usize = 10;
const MAX_PAGE: usize = 100;

/// Rate-limited requests are retried at most this many times.
const MAX_RATE_LIMIT_RETRIES: usize = 3;

const TWEET_FIELDS: &str = "created_at,author_id,public_metrics";

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<RawTweet>,
    #[serde(default)]
    meta: SearchMeta,
}

#[derive(Debug, Default, Deserialize)]
struct SearchMeta {
    #[serde(default)]
    next_token: Option<String>,
}

/// A source of recent tweets for a search query.
#[async_trait]
pub trait TweetSource: Send + Sync {
    async fn search_recent(&self, query: &str, max_results: usize) -> Result<Vec<RawTweet>>;
}

/// Client for `GET /tweets/search/recent`.
pub struct TwitterClient {
    config: TwitterConfig,
    client: Client,
    endpoint: url::Url,
    token: String,
}

impl TwitterClient {
    /// Build a client; fails when no bearer token is configured.
    pub fn new(config: &TwitterConfig) -> Result<Self> {
        let token = config
            .bearer_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::config("TWITTER_BEARER_TOKEN is not set"))?;

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let endpoint = url::Url::parse(&format!(
            "{}/tweets/search/recent",
            config.api_base_url.trim_end_matches('/')
        ))?;

        Ok(Self {
            config: config.clone(),
            client,
            endpoint,
            token,
        })
    }

    /// Search recent tweets, following `next_token` until `max_results`
    /// tweets are collected or the result set ends.
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<RawTweet>> {
        let mut tweets = Vec::new();
        let mut next_token: Option<String> = None;

        while tweets.len() < max_results {
            let page_size = page_size_for(max_results - tweets.len(), self.config.page_size);
            let page = self
                .fetch_page(query, page_size, next_token.as_deref())
                .await?;

            let count = page.data.len();
            tweets.extend(page.data.into_iter().map(with_hashtags));
            log::debug!("Search page returned {} tweets for {}", count, query);

            match page.meta.next_token {
                Some(token) if count > 0 => next_token = Some(token),
                _ => break,
            }
        }

        tweets.truncate(max_results);
        Ok(tweets)
    }

    async fn fetch_page(
        &self,
        query: &str,
        page_size: usize,
        next_token: Option<&str>,
    ) -> Result<SearchResponse> {
        let page_size = page_size.to_string();
        let mut params = vec![
            ("query", query),
            ("max_results", page_size.as_str()),
            ("tweet.fields", TWEET_FIELDS),
        ];
        if let Some(token) = next_token {
            params.push(("next_token", token));
        }

        let mut attempt = 0;
        loop {
            let response = self
                .client
                .get(self.endpoint.clone())
                .bearer_auth(&self.token)
                .query(&params)
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS && attempt < MAX_RATE_LIMIT_RETRIES {
                attempt += 1;
                let wait = rate_limit_wait(
                    response.headers(),
                    Utc::now().timestamp(),
                    self.config.max_rate_limit_wait_secs,
                );
                log::warn!(
                    "Rate limit reached. Waiting {}s before retry {}/{}",
                    wait.as_secs(),
                    attempt,
                    MAX_RATE_LIMIT_RETRIES
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::twitter(status.as_u16(), body));
            }

            return Ok(response.json::<SearchResponse>().await?);
        }
    }
}

/// Build the search query for one country: its search hashtags joined with
/// `OR`, excluding retweets, English only.
pub fn build_query(terms: &CountryTerms) -> String {
    format!(
        "({}) -is:retweet lang:en",
        terms.search_hashtags.join(" OR ")
    )
}

#[async_trait]
impl TweetSource for TwitterClient {
    async fn search_recent(&self, query: &str, max_results: usize) -> Result<Vec<RawTweet>> {
        self.search(query, max_results).await
    }
}

fn page_size_for(remaining: usize, configured: usize) -> usize {
    remaining.min(configured).clamp(MIN_PAGE, MAX_PAGE)
}

fn with_hashtags(mut tweet: RawTweet) -> RawTweet {
    if tweet.hashtags.is_empty() {
        tweet.hashtags = extract_hashtags(&tweet.text);
    }
    tweet
}

/// Time until the rate-limit window resets, capped at `cap_secs`.
///
/// Falls back to one second past `now` when the reset header is absent or
/// already in the past.
fn rate_limit_wait(headers: &HeaderMap, now: i64, cap_secs: u64) -> Duration {
    let reset = headers
        .get("x-rate-limit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok());

    let secs = match reset {
        Some(reset) if reset > now => (reset - now) as u64 + 1,
        _ => 1,
    };
    Duration::from_secs(secs.min(cap_secs.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Country, Vocabulary};
    use reqwest::header::HeaderValue;

    #[test]
    fn test_build_query_for_kenya() {
        let vocabulary = Vocabulary::default();
        let query = build_query(vocabulary.terms(Country::Kenya).unwrap());
        assert_eq!(
            query,
            "(#CHAN2024 OR #TotalEnergiesCHAN2024 OR #HarambeeStars) -is:retweet lang:en"
        );
    }

    #[test]
    fn test_page_size_bounds() {
        assert_eq!(page_size_for(50, 100), 50);
        assert_eq!(page_size_for(3, 100), 10);
        assert_eq!(page_size_for(500, 100), 100);
        assert_eq!(page_size_for(500, 40), 40);
    }

    #[test]
    fn test_rate_limit_wait_uses_reset_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-rate-limit-reset", HeaderValue::from_static("1100"));
        assert_eq!(rate_limit_wait(&headers, 1000, 900), Duration::from_secs(101));
        assert_eq!(rate_limit_wait(&headers, 1000, 60), Duration::from_secs(60));
    }

    #[test]
    fn test_rate_limit_wait_without_header() {
        let headers = HeaderMap::new();
        assert_eq!(rate_limit_wait(&headers, 1000, 900), Duration::from_secs(1));
    }

    #[test]
    fn test_search_response_parsing() {
        let body = r#"{
            "data": [
                {"id": "1", "text": "Nyayo tonight #HarambeeStars #CHAN2024",
                 "public_metrics": {"retweet_count": 1, "like_count": 2, "reply_count": 0, "quote_count": 0}}
            ],
            "meta": {"result_count": 1, "next_token": "abc"}
        }"#;
        let page: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(page.meta.next_token.as_deref(), Some("abc"));

        let tweet = with_hashtags(page.data.into_iter().next().unwrap());
        assert_eq!(tweet.hashtags, vec!["#harambeestars", "#chan2024"]);
    }

    #[test]
    fn test_empty_search_response() {
        let page: SearchResponse = serde_json::from_str(r#"{"meta": {"result_count": 0}}"#).unwrap();
        assert!(page.data.is_empty());
        assert!(page.meta.next_token.is_none());
    }

    #[test]
    fn test_client_requires_token() {
        let config = TwitterConfig::default();
        assert!(matches!(TwitterClient::new(&config), Err(AppError::Config(_))));

        let config = TwitterConfig {
            bearer_token: Some("token".into()),
            ..TwitterConfig::default()
        };
        let client = TwitterClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint.as_str(),
            "https://api.twitter.com/2/tweets/search/recent"
        );
    }
}
