//! Tweet data structures: raw search results and processed records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{Category, Country};

/// Engagement counters reported by the search API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicMetrics {
    #[serde(default)]
    pub retweet_count: i64,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub reply_count: i64,
    #[serde(default)]
    pub quote_count: i64,
}

/// A tweet as fetched from the search API and published to the raw topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTweet {
    /// Tweet ID (the API sends strings; numbers are accepted too)
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    pub text: String,

    #[serde(default)]
    pub author_id: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub public_metrics: PublicMetrics,

    /// Lowercase hashtags extracted at fetch time
    #[serde(default)]
    pub hashtags: Vec<String>,
}

/// Sentiment polarity label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Positive at or above this compound score.
    pub const POSITIVE_THRESHOLD: f64 = 0.05;
    /// Negative at or below this compound score.
    pub const NEGATIVE_THRESHOLD: f64 = -0.05;

    /// Map a compound score to its label.
    pub fn from_compound(compound: f64) -> Self {
        if compound >= Self::POSITIVE_THRESHOLD {
            SentimentLabel::Positive
        } else if compound <= Self::NEGATIVE_THRESHOLD {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified, scored tweet ready for storage and distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedTweet {
    pub tweet_id: String,
    pub text: String,
    pub author_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub hashtags: Vec<String>,
    pub country: Category,
    pub sentiment_score: f64,
    pub sentiment_label: SentimentLabel,
    pub retweet_count: i64,
    pub like_count: i64,
    pub reply_count: i64,
    pub is_shared_content: bool,

    /// Set only on the per-country copies of shared content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_for_country: Option<String>,
}

impl ProcessedTweet {
    /// Total engagement (retweets + likes + replies).
    pub fn engagement(&self) -> i64 {
        self.retweet_count + self.like_count + self.reply_count
    }

    /// Copy of this record tagged for one host country.
    pub fn shared_copy(&self, country: Country) -> Self {
        Self {
            shared_for_country: Some(country.name().to_string()),
            ..self.clone()
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_thresholds() {
        assert_eq!(SentimentLabel::from_compound(0.05), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_compound(0.0499), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_compound(-0.05), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::from_compound(-0.0499), SentimentLabel::Neutral);
    }

    #[test]
    fn test_raw_tweet_accepts_api_payload() {
        let json = r#"{
            "id": "1790000000000000001",
            "text": "Kasarani is rocking! #HarambeeStars",
            "author_id": "42",
            "created_at": "2025-08-03T18:00:00.000Z",
            "public_metrics": {"retweet_count": 3, "like_count": 10, "reply_count": 1, "quote_count": 0}
        }"#;
        let tweet: RawTweet = serde_json::from_str(json).unwrap();
        assert_eq!(tweet.id, "1790000000000000001");
        assert_eq!(tweet.public_metrics.like_count, 10);
        assert!(tweet.hashtags.is_empty());
    }

    #[test]
    fn test_raw_tweet_accepts_numeric_id() {
        let tweet: RawTweet = serde_json::from_str(r#"{"id": 7, "text": "hi"}"#).unwrap();
        assert_eq!(tweet.id, "7");
        assert_eq!(tweet.public_metrics, PublicMetrics::default());
    }

    #[test]
    fn test_shared_copy_is_tagged() {
        let record = ProcessedTweet {
            tweet_id: "1".into(),
            text: "#pamoja".into(),
            author_id: None,
            created_at: None,
            hashtags: vec!["#pamoja".into()],
            country: Category::Pamoja,
            sentiment_score: 0.0,
            sentiment_label: SentimentLabel::Neutral,
            retweet_count: 1,
            like_count: 2,
            reply_count: 3,
            is_shared_content: true,
            shared_for_country: None,
        };
        let copy = record.shared_copy(Country::Tanzania);
        assert_eq!(copy.shared_for_country.as_deref(), Some("Tanzania"));
        assert_eq!(copy.engagement(), 6);

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("shared_for_country").is_none());
    }
}
