//! Where a processed record is published.
//!
//! - host-country label: that country's topic
//! - Pamoja / CHAN-General: one tagged copy per host country topic
//! - General: no country topic

use crate::models::{Category, Country, ProcessedTweet, TopicConfig};

/// One record bound for one topic.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub topic: String,
    pub record: ProcessedTweet,
}

/// Country-topic deliveries for a processed record.
pub fn route(record: &ProcessedTweet, topics: &TopicConfig) -> Vec<Delivery> {
    match record.country {
        Category::Kenya | Category::Uganda | Category::Tanzania => record
            .country
            .country()
            .map(|country| Delivery {
                topic: topics.for_country(country).to_string(),
                record: record.clone(),
            })
            .into_iter()
            .collect(),
        Category::Pamoja | Category::ChanGeneral => Country::ALL
            .iter()
            .map(|&country| Delivery {
                topic: topics.for_country(country).to_string(),
                record: record.shared_copy(country),
            })
            .collect(),
        Category::General => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SentimentLabel;

    fn record(country: Category) -> ProcessedTweet {
        ProcessedTweet {
            tweet_id: "1".into(),
            text: "text".into(),
            author_id: None,
            created_at: None,
            hashtags: vec![],
            country,
            sentiment_score: 0.0,
            sentiment_label: SentimentLabel::Neutral,
            retweet_count: 0,
            like_count: 0,
            reply_count: 0,
            is_shared_content: country.is_shared(),
            shared_for_country: None,
        }
    }

    #[test]
    fn test_country_goes_to_own_topic() {
        let deliveries = route(&record(Category::Uganda), &TopicConfig::default());
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].topic, "uganda-hashtags");
        assert!(deliveries[0].record.shared_for_country.is_none());
    }

    #[test]
    fn test_shared_fans_out_to_every_host() {
        for category in [Category::Pamoja, Category::ChanGeneral] {
            let deliveries = route(&record(category), &TopicConfig::default());
            let topics: Vec<_> = deliveries.iter().map(|d| d.topic.as_str()).collect();
            assert_eq!(
                topics,
                vec!["kenya-hashtags", "uganda-hashtags", "tanzania-hashtags"]
            );
            let tags: Vec<_> = deliveries
                .iter()
                .map(|d| d.record.shared_for_country.as_deref().unwrap())
                .collect();
            assert_eq!(tags, vec!["Kenya", "Uganda", "Tanzania"]);
        }
    }

    #[test]
    fn test_general_has_no_country_topic() {
        assert!(route(&record(Category::General), &TopicConfig::default()).is_empty());
    }
}
