// src/services/analytics.rs

//! Derived metrics over stored tweets.
//!
//! Turns the store's aggregate queries into the figures shown in the
//! report: sentiment distributions, country rankings, hashtag winners and a
//! CSV trend export.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{Category, Country};
use crate::storage::{AnalyticsQuery, CountryFilter, CountryStats, HashtagUsage, TweetStore};

/// Label used for the combined host-country distribution.
pub const ALL_HOSTS_LABEL: &str = "All_Host_Countries";

/// Sentiment split for one slice of tweets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentDistribution {
    pub total_tweets: i64,
    pub positive_percentage: f64,
    pub negative_percentage: f64,
    pub neutral_percentage: f64,
    /// Mean of the per-day averages
    pub avg_sentiment: f64,
}

/// One host country's position in the volume ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryRanking {
    pub rank: usize,
    pub country: Country,
    pub tweet_count: i64,
    pub avg_sentiment: f64,
    pub positive_tweets: i64,
    pub negative_tweets: i64,
    pub neutral_tweets: i64,
    pub avg_engagement: f64,
    pub positive_percentage: f64,
    pub negative_percentage: f64,
    pub neutral_percentage: f64,
}

/// The country that used a contested hashtag most.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HashtagWinner {
    pub hashtag: String,
    pub winner: Country,
    pub usage_count: i64,
    pub avg_sentiment: f64,
    pub avg_engagement: f64,
    /// Every competing country with its usage count
    pub competition: Vec<(Country, i64)>,
}

/// Headline figures derived from the rankings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total_tweets: i64,
    /// Tweet-weighted mean of the per-country averages
    pub overall_sentiment: f64,
    pub most_active: Country,
    pub most_positive: Country,
    pub most_positive_percentage: f64,
    pub highest_engagement: Country,
    pub highest_engagement_value: f64,
}

/// Computes report metrics from a [`TweetStore`].
pub struct MetricsCalculator {
    store: Arc<dyn TweetStore>,
    hashtag_min_usage: i64,
}

impl MetricsCalculator {
    pub fn new(store: Arc<dyn TweetStore>, hashtag_min_usage: i64) -> Self {
        Self {
            store,
            hashtag_min_usage,
        }
    }

    /// Sentiment distribution for a slice over the last `days` days.
    ///
    /// Returns `None` when the slice has no tweets.
    pub async fn sentiment_distribution(
        &self,
        filter: CountryFilter,
        days: i64,
    ) -> Result<Option<SentimentDistribution>> {
        let rows = self
            .store
            .analytics_data(&AnalyticsQuery::since(days_ago(days)?).with_filter(filter))
            .await?;

        let total: i64 = rows.iter().map(|r| r.tweet_count).sum();
        if total == 0 {
            return Ok(None);
        }
        let positive: i64 = rows.iter().map(|r| r.positive_tweets).sum();
        let negative: i64 = rows.iter().map(|r| r.negative_tweets).sum();
        let neutral: i64 = rows.iter().map(|r| r.neutral_tweets).sum();
        let mean = rows.iter().map(|r| r.avg_sentiment).sum::<f64>() / rows.len() as f64;

        Ok(Some(SentimentDistribution {
            total_tweets: total,
            positive_percentage: percentage(positive, total),
            negative_percentage: percentage(negative, total),
            neutral_percentage: percentage(neutral, total),
            avg_sentiment: round_to(mean, 3),
        }))
    }

    /// Distributions for each host country, Pamoja, and all hosts combined.
    pub async fn compare_countries(
        &self,
        days: i64,
    ) -> Result<Vec<(String, Option<SentimentDistribution>)>> {
        let mut comparison = Vec::new();
        let slices = Country::ALL
            .iter()
            .map(|&c| Category::from(c))
            .chain([Category::Pamoja]);
        for category in slices {
            let dist = self
                .sentiment_distribution(CountryFilter::Only(category), days)
                .await?;
            comparison.push((category.to_string(), dist));
        }
        let all = self
            .sentiment_distribution(CountryFilter::AllHosts, days)
            .await?;
        comparison.push((ALL_HOSTS_LABEL.to_string(), all));
        Ok(comparison)
    }

    /// Host countries ranked by tweet volume.
    pub async fn country_rankings(&self, days: i64) -> Result<Vec<CountryRanking>> {
        let stats = self.store.country_comparison(days_ago(days)?).await?;
        Ok(rank_countries(stats))
    }

    /// Winners for hashtags used by more than one host country.
    pub async fn hashtag_winners(&self, days: i64) -> Result<Vec<HashtagWinner>> {
        let usage = self
            .store
            .hashtag_performance(days_ago(days)?, self.hashtag_min_usage)
            .await?;

        let mut groups: BTreeMap<String, Vec<_>> = BTreeMap::new();
        for row in usage {
            groups.entry(row.hashtag.clone()).or_default().push(row);
        }

        let winners = groups
            .into_iter()
            .filter(|(_, rows)| rows.len() > 1)
            .filter_map(|(hashtag, mut rows)| {
                rows.sort_by(|a, b| a.country.cmp(&b.country));
                let winner = rows.iter().fold(
                    None::<&HashtagUsage>,
                    |best: Option<&HashtagUsage>, row| match best {
                        Some(b) if b.usage_count >= row.usage_count => Some(b),
                        _ => Some(row),
                    },
                )?;
                Some(HashtagWinner {
                    hashtag,
                    winner: winner.country,
                    usage_count: winner.usage_count,
                    avg_sentiment: round_to(winner.avg_sentiment, 3),
                    avg_engagement: round_to(winner.avg_engagement, 2),
                    competition: rows.iter().map(|r| (r.country, r.usage_count)).collect(),
                })
            })
            .collect();
        Ok(winners)
    }

    /// Write the per-category daily trend data to CSV.
    ///
    /// Returns `false` (and writes nothing) when there is no data.
    pub async fn export_report(&self, path: impl AsRef<Path>, days: i64) -> Result<bool> {
        let rows = self
            .store
            .analytics_data(&AnalyticsQuery::since(days_ago(days)?))
            .await?;
        if rows.is_empty() {
            return Ok(false);
        }

        let mut writer = csv::Writer::from_path(path.as_ref())?;
        for row in &rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        log::info!(
            "Exported {} rows to {}",
            rows.len(),
            path.as_ref().display()
        );
        Ok(true)
    }
}

/// Rank host-country aggregates by tweet count (stable on ties).
pub fn rank_countries(mut stats: Vec<CountryStats>) -> Vec<CountryRanking> {
    stats.sort_by(|a, b| b.tweet_count.cmp(&a.tweet_count));
    stats
        .into_iter()
        .filter(|s| s.tweet_count > 0)
        .enumerate()
        .map(|(i, s)| CountryRanking {
            rank: i + 1,
            country: s.country,
            tweet_count: s.tweet_count,
            avg_sentiment: round_to(s.avg_sentiment, 3),
            positive_tweets: s.positive_tweets,
            negative_tweets: s.negative_tweets,
            neutral_tweets: s.neutral_tweets,
            avg_engagement: round_to(s.avg_engagement, 2),
            positive_percentage: percentage(s.positive_tweets, s.tweet_count),
            negative_percentage: percentage(s.negative_tweets, s.tweet_count),
            neutral_percentage: percentage(s.neutral_tweets, s.tweet_count),
        })
        .collect()
}

/// Headline figures; `None` for empty rankings.
pub fn summarize(rankings: &[CountryRanking]) -> Option<ReportSummary> {
    let first = rankings.first()?;
    let total: i64 = rankings.iter().map(|r| r.tweet_count).sum();
    let weighted: f64 = rankings
        .iter()
        .map(|r| r.avg_sentiment * r.tweet_count as f64)
        .sum();

    // First entry wins ties, so earlier ranks are preferred.
    let max_by = |key: fn(&CountryRanking) -> f64| {
        rankings
            .iter()
            .fold(first, |best, r| if key(r) > key(best) { r } else { best })
    };
    let most_positive = max_by(|r| r.positive_percentage);
    let most_engaging = max_by(|r| r.avg_engagement);

    Some(ReportSummary {
        total_tweets: total,
        overall_sentiment: round_to(weighted / total as f64, 3),
        most_active: first.country,
        most_positive: most_positive.country,
        most_positive_percentage: most_positive.positive_percentage,
        highest_engagement: most_engaging.country,
        highest_engagement_value: most_engaging.avg_engagement,
    })
}

/// Start of a look-back window of `days` days ending now.
fn days_ago(days: i64) -> Result<DateTime<Utc>> {
    if days < 0 {
        return Err(AppError::validation(format!(
            "look-back window must not be negative, got {days} days"
        )));
    }
    Duration::try_days(days)
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .ok_or_else(|| AppError::validation(format!("look-back window of {days} days is out of range")))
}

fn percentage(part: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to(part as f64 / total as f64 * 100.0, 2)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
