// src/pipeline/report.rs

//! Console analytics report.

use crate::error::Result;
use crate::services::MetricsCalculator;
use crate::services::analytics::{CountryRanking, HashtagWinner, summarize};
use crate::utils::console;

/// Hashtags shown in the leaders section.
const TRACKED_HASHTAGS: &[&str] = &[
    "#chan2024",
    "#totalenergieschan2024",
    "#harambeestars",
    "#ugandacranes",
    "#taifastars",
];

/// Print the country comparison report for the last `days` days.
///
/// Returns `false` when there is nothing to report.
pub async fn render_report(metrics: &MetricsCalculator, days: i64) -> Result<bool> {
    console::header("CHAN 2024 TOTALENERGIES COUNTRY TWEET COMPARISON REPORT");

    let rankings = metrics.country_rankings(days).await?;
    let Some(summary) = summarize(&rankings) else {
        console::info("No data available for analysis");
        return Ok(false);
    };

    if let Some(champion) = rankings.first() {
        console::info(&format!(
            "TWEET VOLUME CHAMPION: {}",
            champion.country.name().to_uppercase()
        ));
        console::sub_item(&format!("Total Tweets: {}", champion.tweet_count));
        console::sub_item(&format!("Average Engagement: {}", champion.avg_engagement));
        console::sub_item(&format!("Sentiment Score: {}", champion.avg_sentiment));
    }

    console::info("COMPLETE COUNTRY RANKINGS:");
    console::separator();
    for ranking in &rankings {
        print_ranking(ranking);
    }

    let winners = metrics.hashtag_winners(days).await?;
    let leaders: Vec<_> = winners
        .iter()
        .filter(|w| TRACKED_HASHTAGS.contains(&w.hashtag.to_lowercase().as_str()))
        .collect();
    if !leaders.is_empty() {
        console::info("HASHTAG PERFORMANCE LEADERS:");
        console::separator();
        for winner in leaders {
            print_winner(winner);
        }
    }

    console::summary(
        "SUMMARY INSIGHTS",
        &[
            ("Total Tweets Analyzed", summary.total_tweets.to_string()),
            ("Overall Sentiment", format!("{:.3}", summary.overall_sentiment)),
            ("Most Active Country", summary.most_active.to_string()),
            (
                "Most Positive Country",
                format!(
                    "{} ({}% positive)",
                    summary.most_positive, summary.most_positive_percentage
                ),
            ),
            (
                "Highest Engagement",
                format!(
                    "{} (avg: {})",
                    summary.highest_engagement, summary.highest_engagement_value
                ),
            ),
        ],
    );
    console::separator();
    console::success("All three countries are united in hosting CHAN 2024 Pamoja!");
    Ok(true)
}

fn print_ranking(r: &CountryRanking) {
    console::info(&format!("#{} {}", r.rank, r.country.name().to_uppercase()));
    console::sub_item(&format!("Total Tweets: {}", r.tweet_count));
    console::sub_item(&format!("Avg Sentiment: {}", r.avg_sentiment));
    console::sub_item(&format!(
        "Positive: {}% ({} tweets)",
        r.positive_percentage, r.positive_tweets
    ));
    console::sub_item(&format!(
        "Negative: {}% ({} tweets)",
        r.negative_percentage, r.negative_tweets
    ));
    console::sub_item(&format!(
        "Neutral: {}% ({} tweets)",
        r.neutral_percentage, r.neutral_tweets
    ));
    console::sub_item(&format!("Avg Engagement: {}", r.avg_engagement));
}

fn print_winner(w: &HashtagWinner) {
    console::info(&format!(
        "  {}: {} ({} tweets)",
        w.hashtag, w.winner, w.usage_count
    ));
    console::sub_item(&format!(
        "Sentiment: {} | Engagement: {}",
        w.avg_sentiment, w.avg_engagement
    ));
    let competition: Vec<String> = w
        .competition
        .iter()
        .map(|(country, count)| format!("{}: {}", country, count))
        .collect();
    console::sub_item(&format!("Competition: {}", competition.join(" | ")));
}
