// src/pipeline/batch.rs

//! One-shot batch analysis.

use std::time::Duration;

use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::pipeline::report::render_report;
use crate::utils::console;

/// Set up the database, fetch once, consume for the batch window, then
/// print the report.
pub async fn run_batch(pipeline: &Pipeline) -> Result<()> {
    let config = pipeline.config();
    let window = Duration::from_secs(config.analysis.batch_timeout_secs);
    console::header("CHAN 2024 batch analysis");

    console::step(1, 4, "Database setup");
    pipeline.init_db().await?;

    console::step(2, 4, "Fetching tweets");
    match pipeline.fetch().await {
        Ok(outcome) => console::sub_item(&format!(
            "{} unique tweets published ({} of {} queries failed)",
            outcome.published, outcome.query_failures, outcome.query_total
        )),
        Err(e) => log::error!("Error fetching tweets: {}", e),
    }

    console::step(3, 4, &format!("Processing for {}s", window.as_secs()));
    let stats = pipeline.consumer().run_for(window).await;
    console::summary(
        "Processing",
        &[
            ("Received", stats.received.to_string()),
            ("Processed", stats.processed.to_string()),
            ("Decode errors", stats.decode_errors.to_string()),
            ("Failed", stats.failed.to_string()),
        ],
    );

    console::step(4, 4, "Report");
    render_report(&pipeline.metrics(), config.analysis.report_days).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::models::{Config, RawTweet};
    use crate::queue::MemoryBroker;
    use crate::services::TweetSource;
    use crate::storage::{SqliteStore, TweetStore};

    struct OneTweet;

    #[async_trait]
    impl TweetSource for OneTweet {
        async fn search_recent(&self, _query: &str, _max: usize) -> Result<Vec<RawTweet>> {
            Ok(vec![serde_json::from_value(serde_json::json!({
                "id": "77",
                "text": "Great win at Namboole #UgandaCranes",
                "created_at": chrono::Utc::now().to_rfc3339(),
            }))
            .unwrap()])
        }
    }

    #[tokio::test]
    async fn test_batch_end_to_end() {
        let mut config = Config::default();
        config.analysis.batch_timeout_secs = 1;
        config.analysis.poll_timeout_ms = 50;

        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let pipeline = Pipeline::new(
            Arc::new(config),
            store.clone(),
            Arc::new(MemoryBroker::new()),
            Some(Arc::new(OneTweet)),
        );

        run_batch(&pipeline).await.unwrap();
        assert_eq!(store.tweet_count().await.unwrap(), 1);
    }
}
