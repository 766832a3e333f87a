// src/pipeline/realtime.rs

//! Continuous analysis: periodic fetch, continuous consume, periodic report.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at};

use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::pipeline::report::render_report;

/// Run until `shutdown` resolves, then stop every task and wait for them.
pub async fn run_realtime<F>(pipeline: Pipeline, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send,
{
    pipeline.init_db().await?;

    let analysis = &pipeline.config().analysis;
    let fetch_every = Duration::from_secs(analysis.fetch_interval_secs);
    let report_every = Duration::from_secs(analysis.report_interval_secs);
    log::info!(
        "Starting real-time analysis (fetch every {}s, report every {}s)",
        fetch_every.as_secs(),
        report_every.as_secs()
    );

    let (stop_tx, stop_rx) = watch::channel(false);

    let fetcher = {
        let pipeline = pipeline.clone();
        let mut stop = stop_rx.clone();
        tokio::spawn(async move {
            let mut ticker = interval(fetch_every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = stop.changed() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = pipeline.fetch().await {
                            log::error!("Error fetching tweets: {}", e);
                        }
                    }
                }
            }
        })
    };

    let consumer = {
        let consumer = pipeline.consumer();
        let stop = stop_rx.clone();
        tokio::spawn(async move { consumer.run_until(stop).await })
    };

    let reporter = {
        let metrics = pipeline.metrics();
        let days = analysis.report_days;
        let mut stop = stop_rx;
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + report_every, report_every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = stop.changed() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = render_report(&metrics, days).await {
                            log::error!("Error generating report: {}", e);
                        }
                    }
                }
            }
        })
    };

    shutdown.await;
    log::info!("Shutting down real-time analysis...");
    let _ = stop_tx.send(true);

    fetcher.await?;
    let stats = consumer.await?;
    reporter.await?;

    log::info!(
        "Real-time analysis stopped after processing {} tweets",
        stats.processed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::models::Config;
    use crate::queue::{MemoryBroker, MessageBroker};
    use crate::storage::{SqliteStore, TweetStore};

    #[tokio::test]
    async fn test_realtime_processes_until_shutdown() {
        let mut config = Config::default();
        config.analysis.poll_timeout_ms = 20;
        let raw_topic = config.queue.topics.raw.clone();

        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let broker = Arc::new(MemoryBroker::new());
        let pipeline = Pipeline::new(Arc::new(config), store.clone(), broker.clone(), None);

        broker
            .publish(&raw_topic, None, br#"{"id": "1", "text": "Mkapa is rocking #TaifaStars"}"#)
            .await
            .unwrap();

        let shutdown = tokio::time::sleep(Duration::from_millis(300));
        tokio::time::timeout(Duration::from_secs(5), run_realtime(pipeline, shutdown))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(store.tweet_count().await.unwrap(), 1);
    }
}
