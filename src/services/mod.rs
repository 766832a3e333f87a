//! Service layer for the pipeline.
//!
//! This module contains the business logic for:
//! - Text cleaning and hashtag extraction (`text`)
//! - Country/category classification (`Classifier`)
//! - Sentiment scoring (`VaderScorer`)
//! - Recent-search fetching (`TwitterClient`)
//! - Report metrics (`MetricsCalculator`)

pub mod analytics;
pub mod classifier;
pub mod sentiment;
pub mod text;
pub mod twitter;

pub use analytics::MetricsCalculator;
pub use classifier::{Classifier, Stage, Verdict};
pub use sentiment::{SentimentScorer, VaderScorer};
pub use twitter::{TweetSource, TwitterClient, build_query};
