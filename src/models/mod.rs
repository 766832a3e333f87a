// src/models/mod.rs

//! Domain models for the pipeline.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod category;
mod config;
mod tweet;
mod vocabulary;

// Re-export all public types
pub use category::{Category, Country};
pub use config::{
    AnalysisConfig, Config, DatabaseConfig, QueueBackend, QueueConfig, TopicConfig, TwitterConfig,
};
pub use tweet::{ProcessedTweet, PublicMetrics, RawTweet, SentimentLabel};
pub use vocabulary::{CountryTerms, Vocabulary};
