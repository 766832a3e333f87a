// src/lib.rs

//! CHAN 2024 tweet sentiment pipeline.
//!
//! Fetches tweets for the three host countries, classifies each into a
//! country or shared category, scores sentiment, stores the result in
//! SQLite, republishes it to per-country topics, and reports rankings.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod queue;
pub mod services;
pub mod storage;
pub mod utils;
