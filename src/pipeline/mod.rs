//! Pipeline entry points.
//!
//! - `run_batch`: fetch once, process for a fixed window, report
//! - `run_realtime`: periodic fetch, continuous processing, periodic report
//! - `render_report`: console analytics report

pub mod batch;
pub mod consume;
pub mod context;
pub mod fetch;
pub mod process;
pub mod realtime;
pub mod report;

pub use batch::run_batch;
pub use consume::{ConsumeStats, TweetConsumer};
pub use context::Pipeline;
pub use fetch::{FetchOutcome, fetch_and_produce};
pub use process::{TweetProcessor, parse_raw_tweets};
pub use realtime::run_realtime;
pub use report::render_report;
