//! chan-pulse CLI
//!
//! Local execution entry point for the CHAN 2024 sentiment pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use chan_pulse::{
    error::Result,
    models::Config,
    pipeline::{self, Pipeline},
    services::Classifier,
    services::sentiment::{SentimentScorer, VaderScorer},
    services::text::{clean_text, extract_hashtags},
    utils::console,
};
use clap::{Parser, Subcommand};

/// chan-pulse - CHAN 2024 tweet sentiment pipeline
#[derive(Parser, Debug)]
#[command(
    name = "chan-pulse",
    version,
    about = "Country tweet comparison and sentiment analysis for CHAN 2024"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "storage/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create database tables
    InitDb,

    /// Fetch once, process for the batch window, then report
    Batch,

    /// Fetch, process and report continuously until Ctrl-C
    Realtime,

    /// Fetch tweets and publish them to the raw topic
    Fetch,

    /// Process raw tweets from a JSON file (array or one object per line)
    Process {
        file: PathBuf,
    },

    /// Print the country comparison report
    Report {
        /// Look-back window in days (default: analysis.report_days)
        #[arg(long)]
        days: Option<i64>,
    },

    /// Export daily trend data to CSV
    Export {
        path: PathBuf,

        /// Look-back window in days (default: analysis.report_days)
        #[arg(long)]
        days: Option<i64>,
    },

    /// Classify and score a piece of text
    Classify {
        text: String,
    },

    /// Validate the configuration
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
    console::init(level);
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config).with_env();
    log::info!("Loaded configuration from {}", cli.config.display());

    let open = || -> Result<Pipeline> {
        config.validate()?;
        Pipeline::from_config(config.clone())
    };

    match cli.command {
        Command::InitDb => open()?.init_db().await?,

        Command::Batch => pipeline::run_batch(&open()?).await?,

        Command::Realtime => {
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("Failed to listen for Ctrl-C: {}", e);
                }
            };
            pipeline::run_realtime(open()?, shutdown).await?;
        }

        Command::Fetch => {
            let outcome = open()?.fetch().await?;
            log::info!(
                "Published {} unique tweets ({} fetched, {} failed queries)",
                outcome.published,
                outcome.fetched,
                outcome.query_failures
            );
        }

        Command::Process { file } => {
            let pipeline = open()?;
            pipeline.init_db().await?;
            let processed = pipeline.process_file(&file).await?;
            log::info!("Processed {} tweets from {}", processed, file.display());
        }

        Command::Report { days } => {
            let days = days.unwrap_or(config.analysis.report_days);
            pipeline::render_report(&open()?.metrics(), days).await?;
        }

        Command::Export { path, days } => {
            let days = days.unwrap_or(config.analysis.report_days);
            if open()?.metrics().export_report(&path, days).await? {
                log::info!("Report exported to {}", path.display());
            } else {
                log::warn!("No data to export");
            }
        }

        Command::Classify { text } => classify(&config, &text)?,

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK (includes vocabulary tables and topics)");
        }
    }

    log::info!("Done!");
    Ok(())
}

/// Print the verdict, evidence and sentiment for one text.
fn classify(config: &Config, text: &str) -> Result<()> {
    config.vocabulary.validate()?;
    let classifier = Classifier::new(Arc::new(config.vocabulary.clone()));
    let hashtags = extract_hashtags(text);
    let verdict = classifier.classify_detailed(text, &hashtags);
    let (score, label) = VaderScorer::new().analyze(&clean_text(text));

    let output = serde_json::json!({
        "category": verdict.category,
        "stage": verdict.stage,
        "scores": verdict.scores,
        "hashtags": hashtags,
        "sentiment_score": score,
        "sentiment_label": label,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
