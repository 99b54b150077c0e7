//! Sales Forecast CLI
//!
//! Loads the pretrained preprocessor and regressor once, then scores
//! payloads against the historical sales range.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use forecast_lib::RangeScaledPredictor;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Sales Forecast CLI
#[derive(Parser)]
#[command(name = "sales-forecast")]
#[command(author, version, about = "Range-scaled sales forecasting from pretrained artifacts", long_about = None)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long, env = "FORECAST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory artifact paths are resolved against
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score a single JSON payload
    Predict {
        /// Payload file, or `-` for stdin
        #[arg(long, short)]
        payload: Option<PathBuf>,
    },

    /// Score a JSON Lines file of payloads concurrently
    Batch {
        /// Input file with one JSON payload per line
        #[arg(long, short)]
        input: PathBuf,

        /// Maximum payloads scored at once
        #[arg(long, default_value_t = 4)]
        concurrency: usize,

        /// Print Prometheus metrics to stderr when done
        #[arg(long)]
        metrics: bool,
    },

    /// Show the loaded model, scaling range and health
    Inspect,
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::load(cli.config.as_deref(), cli.base_dir.as_deref())?;
    info!(base_dir = %config.base_dir.display(), "Configuration loaded");

    let predictor = RangeScaledPredictor::initialize(&config)
        .context("Predictor initialization failed")?;
    let decimals = config.decimal_places;

    match cli.command {
        Commands::Predict { payload } => {
            commands::predict::predict(&predictor, payload.as_deref(), decimals, cli.format)?;
        }
        Commands::Batch {
            input,
            concurrency,
            metrics,
        } => {
            commands::batch::run_batch(
                Arc::new(predictor),
                &input,
                concurrency,
                decimals,
                cli.format,
                metrics,
            )
            .await?;
        }
        Commands::Inspect => {
            commands::inspect::inspect(&predictor, cli.format)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
