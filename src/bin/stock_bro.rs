//! stock-bro CLI - technical analysis and next-bar prediction from a CSV of bars
//!
//! # Usage
//! ```sh
//! cargo run --bin stock-bro -- analyze --input data/aapl.csv
//! cargo run --bin stock-bro -- predict --input data/aapl.csv --save-model models/aapl.json
//! cargo run --bin stock-bro -- importance --model models/aapl.json
//! ```
//!
//! # Environment Variables
//! - `STOCK_BRO_LOG_LEVEL` - Log filter when `RUST_LOG` is unset (default: info)
//! - `STOCK_BRO_LOOKBACK_DAYS`, `STOCK_BRO_TEST_FRACTION`, `STOCK_BRO_N_TREES`, ... - see `config`

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use stock_bro::application::analysis::{TechnicalAnalyzer, price_change_pct};
use stock_bro::application::ml::{Predictor, TrainedModel};
use stock_bro::config::Config;
use stock_bro::domain::market::TimeSeries;
use stock_bro::infrastructure::csv_bars::load_series;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the latest technical indicators, levels and trend
    Analyze {
        /// CSV file with timestamp,open,high,low,close,volume
        #[arg(long)]
        input: PathBuf,
    },
    /// Train on the series and predict the next bar
    Predict {
        #[arg(long)]
        input: PathBuf,

        /// Requested horizon; only one step is modelled
        #[arg(long, default_value_t = 1)]
        days_ahead: usize,

        /// Where to write the trained model (overrides STOCK_BRO_MODEL_PATH)
        #[arg(long)]
        save_model: Option<PathBuf>,

        /// Number of top features to print
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Print the feature importance ranking of a saved model
    Importance {
        #[arg(long)]
        model: PathBuf,
    },
}

fn require_series(input: &Path) -> Result<TimeSeries> {
    match load_series(input)? {
        Some(series) => Ok(series),
        None => bail!("No data found in {:?}", input),
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(config.log_level.clone().unwrap_or_else(|| "info".to_string()))
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    info!("stock-bro {} starting...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let output = match args.command {
        Command::Analyze { input } => {
            let series = require_series(&input)?;
            let summary = TechnicalAnalyzer::new(config.indicators.clone())
                .summarize(&series)
                .context("Technical analysis failed")?;
            json!({
                "data_points": series.len(),
                "price_change_pct": price_change_pct(&series),
                "analysis": summary,
            })
        }
        Command::Predict {
            input,
            days_ahead,
            save_model,
            top,
        } => {
            let series = require_series(&input)?;
            let mut predictor = Predictor::new(config.predictor.clone());
            let metrics = predictor.train(&series).context("Training failed")?;
            let prediction = predictor
                .predict(&series, days_ahead)
                .context("Prediction failed")?;

            if let Some(path) = save_model.or_else(|| config.predictor.model_path.clone()) {
                if let Some(model) = predictor.model() {
                    model.save(&path)?;
                }
            }

            let importance: Vec<_> = predictor
                .feature_importance()
                .unwrap_or_default()
                .into_iter()
                .take(top)
                .collect();
            json!({
                "prediction": prediction,
                "training_metrics": metrics,
                "top_features": importance,
                "disclaimer": "This is a prediction based on historical data and should not be considered as financial advice.",
            })
        }
        Command::Importance { model } => {
            let model = TrainedModel::load(&model)?;
            json!({
                "lookback_days": model.lookback(),
                "feature_importance": model.feature_importance(),
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
