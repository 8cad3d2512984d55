//! Predictor configuration parsing from environment variables.
//!
//! Covers the feature window, the train/test split and the random forest
//! hyper-parameters.

use super::{parse_f64, parse_usize};
use anyhow::{Context, Result, ensure};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct PredictorConfig {
    pub lookback_days: usize,
    pub test_fraction: f64,
    pub min_training_rows: usize,

    // Random forest
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,

    /// Shuffles averaged per feature when scoring permutation importance
    pub importance_repeats: usize,

    pub model_path: Option<PathBuf>,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            test_fraction: 0.2,
            min_training_rows: 50,
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
            importance_repeats: 3,
            model_path: None,
        }
    }
}

impl PredictorConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let max_depth = lookup("STOCK_BRO_MAX_DEPTH")
            .unwrap_or_else(|| defaults.max_depth.to_string())
            .parse::<u16>()
            .context("Failed to parse STOCK_BRO_MAX_DEPTH")?;
        let seed = lookup("STOCK_BRO_SEED")
            .unwrap_or_else(|| defaults.seed.to_string())
            .parse::<u64>()
            .context("Failed to parse STOCK_BRO_SEED")?;

        let config = Self {
            lookback_days: parse_usize(lookup, "STOCK_BRO_LOOKBACK_DAYS", defaults.lookback_days)?,
            test_fraction: parse_f64(lookup, "STOCK_BRO_TEST_FRACTION", defaults.test_fraction)?,
            min_training_rows: parse_usize(
                lookup,
                "STOCK_BRO_MIN_TRAINING_ROWS",
                defaults.min_training_rows,
            )?,
            n_trees: parse_usize(lookup, "STOCK_BRO_N_TREES", defaults.n_trees)?,
            max_depth,
            min_samples_split: parse_usize(
                lookup,
                "STOCK_BRO_MIN_SAMPLES_SPLIT",
                defaults.min_samples_split,
            )?,
            min_samples_leaf: parse_usize(
                lookup,
                "STOCK_BRO_MIN_SAMPLES_LEAF",
                defaults.min_samples_leaf,
            )?,
            seed,
            importance_repeats: parse_usize(
                lookup,
                "STOCK_BRO_IMPORTANCE_REPEATS",
                defaults.importance_repeats,
            )?,
            model_path: lookup("STOCK_BRO_MODEL_PATH").map(PathBuf::from),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.lookback_days > 0, "STOCK_BRO_LOOKBACK_DAYS must be > 0");
        ensure!(
            self.test_fraction > 0.0 && self.test_fraction < 1.0,
            "STOCK_BRO_TEST_FRACTION must be in (0, 1), got {}",
            self.test_fraction
        );
        ensure!(self.n_trees > 0, "STOCK_BRO_N_TREES must be > 0");
        ensure!(self.max_depth > 0, "STOCK_BRO_MAX_DEPTH must be > 0");
        ensure!(
            self.importance_repeats > 0,
            "STOCK_BRO_IMPORTANCE_REPEATS must be > 0"
        );
        Ok(())
    }
}
