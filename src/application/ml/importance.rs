//! Permutation feature importance.
//!
//! The forest regressor does not expose impurity importances, so each
//! feature is scored by how much the training error grows when that feature's
//! column is shuffled. Scores are clamped at zero and normalised to sum to 1.

use super::metrics::mean_squared_error;
use super::smartcore_model::{Forest, predict_rows};
use crate::domain::errors::PredictionError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;

pub fn permutation_importance(
    forest: &Forest,
    rows: &[Vec<f64>],
    targets: &[f64],
    repeats: usize,
    seed: u64,
) -> Result<Vec<f64>, PredictionError> {
    let width = rows.first().map_or(0, Vec::len);
    if width == 0 || repeats == 0 {
        return Ok(vec![0.0; width]);
    }

    let baseline = mean_squared_error(targets, &predict_rows(forest, rows)?);

    // One RNG per feature keeps results independent of thread scheduling
    let raw = (0..width)
        .into_par_iter()
        .map(|j| -> Result<f64, PredictionError> {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(j as u64));
            let mut total = 0.0;
            for _ in 0..repeats {
                let mut column: Vec<f64> = rows.iter().map(|r| r[j]).collect();
                column.shuffle(&mut rng);

                let permuted: Vec<Vec<f64>> = rows
                    .iter()
                    .zip(&column)
                    .map(|(row, &value)| {
                        let mut row = row.clone();
                        row[j] = value;
                        row
                    })
                    .collect();

                let error = mean_squared_error(targets, &predict_rows(forest, &permuted)?);
                total += (error - baseline).max(0.0);
            }
            Ok(total / repeats as f64)
        })
        .collect::<Result<Vec<f64>, _>>()?;

    Ok(normalize(raw))
}

/// Scales scores to sum to 1; all-zero input becomes uniform.
pub fn normalize(scores: Vec<f64>) -> Vec<f64> {
    if scores.is_empty() {
        return scores;
    }
    let sum: f64 = scores.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        scores.into_iter().map(|s| s / sum).collect()
    } else {
        let uniform = 1.0 / scores.len() as f64;
        vec![uniform; scores.len()]
    }
}
