use super::feature_builder::FeatureBuilder;
use super::importance::permutation_importance;
use super::metrics::{mean_absolute_error, mean_squared_error};
use super::scaler::ScalerState;
use crate::config::PredictorConfig;
use crate::domain::errors::PredictionError;
use crate::domain::market::TimeSeries;
use crate::domain::ml::feature_registry;
use crate::domain::ml::{Direction, FeatureScore, Prediction, TrainingMetrics};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

pub type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Highest confidence ever reported.
pub const MAX_CONFIDENCE: f64 = 95.0;

fn to_matrix(rows: &[Vec<f64>]) -> Result<DenseMatrix<f64>, PredictionError> {
    DenseMatrix::from_2d_vec(&rows.to_vec())
        .map_err(|e| PredictionError::Model(format!("Matrix creation failed: {}", e)))
}

pub fn predict_rows(forest: &Forest, rows: &[Vec<f64>]) -> Result<Vec<f64>, PredictionError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    forest
        .predict(&to_matrix(rows)?)
        .map_err(|e| PredictionError::Model(format!("Prediction failed: {}", e)))
}

fn fit_forest(
    config: &PredictorConfig,
    rows: &[Vec<f64>],
    targets: &[f64],
) -> Result<Forest, PredictionError> {
    let width = rows.first().map_or(0, Vec::len);
    // Every split considers all features
    let params = RandomForestRegressorParameters::default()
        .with_n_trees(config.n_trees)
        .with_max_depth(config.max_depth)
        .with_min_samples_split(config.min_samples_split)
        .with_min_samples_leaf(config.min_samples_leaf)
        .with_m(width)
        .with_seed(config.seed);

    RandomForestRegressor::fit(&to_matrix(rows)?, &targets.to_vec(), params)
        .map_err(|e| PredictionError::Model(format!("Training error: {}", e)))
}

/// A fitted forest together with everything needed to reproduce its inputs.
///
/// Immutable once built; retraining produces a new value.
#[derive(Serialize, Deserialize)]
pub struct TrainedModel {
    forest: Forest,
    scaler: ScalerState,
    columns: Vec<String>,
    lookback: usize,
    importances: Vec<f64>,
}

impl fmt::Debug for TrainedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainedModel")
            .field("columns", &self.columns)
            .field("lookback", &self.lookback)
            .field("features", &self.scaler.width())
            .finish_non_exhaustive()
    }
}

impl TrainedModel {
    /// Builds features, splits them in time order, scales and fits the forest.
    pub fn fit(
        config: &PredictorConfig,
        series: &TimeSeries,
        test_fraction: f64,
    ) -> Result<(Self, TrainingMetrics), PredictionError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(PredictionError::InvalidParameter {
                name: "test_fraction",
                reason: format!("must be in (0, 1), got {}", test_fraction),
            });
        }

        info!("Preparing features for training...");
        let set = FeatureBuilder::new(config.lookback_days).build(series)?;
        if set.len() < config.min_training_rows {
            return Err(PredictionError::InsufficientData {
                required: config.min_training_rows,
                available: set.len(),
            });
        }

        // Rows are temporally correlated: split by position, never shuffle
        let n = set.len();
        let n_test = ((n as f64) * test_fraction).ceil() as usize;
        let n_train = n.saturating_sub(n_test);
        if n_train == 0 {
            return Err(PredictionError::InsufficientData {
                required: n_test + 1,
                available: n,
            });
        }
        let (x_train, x_test) = set.features.split_at(n_train);
        let (y_train, y_test) = set.targets.split_at(n_train);

        let scaler = ScalerState::fit(x_train)?;
        let x_train = scaler.transform_rows(x_train)?;
        let x_test = scaler.transform_rows(x_test)?;

        info!(
            "Training Random Forest Regressor (Trees: {}, Depth: {}) on {} samples...",
            config.n_trees, config.max_depth, n_train
        );
        let forest = fit_forest(config, &x_train, y_train)?;

        let train_pred = predict_rows(&forest, &x_train)?;
        let test_pred = predict_rows(&forest, &x_test)?;
        let metrics = TrainingMetrics {
            train_mse: mean_squared_error(y_train, &train_pred),
            test_mse: mean_squared_error(y_test, &test_pred),
            train_mae: mean_absolute_error(y_train, &train_pred),
            test_mae: mean_absolute_error(y_test, &test_pred),
            train_samples: x_train.len(),
            test_samples: x_test.len(),
        };

        let importances = permutation_importance(
            &forest,
            &x_train,
            y_train,
            config.importance_repeats,
            config.seed,
        )?;

        info!("Training completed. Test MAE: {:.4}", metrics.test_mae);

        let model = Self {
            forest,
            scaler,
            columns: set.columns,
            lookback: config.lookback_days,
            importances,
        };
        Ok((model, metrics))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    pub fn scaler(&self) -> &ScalerState {
        &self.scaler
    }

    /// Predicted fractional return for one unscaled feature vector.
    pub fn predict_return(&self, features: &[f64]) -> Result<f64, PredictionError> {
        let scaled = self.scaler.transform(features)?;
        predict_rows(&self.forest, &[scaled])?
            .first()
            .copied()
            .ok_or_else(|| PredictionError::Model("No prediction returned".to_string()))
    }

    /// Next-bar prediction from the most recent feature vector of `series`.
    ///
    /// Only one step ahead is modelled: any `days_ahead > 1` still yields the
    /// next-bar prediction.
    pub fn predict(
        &self,
        series: &TimeSeries,
        days_ahead: usize,
    ) -> Result<Prediction, PredictionError> {
        if days_ahead == 0 {
            return Err(PredictionError::InvalidParameter {
                name: "days_ahead",
                reason: "must be >= 1".to_string(),
            });
        }
        if days_ahead > 1 {
            warn!(
                "Requested {} days ahead but the model predicts one step; returning next-bar prediction",
                days_ahead
            );
        }

        let features = FeatureBuilder::new(self.lookback).latest_features(series)?;
        let predicted_return = self.predict_return(&features)?;
        let current_price = series.last_close();

        Ok(Prediction {
            current_price,
            predicted_change_pct: predicted_return * 100.0,
            predicted_price: current_price * (1.0 + predicted_return),
            confidence: self.confidence(),
            direction: Direction::from_return(predicted_return),
        })
    }

    /// Mean feature importance as a percentage, capped at `MAX_CONFIDENCE`.
    pub fn confidence(&self) -> f64 {
        if self.importances.is_empty() {
            return 0.0;
        }
        let mean = self.importances.iter().sum::<f64>() / self.importances.len() as f64;
        let confidence = mean * 100.0;
        if confidence.is_finite() {
            confidence.clamp(0.0, MAX_CONFIDENCE)
        } else {
            0.0
        }
    }

    /// Named importances sorted from most to least important.
    pub fn feature_importance(&self) -> Vec<FeatureScore> {
        let mut scores: Vec<FeatureScore> = feature_registry::feature_names(&self.columns)
            .into_iter()
            .zip(&self.importances)
            .map(|(name, &score)| FeatureScore { name, score })
            .collect();
        scores.sort_by(|a, b| b.score.total_cmp(&a.score));
        scores
    }

    pub fn save(&self, path: &Path) -> Result<(), PredictionError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        self.write_json(BufWriter::new(file))?;
        info!("Saved model to {:?}", path);
        Ok(())
    }

    fn write_json<W: Write>(&self, mut writer: W) -> Result<(), PredictionError> {
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Loads a saved model, rejecting files built for a different feature layout.
    pub fn load(path: &Path) -> Result<Self, PredictionError> {
        let file = File::open(path)?;
        let model: Self = serde_json::from_reader(BufReader::new(file))?;
        model.check_layout()?;
        info!("Successfully loaded model from {:?}", path);
        Ok(model)
    }

    fn check_layout(&self) -> Result<(), PredictionError> {
        let expected = feature_registry::default_columns();
        if self.columns != expected {
            return Err(PredictionError::Model(format!(
                "Model columns {:?} do not match feature columns {:?}",
                self.columns, expected
            )));
        }
        let width = feature_registry::feature_len(&self.columns);
        for actual in [self.scaler.width(), self.importances.len()] {
            if actual != width {
                return Err(PredictionError::DimensionMismatch {
                    expected: width,
                    actual,
                });
            }
        }
        Ok(())
    }
}
