use super::smartcore_model::TrainedModel;
use crate::config::PredictorConfig;
use crate::domain::errors::PredictionError;
use crate::domain::market::TimeSeries;
use crate::domain::ml::{FeatureScore, Prediction, TrainingMetrics};
use tracing::info;

/// Owns at most one `TrainedModel` and exposes the train/predict contract.
///
/// Untrained until the first successful `train`; every later `train` swaps
/// in a new model. A failed `train` leaves the current model in place.
#[derive(Debug)]
pub struct Predictor {
    config: PredictorConfig,
    model: Option<TrainedModel>,
}

impl Predictor {
    pub fn new(config: PredictorConfig) -> Self {
        Self {
            config,
            model: None,
        }
    }

    /// Starts in the trained state with an already fitted (e.g. loaded) model.
    pub fn with_model(config: PredictorConfig, model: TrainedModel) -> Self {
        Self {
            config,
            model: Some(model),
        }
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Option<&TrainedModel> {
        self.model.as_ref()
    }

    /// Replaces the current model, returning the previous one.
    pub fn install(&mut self, model: TrainedModel) -> Option<TrainedModel> {
        self.model.replace(model)
    }

    pub fn train(&mut self, series: &TimeSeries) -> Result<TrainingMetrics, PredictionError> {
        self.train_with_fraction(series, self.config.test_fraction)
    }

    pub fn train_with_fraction(
        &mut self,
        series: &TimeSeries,
        test_fraction: f64,
    ) -> Result<TrainingMetrics, PredictionError> {
        let (model, metrics) = TrainedModel::fit(&self.config, series, test_fraction)?;
        if self.install(model).is_some() {
            info!("Replaced previously trained model");
        }
        Ok(metrics)
    }

    pub fn predict(
        &self,
        series: &TimeSeries,
        days_ahead: usize,
    ) -> Result<Prediction, PredictionError> {
        self.model
            .as_ref()
            .ok_or(PredictionError::NotTrained)?
            .predict(series, days_ahead)
    }

    /// `None` until a model has been trained.
    pub fn feature_importance(&self) -> Option<Vec<FeatureScore>> {
        self.model.as_ref().map(TrainedModel::feature_importance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::Bar;
    use chrono::{Duration, TimeZone, Utc};

    fn small_config() -> PredictorConfig {
        PredictorConfig {
            n_trees: 10,
            max_depth: 4,
            importance_repeats: 1,
            ..PredictorConfig::default()
        }
    }

    fn series(n: usize) -> TimeSeries {
        let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
        TimeSeries::new(
            (0..n)
                .map(|i| {
                    let close = 100.0 + (i as f64 * 0.35).sin() * 5.0 + (i as f64 * 0.05);
                    Bar {
                        timestamp: start + Duration::days(i as i64),
                        open: close * 0.995,
                        high: close * 1.01,
                        low: close * 0.99,
                        close,
                        volume: 500_000 + (i as u64 * 7919) % 100_000,
                    }
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_untrained_state() {
        let predictor = Predictor::new(small_config());
        assert!(!predictor.is_trained());
        assert!(predictor.feature_importance().is_none());
        assert!(matches!(
            predictor.predict(&series(100), 1),
            Err(PredictionError::NotTrained)
        ));
    }

    #[test]
    fn test_too_few_rows_rejected_and_state_unchanged() {
        let mut predictor = Predictor::new(small_config());
        // 80 bars, lookback 30 -> 49 rows
        let result = predictor.train(&series(80));
        assert!(matches!(
            result,
            Err(PredictionError::InsufficientData {
                required: 50,
                available: 49
            })
        ));
        assert!(!predictor.is_trained());
    }

    #[test]
    fn test_minimum_rows_train() {
        let mut predictor = Predictor::new(small_config());
        // 81 bars -> exactly 50 rows
        let metrics = predictor.train(&series(81)).unwrap();
        assert_eq!(metrics.train_samples + metrics.test_samples, 50);
        assert_eq!(metrics.test_samples, 10);
        assert!(predictor.is_trained());
    }

    #[test]
    fn test_invalid_fraction_rejected() {
        let mut predictor = Predictor::new(small_config());
        assert!(matches!(
            predictor.train_with_fraction(&series(120), 0.0),
            Err(PredictionError::InvalidParameter {
                name: "test_fraction",
                ..
            })
        ));
        assert!(predictor.train_with_fraction(&series(120), 1.0).is_err());
    }

    #[test]
    fn test_predict_contract_after_training() {
        let mut predictor = Predictor::new(small_config());
        predictor.train(&series(150)).unwrap();

        let s = series(150);
        let prediction = predictor.predict(&s, 1).unwrap();
        assert_eq!(prediction.current_price, s.last_close());
        assert!((0.0..=95.0).contains(&prediction.confidence));
        let implied = prediction.current_price * (1.0 + prediction.predicted_change_pct / 100.0);
        assert!((implied - prediction.predicted_price).abs() < 1e-9);

        assert!(matches!(
            predictor.predict(&s, 0),
            Err(PredictionError::InvalidParameter {
                name: "days_ahead",
                ..
            })
        ));
        // Multi-step requests still return the one-step prediction
        assert_eq!(predictor.predict(&s, 5).unwrap(), prediction);
    }

    #[test]
    fn test_predict_on_short_series_is_insufficient() {
        let mut predictor = Predictor::new(small_config());
        predictor.train(&series(150)).unwrap();

        assert!(matches!(
            predictor.predict(&series(31), 1),
            Err(PredictionError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_retrain_replaces_model() {
        let mut predictor = Predictor::new(small_config());
        predictor.train(&series(120)).unwrap();
        let first = predictor.model().unwrap().scaler().clone();

        predictor.train(&series(200)).unwrap();
        let second = predictor.model().unwrap().scaler().clone();

        assert_ne!(first, second);
    }

    #[test]
    fn test_feature_importance_sorted_and_normalized() {
        let mut predictor = Predictor::new(small_config());
        predictor.train(&series(150)).unwrap();

        let scores = predictor.feature_importance().unwrap();
        assert_eq!(scores.len(), 27);
        assert!(scores.windows(2).all(|w| w[0].score >= w[1].score));
        let total: f64 = scores.iter().map(|s| s.score).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(
            scores
                .iter()
                .all(|s| s.name.ends_with("_mean") || s.name.ends_with("_std") || s.name.ends_with("_current"))
        );
    }
}
