use crate::application::indicators::{
    ema_values, pct_change, rolling_mean, rolling_std, rsi_values,
};
use crate::domain::errors::{IndicatorError, PredictionError};
use crate::domain::market::{IndicatorSeries, PriceField, TimeSeries};
use crate::domain::ml::feature_registry::{self, FEATURE_COLUMNS};
use statrs::statistics::Statistics;
use tracing::debug;

/// Supervised rows built from a series: one feature vector and forward return per position.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    pub columns: Vec<String>,
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
    /// Series position each row was built at
    pub positions: Vec<usize>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn feature_names(&self) -> Vec<String> {
        feature_registry::feature_names(&self.columns)
    }

    pub fn latest(&self) -> Option<&[f64]> {
        self.features.last().map(Vec::as_slice)
    }
}

/// Expands the fixed indicator columns into trailing-window features.
///
/// For a row at position `i`, each column contributes the mean, population
/// standard deviation and last value of its entries in `[i - lookback, i)`.
/// Undefined entries are skipped; a window without any defined entry
/// contributes zeros.
#[derive(Debug, Clone, Copy)]
pub struct FeatureBuilder {
    lookback: usize,
}

impl FeatureBuilder {
    pub fn new(lookback: usize) -> Self {
        Self { lookback }
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    /// Indicator columns in `FEATURE_COLUMNS` order.
    pub fn indicator_columns(
        &self,
        series: &TimeSeries,
    ) -> Result<Vec<IndicatorSeries>, IndicatorError> {
        let closes = series.closes();
        let volumes = series.values(PriceField::Volume);

        let volume_avg = rolling_mean(&volumes, 20)?;
        let volume_ratio: IndicatorSeries = volumes
            .iter()
            .zip(&volume_avg)
            .map(|(&v, avg)| match avg {
                Some(avg) if *avg > 0.0 => Some(v / avg),
                _ => None,
            })
            .collect();

        let as_defined = |values: Vec<f64>| -> IndicatorSeries { values.into_iter().map(Some).collect() };

        let columns = vec![
            rolling_mean(&closes, 5)?,
            rolling_mean(&closes, 10)?,
            rolling_mean(&closes, 20)?,
            as_defined(ema_values(&closes, 12)?),
            as_defined(ema_values(&closes, 26)?),
            rsi_values(&closes, 14)?,
            volume_ratio,
            pct_change(&closes),
            rolling_std(&closes, 20)?,
        ];
        debug_assert_eq!(columns.len(), FEATURE_COLUMNS.len());
        Ok(columns)
    }

    pub fn build(&self, series: &TimeSeries) -> Result<TrainingSet, PredictionError> {
        if self.lookback == 0 {
            return Err(PredictionError::InvalidParameter {
                name: "lookback_days",
                reason: "must be > 0".to_string(),
            });
        }

        let n = series.len();
        // Rows exist for i in [lookback, n - 2]
        let row_count = n.saturating_sub(1).saturating_sub(self.lookback);
        if row_count < 1 {
            return Err(PredictionError::InsufficientData {
                required: self.lookback + 2,
                available: n,
            });
        }

        let columns = self.indicator_columns(series)?;
        let closes = series.closes();

        let mut features = Vec::with_capacity(row_count);
        let mut targets = Vec::with_capacity(row_count);
        let mut positions = Vec::with_capacity(row_count);

        for i in self.lookback..n - 1 {
            let mut row = Vec::with_capacity(columns.len() * 3);
            for column in &columns {
                row.extend(aggregate(&column[i - self.lookback..i]));
            }
            features.push(row);
            targets.push((closes[i + 1] - closes[i]) / closes[i]);
            positions.push(i);
        }

        debug!(
            "Built {} feature rows (lookback {}) from {} bars",
            features.len(),
            self.lookback,
            n
        );

        Ok(TrainingSet {
            columns: feature_registry::default_columns(),
            features,
            targets,
            positions,
        })
    }

    /// Most recent feature vector of the series.
    pub fn latest_features(&self, series: &TimeSeries) -> Result<Vec<f64>, PredictionError> {
        let set = self.build(series)?;
        set.latest()
            .map(<[f64]>::to_vec)
            .ok_or(PredictionError::InsufficientData {
                required: self.lookback + 2,
                available: series.len(),
            })
    }
}

/// `[mean, population std, last]` over the defined entries of a window.
fn aggregate(window: &[Option<f64>]) -> [f64; 3] {
    let defined: Vec<f64> = window.iter().flatten().copied().collect();
    match defined.last() {
        Some(&last) => [
            defined.iter().mean(),
            defined.iter().population_std_dev(),
            last,
        ],
        None => [0.0; 3],
    }
}
