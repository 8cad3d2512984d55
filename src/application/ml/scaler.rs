use crate::domain::errors::PredictionError;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Per-feature standardization statistics captured from a training split.
///
/// Features with zero variance keep a scale of 1.0, so they are only centred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl ScalerState {
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, PredictionError> {
        let width = rows
            .first()
            .map(Vec::len)
            .ok_or(PredictionError::InsufficientData {
                required: 1,
                available: 0,
            })?;
        if let Some(row) = rows.iter().find(|r| r.len() != width) {
            return Err(PredictionError::DimensionMismatch {
                expected: width,
                actual: row.len(),
            });
        }

        let mut means = Vec::with_capacity(width);
        let mut scales = Vec::with_capacity(width);
        for j in 0..width {
            let column = rows.iter().map(|r| r[j]);
            means.push(column.clone().mean());
            let std = column.population_std_dev();
            scales.push(if std.is_finite() && std > 0.0 { std } else { 1.0 });
        }

        Ok(Self { means, scales })
    }

    pub fn width(&self) -> usize {
        self.means.len()
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    pub fn transform(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        self.check_width(features)?;
        Ok(features
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect())
    }

    pub fn transform_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, PredictionError> {
        rows.iter().map(|row| self.transform(row)).collect()
    }

    pub fn inverse_transform(&self, scaled: &[f64]) -> Result<Vec<f64>, PredictionError> {
        self.check_width(scaled)?;
        Ok(scaled
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(z, (mean, scale))| z * scale + mean)
            .collect())
    }

    fn check_width(&self, features: &[f64]) -> Result<(), PredictionError> {
        if features.len() != self.width() {
            return Err(PredictionError::DimensionMismatch {
                expected: self.width(),
                actual: features.len(),
            });
        }
        Ok(())
    }
}
