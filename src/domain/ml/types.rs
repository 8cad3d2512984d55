use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors of a fitted model on the train and test splits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub train_mse: f64,
    pub test_mse: f64,
    pub train_mae: f64,
    pub test_mae: f64,
    pub train_samples: usize,
    pub test_samples: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn from_return(predicted_return: f64) -> Self {
        if predicted_return > 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// One-step-ahead price prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub current_price: f64,
    pub predicted_change_pct: f64,
    pub predicted_price: f64,
    /// Heuristic derived from mean feature importance, capped at 95. Not a probability.
    pub confidence: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScore {
    pub name: String,
    pub score: f64,
}
