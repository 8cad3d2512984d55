pub mod feature_registry;
pub mod types;

pub use types::{Direction, FeatureScore, Prediction, TrainingMetrics};
