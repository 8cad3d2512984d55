pub mod feature_builder;
pub mod importance;
pub mod metrics;
pub mod predictor;
pub mod scaler;
pub mod smartcore_model;

pub use feature_builder::{FeatureBuilder, TrainingSet};
pub use predictor::Predictor;
pub use scaler::ScalerState;
pub use smartcore_model::TrainedModel;
