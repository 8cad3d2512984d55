use thiserror::Error;

/// Errors raised while validating raw bars into a `TimeSeries`
#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("Time series is empty")]
    Empty,

    #[error("Timestamp at position {position} does not strictly increase")]
    NonIncreasingTimestamp { position: usize },

    #[error("Invalid price at position {position}: {reason}")]
    InvalidPrice { position: usize, reason: String },
}

/// Errors related to indicator computation
#[derive(Debug, Error, PartialEq)]
pub enum IndicatorError {
    #[error("Insufficient history for {indicator}: need {required} bars, got {available}")]
    InsufficientHistory {
        indicator: &'static str,
        required: usize,
        available: usize,
    },

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Errors related to feature building, training and prediction
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Insufficient data: need at least {required} samples, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Model not trained. Call train() first")]
    NotTrained,

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Feature dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Model failure: {0}")]
    Model(String),

    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error("Model file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
