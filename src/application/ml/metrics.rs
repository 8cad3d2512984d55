/// Mean of squared residuals; 0 for empty input.
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (p - a).powi(2))
        .sum::<f64>()
        / actual.len() as f64
}

/// Mean of absolute residuals; 0 for empty input.
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (p - a).abs())
        .sum::<f64>()
        / actual.len() as f64
}
