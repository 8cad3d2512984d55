/// Ordered list of indicator columns expanded into features.
/// Any change here is a breaking change for persisted models.
pub const FEATURE_COLUMNS: &[&str] = &[
    "sma_5",
    "sma_10",
    "sma_20",
    "ema_12",
    "ema_26",
    "rsi",
    "volume_ratio",
    "price_change",
    "volatility",
];

/// Aggregates computed per column over the lookback window, in vector order.
pub const AGGREGATE_SUFFIXES: &[&str] = &["mean", "std", "current"];

/// Number of features produced for a column set.
pub fn feature_len(columns: &[String]) -> usize {
    columns.len() * AGGREGATE_SUFFIXES.len()
}

/// Expands column names into per-feature names (`<column>_mean`, `<column>_std`, `<column>_current`).
pub fn feature_names(columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .flat_map(|col| {
            AGGREGATE_SUFFIXES
                .iter()
                .map(move |suffix| format!("{}_{}", col, suffix))
        })
        .collect()
}

pub fn default_columns() -> Vec<String> {
    FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect()
}
