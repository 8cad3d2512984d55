//! Configuration module for stock-bro.
//!
//! Settings are read once from `STOCK_BRO_*` environment variables into an
//! explicit `Config` value that callers pass to the components needing it.

mod indicator_config;
mod predictor_config;

pub use indicator_config::IndicatorConfig;
pub use predictor_config::PredictorConfig;

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub log_level: Option<String>,
    pub indicators: IndicatorConfig,
    pub predictor: PredictorConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key: &str| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            log_level: lookup("STOCK_BRO_LOG_LEVEL"),
            indicators: IndicatorConfig::from_lookup(lookup)
                .context("Invalid indicator configuration")?,
            predictor: PredictorConfig::from_lookup(lookup)
                .context("Invalid predictor configuration")?,
        })
    }
}

fn parse_usize<F>(lookup: &F, key: &str, default: usize) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .unwrap_or_else(|| default.to_string())
        .parse::<usize>()
        .context(format!("Failed to parse {}", key))
}

fn parse_f64<F>(lookup: &F, key: &str, default: f64) -> Result<f64>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .unwrap_or_else(|| default.to_string())
        .parse::<f64>()
        .context(format!("Failed to parse {}", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = Config::from_lookup(&lookup_from(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.predictor.lookback_days, 30);
        assert_eq!(config.predictor.n_trees, 100);
        assert_eq!(config.predictor.max_depth, 10);
        assert_eq!(config.predictor.seed, 42);
        assert_eq!(config.indicators.rsi_window, 14);
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = Config::from_lookup(&lookup_from(&[
            ("STOCK_BRO_LOOKBACK_DAYS", "10"),
            ("STOCK_BRO_TEST_FRACTION", "0.25"),
            ("STOCK_BRO_BOLLINGER_NUM_STD", "1.5"),
            ("STOCK_BRO_MODEL_PATH", "models/aapl.json"),
            ("STOCK_BRO_LOG_LEVEL", "debug"),
        ]))
        .unwrap();

        assert_eq!(config.predictor.lookback_days, 10);
        assert!((config.predictor.test_fraction - 0.25).abs() < 1e-12);
        assert!((config.indicators.bollinger_num_std - 1.5).abs() < 1e-12);
        assert_eq!(
            config.predictor.model_path.as_deref(),
            Some(std::path::Path::new("models/aapl.json"))
        );
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_unparseable_value_names_the_key() {
        let err = Config::from_lookup(&lookup_from(&[("STOCK_BRO_N_TREES", "many")])).unwrap_err();
        assert!(format!("{:#}", err).contains("STOCK_BRO_N_TREES"));
    }

    #[test]
    fn test_invalid_split_fraction_rejected() {
        let result = Config::from_lookup(&lookup_from(&[("STOCK_BRO_TEST_FRACTION", "1.0")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_inverted_macd_periods_rejected() {
        let result = Config::from_lookup(&lookup_from(&[
            ("STOCK_BRO_MACD_FAST_PERIOD", "30"),
            ("STOCK_BRO_MACD_SLOW_PERIOD", "26"),
        ]));
        assert!(result.is_err());
    }
}
