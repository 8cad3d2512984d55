//! Indicator parameter parsing from environment variables.
//!
//! These are the defaults used by the technical summary; the indicator
//! functions themselves always take explicit parameters.

use super::{parse_f64, parse_usize};
use anyhow::{Result, ensure};

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub sma_window: usize,
    pub ema_window: usize,
    pub rsi_window: usize,

    // MACD
    pub macd_fast_period: usize,
    pub macd_slow_period: usize,
    pub macd_signal_period: usize,

    // Bollinger
    pub bollinger_window: usize,
    pub bollinger_num_std: f64,

    pub support_resistance_window: usize,
    pub trend_window: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_window: 20,
            ema_window: 12,
            rsi_window: 14,
            macd_fast_period: 12,
            macd_slow_period: 26,
            macd_signal_period: 9,
            bollinger_window: 20,
            bollinger_num_std: 2.0,
            support_resistance_window: 20,
            trend_window: 20,
        }
    }
}

impl IndicatorConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            sma_window: parse_usize(lookup, "STOCK_BRO_SMA_WINDOW", defaults.sma_window)?,
            ema_window: parse_usize(lookup, "STOCK_BRO_EMA_WINDOW", defaults.ema_window)?,
            rsi_window: parse_usize(lookup, "STOCK_BRO_RSI_WINDOW", defaults.rsi_window)?,
            macd_fast_period: parse_usize(
                lookup,
                "STOCK_BRO_MACD_FAST_PERIOD",
                defaults.macd_fast_period,
            )?,
            macd_slow_period: parse_usize(
                lookup,
                "STOCK_BRO_MACD_SLOW_PERIOD",
                defaults.macd_slow_period,
            )?,
            macd_signal_period: parse_usize(
                lookup,
                "STOCK_BRO_MACD_SIGNAL_PERIOD",
                defaults.macd_signal_period,
            )?,
            bollinger_window: parse_usize(
                lookup,
                "STOCK_BRO_BOLLINGER_WINDOW",
                defaults.bollinger_window,
            )?,
            bollinger_num_std: parse_f64(
                lookup,
                "STOCK_BRO_BOLLINGER_NUM_STD",
                defaults.bollinger_num_std,
            )?,
            support_resistance_window: parse_usize(
                lookup,
                "STOCK_BRO_SUPPORT_RESISTANCE_WINDOW",
                defaults.support_resistance_window,
            )?,
            trend_window: parse_usize(lookup, "STOCK_BRO_TREND_WINDOW", defaults.trend_window)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.macd_fast_period < self.macd_slow_period,
            "MACD fast period ({}) must be below slow period ({})",
            self.macd_fast_period,
            self.macd_slow_period
        );
        ensure!(
            self.bollinger_num_std >= 0.0,
            "STOCK_BRO_BOLLINGER_NUM_STD must be >= 0"
        );
        ensure!(self.trend_window >= 2, "STOCK_BRO_TREND_WINDOW must be >= 2");
        Ok(())
    }
}
