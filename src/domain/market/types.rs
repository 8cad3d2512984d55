use super::series::IndicatorSeries;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacdSeries {
    pub macd: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BollingerSeries {
    pub upper: IndicatorSeries,
    pub middle: IndicatorSeries,
    pub lower: IndicatorSeries,
}

/// Latest value of each MACD line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacdSnapshot {
    pub macd: Option<f64>,
    pub signal: Option<f64>,
    pub histogram: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BollingerSnapshot {
    pub upper: Option<f64>,
    pub middle: Option<f64>,
    pub lower: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SupportResistance {
    pub support: f64,
    pub resistance: f64,
    pub current_price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Bullish => write!(f, "bullish"),
            Trend::Bearish => write!(f, "bearish"),
            Trend::Neutral => write!(f, "neutral"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendAnalysis {
    pub trend: Trend,
    pub strength: f64,
    pub price_change_pct: f64,
    pub sma_short: f64,
    pub sma_long: f64,
}

/// Snapshot of every indicator at the last bar of a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicalSummary {
    pub analysis_date: DateTime<Utc>,
    pub current_price: f64,
    pub sma: Option<f64>,
    pub ema: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: MacdSnapshot,
    pub bollinger_bands: BollingerSnapshot,
    pub support_resistance: SupportResistance,
    pub trend_analysis: Option<TrendAnalysis>,
}
