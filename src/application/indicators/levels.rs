use super::rolling_mean;
use crate::domain::errors::IndicatorError;
use crate::domain::market::{PriceField, SupportResistance, TimeSeries, Trend, TrendAnalysis};

/// Support and resistance from local extrema.
///
/// A bar is a local high when its High equals the maximum High of the
/// centered window `[i - window/2, i - window/2 + window)`, and a local low
/// likewise with Low. Bars whose centered window runs off either end of the
/// series never qualify.
///
/// Resistance is the lowest local high strictly above the last close
/// (falls back to `close * 1.1`); support is the highest local low strictly
/// below it (falls back to `close * 0.9`).
pub fn support_resistance(
    series: &TimeSeries,
    window: usize,
) -> Result<SupportResistance, IndicatorError> {
    if window == 0 {
        return Err(IndicatorError::InvalidParameter {
            name: "window",
            reason: "must be > 0".to_string(),
        });
    }

    let highs = series.values(PriceField::High);
    let lows = series.values(PriceField::Low);
    let current_price = series.last_close();

    let half = window / 2;
    let mut resistance: Option<f64> = None;
    let mut support: Option<f64> = None;

    for i in half..series.len() {
        let start = i - half;
        let end = start + window;
        if end > series.len() {
            break;
        }

        let local_high = highs[start..end]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        if highs[i] == local_high && highs[i] > current_price {
            resistance = Some(resistance.map_or(highs[i], |r| r.min(highs[i])));
        }

        let local_low = lows[start..end].iter().copied().fold(f64::INFINITY, f64::min);
        if lows[i] == local_low && lows[i] < current_price {
            support = Some(support.map_or(lows[i], |s| s.max(lows[i])));
        }
    }

    Ok(SupportResistance {
        support: support.unwrap_or(current_price * 0.9),
        resistance: resistance.unwrap_or(current_price * 1.1),
        current_price,
    })
}

/// Trend classification from a half-window SMA against a full-window SMA.
///
/// Needs `window + 1` bars.
pub fn trend(series: &TimeSeries, window: usize) -> Result<TrendAnalysis, IndicatorError> {
    if window < 2 {
        return Err(IndicatorError::InvalidParameter {
            name: "window",
            reason: format!("must be >= 2, got {}", window),
        });
    }
    let n = series.len();
    if n < window + 1 {
        return Err(IndicatorError::InsufficientHistory {
            indicator: "trend",
            required: window + 1,
            available: n,
        });
    }

    let closes = series.closes();
    let short = rolling_mean(&closes, window / 2)?;
    let long = rolling_mean(&closes, window)?;

    let insufficient = || IndicatorError::InsufficientHistory {
        indicator: "trend",
        required: window + 1,
        available: n,
    };
    let sma_short = short[n - 1].ok_or_else(insufficient)?;
    let sma_long = long[n - 1].ok_or_else(insufficient)?;

    let trend = if sma_short > sma_long {
        Trend::Bullish
    } else if sma_short < sma_long {
        Trend::Bearish
    } else {
        Trend::Neutral
    };

    let reference = closes[n - window];
    let price_change = (closes[n - 1] - reference) / reference;

    Ok(TrendAnalysis {
        trend,
        strength: price_change.abs(),
        price_change_pct: price_change * 100.0,
        sma_short,
        sma_long,
    })
}
