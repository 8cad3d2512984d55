//! Technical indicators over a `TimeSeries`.
//!
//! Every function is a pure function of its input. Results are aligned 1:1
//! with the input and positions where the window is not yet full hold `None`.
//! The feature builder computes its columns through these same functions, so
//! analysis and training always observe identical formulas.

mod levels;

pub use levels::{support_resistance, trend};

use crate::domain::errors::IndicatorError;
use crate::domain::market::{BollingerSeries, IndicatorSeries, MacdSeries, PriceField, TimeSeries};
use statrs::statistics::{Data, Distribution};
use ta::Next;
use ta::indicators::{
    ExponentialMovingAverage, MovingAverageConvergenceDivergence, SimpleMovingAverage,
};

fn require_window(name: &'static str, window: usize) -> Result<(), IndicatorError> {
    if window == 0 {
        return Err(IndicatorError::InvalidParameter {
            name,
            reason: "must be > 0".to_string(),
        });
    }
    Ok(())
}

fn ta_error(name: &'static str, e: impl std::fmt::Debug) -> IndicatorError {
    IndicatorError::InvalidParameter {
        name,
        reason: format!("{:?}", e),
    }
}

/// Simple moving average of `field` over `window` bars.
pub fn sma(
    series: &TimeSeries,
    window: usize,
    field: PriceField,
) -> Result<IndicatorSeries, IndicatorError> {
    rolling_mean(&series.values(field), window)
}

/// Exponential moving average of `field`, span convention.
pub fn ema(
    series: &TimeSeries,
    window: usize,
    field: PriceField,
) -> Result<IndicatorSeries, IndicatorError> {
    Ok(ema_values(&series.values(field), window)?
        .into_iter()
        .map(Some)
        .collect())
}

/// Relative strength index from simple averages of gains and losses.
///
/// A window with losses but no gains yields 0, gains but no losses yields 100,
/// and a window with neither (flat market) is undefined.
pub fn rsi(
    series: &TimeSeries,
    window: usize,
    field: PriceField,
) -> Result<IndicatorSeries, IndicatorError> {
    rsi_values(&series.values(field), window)
}

pub fn macd(
    series: &TimeSeries,
    fast: usize,
    slow: usize,
    signal: usize,
    field: PriceField,
) -> Result<MacdSeries, IndicatorError> {
    macd_values(&series.values(field), fast, slow, signal)
}

/// Bollinger Bands: SMA middle band, `num_std` sample standard deviations either side.
pub fn bollinger(
    series: &TimeSeries,
    window: usize,
    num_std: f64,
    field: PriceField,
) -> Result<BollingerSeries, IndicatorError> {
    bollinger_values(&series.values(field), window, num_std)
}

/// Trailing arithmetic mean; the first `window - 1` positions are `None`.
pub fn rolling_mean(values: &[f64], window: usize) -> Result<IndicatorSeries, IndicatorError> {
    require_window("window", window)?;
    let mut sma = SimpleMovingAverage::new(window).map_err(|e| ta_error("window", e))?;
    Ok(values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let mean = sma.next(v);
            (i + 1 >= window).then_some(mean)
        })
        .collect())
}

/// Trailing sample standard deviation (n - 1 denominator).
///
/// Undefined until the window is full; a window of one bar is always undefined.
pub fn rolling_std(values: &[f64], window: usize) -> Result<IndicatorSeries, IndicatorError> {
    require_window("window", window)?;
    Ok((0..values.len())
        .map(|i| {
            if window < 2 || i + 1 < window {
                return None;
            }
            let data = Data::new(values[i + 1 - window..=i].to_vec());
            data.std_dev().filter(|s| s.is_finite())
        })
        .collect())
}

/// Fractional change from the previous value; position 0 is undefined.
pub fn pct_change(values: &[f64]) -> IndicatorSeries {
    std::iter::once(None)
        .chain(values.windows(2).map(|w| {
            let change = w[1] / w[0] - 1.0;
            change.is_finite().then_some(change)
        }))
        .take(values.len())
        .collect()
}

/// Recursive EMA with `alpha = 2 / (window + 1)`, seeded with the first value.
pub fn ema_values(values: &[f64], window: usize) -> Result<Vec<f64>, IndicatorError> {
    require_window("window", window)?;
    let mut ema = ExponentialMovingAverage::new(window).map_err(|e| ta_error("window", e))?;
    Ok(values.iter().map(|&v| ema.next(v)).collect())
}

pub fn rsi_values(values: &[f64], window: usize) -> Result<IndicatorSeries, IndicatorError> {
    require_window("window", window)?;

    // The first bar has no predecessor: its move counts as zero.
    let deltas: Vec<f64> = std::iter::once(0.0)
        .chain(values.windows(2).map(|w| w[1] - w[0]))
        .take(values.len())
        .collect();
    let gains: Vec<f64> = deltas.iter().map(|d| d.max(0.0)).collect();
    let losses: Vec<f64> = deltas.iter().map(|d| (-d).max(0.0)).collect();

    let avg_gain = rolling_mean(&gains, window)?;
    let avg_loss = rolling_mean(&losses, window)?;

    Ok(avg_gain
        .into_iter()
        .zip(avg_loss)
        .map(|(gain, loss)| match (gain, loss) {
            (Some(gain), Some(loss)) => rsi_from_averages(gain, loss),
            _ => None,
        })
        .collect())
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss <= 0.0 {
        return (avg_gain > 0.0).then_some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some((100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0))
}

pub fn macd_values(
    values: &[f64],
    fast: usize,
    slow: usize,
    signal: usize,
) -> Result<MacdSeries, IndicatorError> {
    require_window("fast", fast)?;
    require_window("slow", slow)?;
    require_window("signal", signal)?;
    if fast >= slow {
        return Err(IndicatorError::InvalidParameter {
            name: "fast",
            reason: format!("fast period {} must be below slow period {}", fast, slow),
        });
    }

    let mut indicator =
        MovingAverageConvergenceDivergence::new(fast, slow, signal).map_err(|e| ta_error("macd", e))?;

    let mut result = MacdSeries {
        macd: Vec::with_capacity(values.len()),
        signal: Vec::with_capacity(values.len()),
        histogram: Vec::with_capacity(values.len()),
    };
    for &value in values {
        let out = indicator.next(value);
        result.macd.push(Some(out.macd));
        result.signal.push(Some(out.signal));
        result.histogram.push(Some(out.histogram));
    }
    Ok(result)
}

pub fn bollinger_values(
    values: &[f64],
    window: usize,
    num_std: f64,
) -> Result<BollingerSeries, IndicatorError> {
    if !num_std.is_finite() || num_std < 0.0 {
        return Err(IndicatorError::InvalidParameter {
            name: "num_std",
            reason: format!("must be finite and >= 0, got {}", num_std),
        });
    }

    let middle = rolling_mean(values, window)?;
    let std = rolling_std(values, window)?;

    let (upper, lower): (IndicatorSeries, IndicatorSeries) = middle
        .iter()
        .zip(&std)
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => {
                let band = num_std * s;
                (Some(m + band), Some(m - band))
            }
            _ => (None, None),
        })
        .unzip();

    Ok(BollingerSeries {
        upper,
        middle,
        lower,
    })
}

/// Last value of an indicator series, `None` when empty or undefined.
pub fn latest(series: &IndicatorSeries) -> Option<f64> {
    series.last().copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_rolling_mean_warmup_and_values() {
        let sma = rolling_mean(&[1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap();
        assert_eq!(sma[0], None);
        assert_eq!(sma[1], None);
        assert!((sma[2].unwrap() - 2.0).abs() < EPS);
        assert!((sma[4].unwrap() - 4.0).abs() < EPS);
    }

    #[test]
    fn test_rolling_mean_matches_window_average_after_warmup() {
        let values: Vec<f64> = (0..40).map(|i| 50.0 + (i as f64 * 0.9).cos() * 3.0).collect();
        let sma = rolling_mean(&values, 7).unwrap();

        assert!(sma[..6].iter().all(Option::is_none));
        for i in 6..values.len() {
            let expected = values[i - 6..=i].iter().sum::<f64>() / 7.0;
            assert!((sma[i].unwrap() - expected).abs() < EPS);
        }
    }

    #[test]
    fn test_window_larger_than_input_is_all_undefined() {
        let sma = rolling_mean(&[1.0, 2.0], 5).unwrap();
        assert_eq!(sma, vec![None, None]);
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(matches!(
            rolling_mean(&[1.0], 0),
            Err(IndicatorError::InvalidParameter { name: "window", .. })
        ));
        assert!(ema_values(&[1.0], 0).is_err());
    }

    #[test]
    fn test_ema_seeded_with_first_value() {
        let ema = ema_values(&[10.0, 20.0, 20.0], 3).unwrap();
        // alpha = 2 / (3 + 1) = 0.5
        assert!((ema[0] - 10.0).abs() < EPS);
        assert!((ema[1] - 15.0).abs() < EPS);
        assert!((ema[2] - 17.5).abs() < EPS);
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let values: Vec<f64> = (1..=20).map(|v| v as f64).collect();
        let rsi = rsi_values(&values, 14).unwrap();
        assert_eq!(rsi[12], None);
        assert_eq!(rsi[13], Some(100.0));
        assert_eq!(rsi[19], Some(100.0));
    }

    #[test]
    fn test_rsi_all_losses_is_zero() {
        let values: Vec<f64> = (1..=20).rev().map(|v| v as f64).collect();
        let rsi = rsi_values(&values, 14).unwrap();
        assert!((rsi[19].unwrap()).abs() < EPS);
    }

    #[test]
    fn test_rsi_flat_market_is_undefined() {
        let rsi = rsi_values(&[50.0; 30], 14).unwrap();
        assert!(rsi.iter().all(Option::is_none));
    }

    #[test]
    fn test_rsi_balanced_moves_is_50() {
        let values: Vec<f64> = (0..30)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        let rsi = rsi_values(&values, 14).unwrap();
        // 14-bar windows ending on an odd index hold 7 ups and 7 downs
        assert!((rsi[15].unwrap() - 50.0).abs() < EPS);
    }

    #[test]
    fn test_macd_components_are_consistent() {
        let values: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect();
        let macd = macd_values(&values, 12, 26, 9).unwrap();
        let fast = ema_values(&values, 12).unwrap();
        let slow = ema_values(&values, 26).unwrap();

        for i in 0..values.len() {
            let line = macd.macd[i].unwrap();
            assert!((line - (fast[i] - slow[i])).abs() < 1e-9);
            let hist = macd.histogram[i].unwrap();
            assert!((hist - (line - macd.signal[i].unwrap())).abs() < 1e-9);
        }
    }

    #[test]
    fn test_macd_rejects_inverted_periods() {
        assert!(macd_values(&[1.0, 2.0], 26, 12, 9).is_err());
    }

    #[test]
    fn test_bollinger_uses_sample_std() {
        let bands = bollinger_values(&[1.0, 2.0, 3.0], 3, 2.0).unwrap();
        // sample std of [1, 2, 3] is 1
        assert!((bands.middle[2].unwrap() - 2.0).abs() < EPS);
        assert!((bands.upper[2].unwrap() - 4.0).abs() < EPS);
        assert!((bands.lower[2].unwrap() - 0.0).abs() < EPS);
        assert_eq!(bands.upper[1], None);
    }

    #[test]
    fn test_bollinger_rejects_negative_multiplier() {
        assert!(bollinger_values(&[1.0, 2.0, 3.0], 3, -1.0).is_err());
    }

    #[test]
    fn test_pct_change() {
        let change = pct_change(&[100.0, 110.0, 99.0]);
        assert_eq!(change[0], None);
        assert!((change[1].unwrap() - 0.1).abs() < EPS);
        assert!((change[2].unwrap() + 0.1).abs() < EPS);
        assert!(pct_change(&[]).is_empty());
    }

    #[test]
    fn test_rolling_std_single_bar_window_undefined() {
        let std = rolling_std(&[1.0, 2.0, 3.0], 1).unwrap();
        assert!(std.iter().all(Option::is_none));
    }
}
