use crate::application::indicators::{self, latest};
use crate::config::IndicatorConfig;
use crate::domain::errors::IndicatorError;
use crate::domain::market::{
    BollingerSnapshot, MacdSnapshot, PriceField, TechnicalSummary, TimeSeries,
};
use tracing::debug;

/// Computes the latest value of every indicator with configured parameters.
pub struct TechnicalAnalyzer {
    config: IndicatorConfig,
}

impl TechnicalAnalyzer {
    pub fn new(config: IndicatorConfig) -> Self {
        Self { config }
    }

    pub fn summarize(&self, series: &TimeSeries) -> Result<TechnicalSummary, IndicatorError> {
        let cfg = &self.config;
        let field = PriceField::Close;

        let sma = indicators::sma(series, cfg.sma_window, field)?;
        let ema = indicators::ema(series, cfg.ema_window, field)?;
        let rsi = indicators::rsi(series, cfg.rsi_window, field)?;
        let macd = indicators::macd(
            series,
            cfg.macd_fast_period,
            cfg.macd_slow_period,
            cfg.macd_signal_period,
            field,
        )?;
        let bands =
            indicators::bollinger(series, cfg.bollinger_window, cfg.bollinger_num_std, field)?;
        let support_resistance =
            indicators::support_resistance(series, cfg.support_resistance_window)?;

        // Short series still get a summary, just without the trend block
        let trend_analysis = match indicators::trend(series, cfg.trend_window) {
            Ok(analysis) => Some(analysis),
            Err(IndicatorError::InsufficientHistory {
                required,
                available,
                ..
            }) => {
                debug!(
                    "Skipping trend analysis: need {} bars, have {}",
                    required, available
                );
                None
            }
            Err(e) => return Err(e),
        };

        let last = series.last();
        Ok(TechnicalSummary {
            analysis_date: last.timestamp,
            current_price: last.close,
            sma: latest(&sma),
            ema: latest(&ema),
            rsi: latest(&rsi),
            macd: MacdSnapshot {
                macd: latest(&macd.macd),
                signal: latest(&macd.signal),
                histogram: latest(&macd.histogram),
            },
            bollinger_bands: BollingerSnapshot {
                upper: latest(&bands.upper),
                middle: latest(&bands.middle),
                lower: latest(&bands.lower),
            },
            support_resistance,
            trend_analysis,
        })
    }
}

/// Percent change of the last close against the previous one.
pub fn price_change_pct(series: &TimeSeries) -> Option<f64> {
    let closes = series.closes();
    latest(&indicators::pct_change(&closes)).map(|c| c * 100.0)
}
