use crate::domain::errors::SeriesError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One OHLCV bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Bar field an indicator is computed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceField {
    Open,
    High,
    Low,
    #[default]
    Close,
    Volume,
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceField::Open => write!(f, "open"),
            PriceField::High => write!(f, "high"),
            PriceField::Low => write!(f, "low"),
            PriceField::Close => write!(f, "close"),
            PriceField::Volume => write!(f, "volume"),
        }
    }
}

impl Bar {
    pub fn value(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
            PriceField::Volume => self.volume as f64,
        }
    }
}

/// Values aligned 1:1 with a `TimeSeries`; `None` marks an undefined position.
pub type IndicatorSeries = Vec<Option<f64>>;

/// Ordered, validated sequence of bars.
///
/// Invariants enforced at construction:
/// - at least one bar
/// - timestamps strictly increase
/// - open/high/low/close are finite and positive
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    bars: Vec<Bar>,
}

impl TimeSeries {
    pub fn new(bars: Vec<Bar>) -> Result<Self, SeriesError> {
        if bars.is_empty() {
            return Err(SeriesError::Empty);
        }

        for (position, bar) in bars.iter().enumerate() {
            for (name, price) in [
                ("open", bar.open),
                ("high", bar.high),
                ("low", bar.low),
                ("close", bar.close),
            ] {
                if !price.is_finite() || price <= 0.0 {
                    return Err(SeriesError::InvalidPrice {
                        position,
                        reason: format!("{} must be positive, got {}", name, price),
                    });
                }
            }
        }

        if let Some(position) = bars
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(SeriesError::NonIncreasingTimestamp {
                position: position + 1,
            });
        }

        Ok(Self { bars })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false for a constructed series.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn get(&self, position: usize) -> Option<&Bar> {
        self.bars.get(position)
    }

    pub fn last(&self) -> &Bar {
        // Non-empty by construction
        &self.bars[self.bars.len() - 1]
    }

    /// Position of the bar stamped exactly `timestamp`, if any.
    pub fn position_of(&self, timestamp: DateTime<Utc>) -> Option<usize> {
        self.bars
            .binary_search_by(|bar| bar.timestamp.cmp(&timestamp))
            .ok()
    }

    pub fn at(&self, timestamp: DateTime<Utc>) -> Option<&Bar> {
        self.position_of(timestamp).map(|p| &self.bars[p])
    }

    pub fn values(&self, field: PriceField) -> Vec<f64> {
        self.bars.iter().map(|b| b.value(field)).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.values(PriceField::Close)
    }

    pub fn last_close(&self) -> f64 {
        self.last().close
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn bar(day: i64, close: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn test_rejects_empty_series() {
        assert_eq!(TimeSeries::new(vec![]), Err(SeriesError::Empty));
    }

    #[test]
    fn test_rejects_non_increasing_timestamps() {
        let result = TimeSeries::new(vec![bar(0, 100.0), bar(2, 101.0), bar(2, 102.0)]);
        assert_eq!(
            result,
            Err(SeriesError::NonIncreasingTimestamp { position: 2 })
        );
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let mut bad = bar(1, 100.0);
        bad.low = 0.0;
        let result = TimeSeries::new(vec![bar(0, 100.0), bad]);
        assert!(matches!(
            result,
            Err(SeriesError::InvalidPrice { position: 1, .. })
        ));
    }

    #[test]
    fn test_uneven_cadence_is_accepted_and_addressable() {
        let series = TimeSeries::new(vec![bar(0, 100.0), bar(3, 101.0), bar(4, 99.0)]).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.position_of(bar(3, 0.0).timestamp), Some(1));
        assert_eq!(series.position_of(bar(2, 0.0).timestamp), None);
        assert_eq!(series.at(bar(4, 0.0).timestamp).map(|b| b.close), Some(99.0));
        assert_eq!(series.last_close(), 99.0);
        assert_eq!(series.values(PriceField::Volume), vec![1_000.0; 3]);
    }
}
