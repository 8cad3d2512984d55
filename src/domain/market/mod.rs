pub mod series;
pub mod types;

pub use series::{Bar, IndicatorSeries, PriceField, TimeSeries};
pub use types::{
    BollingerSeries, BollingerSnapshot, MacdSeries, MacdSnapshot, SupportResistance,
    TechnicalSummary, Trend, TrendAnalysis,
};
