#![allow(dead_code)]

use chrono::{Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stock_bro::domain::market::{Bar, TimeSeries};

/// Daily bars following a seeded random walk around 100.
pub fn random_walk(n: usize, seed: u64) -> TimeSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
    let mut close = 100.0_f64;

    let bars = (0..n)
        .map(|i| {
            let open = close;
            close = (close * (1.0 + rng.random_range(-0.02..0.02))).max(1.0);
            let high = open.max(close) * (1.0 + rng.random_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.random_range(0.0..0.01));
            Bar {
                timestamp: start + Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume: rng.random_range(800_000..1_200_000),
            }
        })
        .collect();

    TimeSeries::new(bars).unwrap()
}

/// Bars whose closes are exactly `closes`, with a 1% high/low range.
pub fn from_closes(closes: &[f64]) -> TimeSeries {
    let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: start + Duration::days(i as i64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 1_000_000,
        })
        .collect();
    TimeSeries::new(bars).unwrap()
}
