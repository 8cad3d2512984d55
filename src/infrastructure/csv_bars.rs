//! OHLCV bars from CSV files.
//!
//! Expected header: `timestamp,open,high,low,close,volume` with RFC 3339
//! timestamps in ascending order.

use crate::domain::market::{Bar, TimeSeries};
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct BarRecord {
    timestamp: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

pub fn read_bars<R: Read>(reader: R) -> Result<Vec<Bar>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut bars = Vec::new();

    for (line, result) in rdr.deserialize().enumerate() {
        let record: BarRecord = result.with_context(|| format!("Malformed bar on row {}", line + 1))?;
        if !record.volume.is_finite() || record.volume < 0.0 {
            bail!("Negative or invalid volume on row {}: {}", line + 1, record.volume);
        }
        bars.push(Bar {
            timestamp: record.timestamp,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume.round() as u64,
        });
    }

    Ok(bars)
}

/// Loads a series from disk; `None` when the file holds no bars.
pub fn load_series(path: &Path) -> Result<Option<TimeSeries>> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let bars = read_bars(BufReader::new(file))?;
    if bars.is_empty() {
        return Ok(None);
    }

    let count = bars.len();
    let series = TimeSeries::new(bars).with_context(|| format!("Invalid bars in {:?}", path))?;
    info!("Loaded {} bars from {:?}", count, path);
    Ok(Some(series))
}
