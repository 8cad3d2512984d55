// Indicator engine: moving averages, oscillators, bands, levels, trend
pub mod indicators;

// Latest-value technical summary
pub mod analysis;

// Feature building, scaling and the forest predictor
pub mod ml;
