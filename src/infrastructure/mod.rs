// CSV input for bars
pub mod csv_bars;
