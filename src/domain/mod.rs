// Bars, series and indicator result types
pub mod market;

// Feature layout and model result types
pub mod ml;

// Domain-specific error types
pub mod errors;
