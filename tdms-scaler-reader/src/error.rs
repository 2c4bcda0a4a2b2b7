use scaler_tdms::TdmsError;
use thiserror::Error;

/// Input the extractors cannot make sense of.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("Cannot align {counts} decimated counts with {intervals} timestamp intervals")]
    DataShape { counts: usize, intervals: usize },
    #[error("Block size must be at least 2, got {0}")]
    InvalidBlockSize(usize),
    #[error("Sample rate must be finite and positive, got {0}")]
    InvalidSampleRate(f64),
}

/// Any reason a single input file yields no results.
#[derive(Debug, Error)]
pub enum ScalerError {
    #[error("Container Error: {0}")]
    Tdms(#[from] TdmsError),
    #[error("Extraction Error: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("Timestamp channel is empty")]
    NoTimestamps,
}
