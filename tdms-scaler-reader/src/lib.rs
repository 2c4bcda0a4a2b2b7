//! Extracts count rates and kicker firing times from scaler card TDMS recordings.
//!
//! [rate::extract_rate] and [kicker::locate_events] are pure functions over
//! materialized channels. [source] reads those channels from TDMS files,
//! [batch] runs an extraction over many files and [output] writes the results.
pub mod batch;
pub mod error;
pub mod info;
pub mod kicker;
pub mod output;
pub mod rate;
pub mod source;

pub use error::{ExtractionError, ScalerError};
pub use kicker::{DEFAULT_SAMPLE_RATE_HZ, locate_events};
pub use rate::{DEFAULT_BLOCK_SIZE, RateSeries, extract_rate};
