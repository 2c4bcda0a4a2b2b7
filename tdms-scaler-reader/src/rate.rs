//! Converts a cumulative counter channel into a rate series.
use crate::error::ExtractionError;
use chrono::TimeDelta;
use itertools::Itertools;
use scaler_common::{Count, Rate, Timestamp};

/// Counter samples per timestamp tick.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

/// Rates in counts per second, each attributed to the start of the interval it measures.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RateSeries {
    pub timestamps: Vec<Timestamp>,
    pub rates: Vec<Rate>,
}

impl RateSeries {
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Appends `other` to the end of this series.
    pub fn append(&mut self, mut other: RateSeries) {
        self.timestamps.append(&mut other.timestamps);
        self.rates.append(&mut other.rates);
    }
}

/// The difference across each window of `block_size` samples,
/// taking one window every `block_size` samples.
/// Consecutive windows do not share an endpoint, so the step between the
/// last sample of one block and the first of the next is not counted.
fn decimated_differences(counter: &[Count], block_size: usize) -> Vec<Count> {
    counter
        .windows(block_size)
        .step_by(block_size)
        .filter_map(|window| Some(window.last()?.saturating_sub(*window.first()?)))
        .collect()
}

fn as_seconds(delta: TimeDelta) -> f64 {
    delta.num_nanoseconds().map_or_else(
        || delta.num_milliseconds() as f64 / 1e3,
        |nanoseconds| nanoseconds as f64 / 1e9,
    )
}

fn interval_seconds(timestamps: &[Timestamp]) -> Vec<f64> {
    timestamps
        .iter()
        .tuple_windows()
        .map(|(start, end)| as_seconds(*end - *start))
        .collect()
}

/// Computes the count rate from a cumulative counter sampled `block_size` times per timestamp.
/// # Parameters
/// - counter: cumulative counts.
/// - timestamps: wall clock time of the start of each block of `block_size` samples.
/// - block_size: the decimation factor.
/// # Return
/// The rate over each interval between consecutive timestamps. If the recording was cut
/// short, the decimated counts and the intervals may differ in number by one, in which
/// case both are truncated to the shorter.
/// # Error Modes
/// - [ExtractionError::InvalidBlockSize] if `block_size < 2`.
/// - [ExtractionError::DataShape] if the counts and intervals differ in number by more than one.
pub fn extract_rate(
    counter: &[Count],
    timestamps: &[Timestamp],
    block_size: usize,
) -> Result<RateSeries, ExtractionError> {
    if block_size < 2 {
        return Err(ExtractionError::InvalidBlockSize(block_size));
    }
    let counts = decimated_differences(counter, block_size);
    let intervals = interval_seconds(timestamps);

    if counts.len().abs_diff(intervals.len()) > 1 {
        return Err(ExtractionError::DataShape {
            counts: counts.len(),
            intervals: intervals.len(),
        });
    }
    let length = counts.len().min(intervals.len());

    Ok(RateSeries {
        timestamps: timestamps.iter().take(length).copied().collect(),
        rates: counts
            .iter()
            .zip(intervals)
            .map(|(count, seconds)| *count as Rate / seconds)
            .collect(),
    })
}
