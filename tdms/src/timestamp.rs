//! Conversion between TDMS 128-bit timestamps and [Timestamp].
//!
//! A TDMS timestamp is a signed count of seconds since 1904-01-01T00:00:00Z
//! followed by an unsigned count of 2^-64 second fractions.
use crate::error::{TdmsError, TdmsResult};
use chrono::DateTime;
use scaler_common::Timestamp;

/// Seconds from the TDMS epoch to the Unix epoch.
const TDMS_EPOCH_OFFSET_SECONDS: i64 = 2_082_844_800;
const NANOSECONDS_PER_SECOND: u128 = 1_000_000_000;

/// Converts a TDMS timestamp to a [Timestamp], truncating to whole nanoseconds.
pub fn from_tdms(seconds: i64, fractions: u64) -> TdmsResult<Timestamp> {
    // Always < 1e9, so fits in u32.
    let nanoseconds = ((u128::from(fractions) * NANOSECONDS_PER_SECOND) >> 64) as u32;
    seconds
        .checked_sub(TDMS_EPOCH_OFFSET_SECONDS)
        .and_then(|unix_seconds| DateTime::from_timestamp(unix_seconds, nanoseconds))
        .ok_or(TdmsError::TimestampOutOfRange { seconds, fractions })
}

/// Converts a [Timestamp] to TDMS seconds and fractions.
/// Fractions are rounded up so that [from_tdms] recovers the exact nanosecond.
#[cfg(any(test, feature = "test-utils"))]
pub(crate) fn to_tdms(timestamp: &Timestamp) -> (i64, u64) {
    let seconds = timestamp.timestamp() + TDMS_EPOCH_OFFSET_SECONDS;
    let nanoseconds = u128::from(timestamp.timestamp_subsec_nanos());
    let fractions = (nanoseconds << 64).div_ceil(NANOSECONDS_PER_SECOND) as u64;
    (seconds, fractions)
}
