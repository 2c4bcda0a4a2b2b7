pub mod tracer;

use chrono::{DateTime, Utc};

/// Absolute wall-clock time of a sample, with nanosecond resolution.
pub type Timestamp = DateTime<Utc>;
pub type Count = i64;
pub type DigitalLevel = i64;
pub type Rate = f64;
pub type ChannelIndex = u8;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Group holding the scaler card's sample channels.
pub const SCALER_DATA_GROUP: &str = "SCData";
/// Group holding the per-block wall-clock timestamps.
pub const TIMESTAMP_GROUP: &str = "SCTimestamps";
pub const TIMESTAMP_CHANNEL: &str = "TimeStamp";

pub const DEFAULT_COUNTER_CHANNEL: ChannelIndex = 5;
pub const KICKER_CHANNEL: ChannelIndex = 4;

/// Formats a scaler channel index into the name used by the acquisition software,
/// e.g. `5` becomes `CHANNEL_05`.
pub fn channel_name(index: ChannelIndex) -> String {
    format!("CHANNEL_{index:02}")
}
