//! A reader for National Instruments TDMS files, as written by the scaler card's
//! acquisition software.
//!
//! Only metadata is read when a file is opened; the samples of a channel are
//! materialized on demand by [TdmsFile::read].
//!
//! Supported: little and big endian segments, contiguous and interleaved raw data,
//! incremental metadata, and files truncated part way through a segment.
//! DAQmx raw data and string channels are rejected.

mod channel_data;
mod data_type;
mod error;
mod file;
mod loader;
mod path;
mod property;
mod segment;
mod timestamp;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use channel_data::ChannelData;
pub use data_type::DataType;
pub use error::{TdmsError, TdmsResult};
pub use file::{Channel, Group, TdmsFile};
pub use property::{Property, PropertyValue};
pub use timestamp::from_tdms;
