use crate::data_type::DataType;
use std::string::FromUtf8Error;
use thiserror::Error;

pub type TdmsResult<T> = Result<T, TdmsError>;

#[derive(Debug, Error)]
pub enum TdmsError {
    #[error("IO Error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Invalid segment tag {tag:?} at byte {position}")]
    InvalidTag { tag: [u8; 4], position: u64 },
    #[error("Unsupported TDMS version {0}")]
    UnsupportedVersion(u32),
    #[error("Unknown data type code {0:#x}")]
    UnknownDataType(u32),
    #[error("Unsupported data type {0}")]
    UnsupportedDataType(DataType),
    #[error("DAQmx raw data is not supported (object {0})")]
    DaqmxUnsupported(String),
    #[error("Unsupported array dimension {dimension} for object {path}")]
    UnsupportedDimension { path: String, dimension: u32 },
    #[error("Malformed object path {0:?}")]
    MalformedPath(String),
    #[error("Invalid UTF-8 string: {0}")]
    InvalidString(#[from] FromUtf8Error),
    #[error("Object {0} reuses a raw data index it never defined")]
    MissingPreviousIndex(String),
    #[error("Object {0} has raw data but is not a channel")]
    RawDataOnNonChannel(String),
    #[error("Channel {path} changed data type from {previous} to {current}")]
    InconsistentDataType {
        path: String,
        previous: DataType,
        current: DataType,
    },
    #[error("Raw data size of {0} overflows")]
    SizeOverflow(String),
    #[error("Raw data of {path} runs past the end of its segment")]
    BlockOutOfBounds { path: String },
    #[error("Interleaved data cannot contain {0} values")]
    UnsupportedInterleavedType(DataType),
    #[error("Group {0:?} not found")]
    GroupNotFound(String),
    #[error("Channel {channel:?} not found in group {group:?}")]
    ChannelNotFound { group: String, channel: String },
    #[error("Channel of type {data_type} cannot be read as {requested}")]
    UnexpectedDataType {
        data_type: DataType,
        requested: &'static str,
    },
    #[error("Timestamp out of range: {seconds} s, {fractions} fractions since 1904")]
    TimestampOutOfRange { seconds: i64, fractions: u64 },
}

impl TdmsError {
    /// True if the error means the file does not follow the expected group/channel layout,
    /// as opposed to being unreadable.
    pub fn is_missing_object(&self) -> bool {
        matches!(
            self,
            Self::GroupNotFound(_) | Self::ChannelNotFound { .. }
        )
    }
}
