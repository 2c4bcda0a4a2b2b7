use hdf5::{Dataset, Group};
use scaler_common::Timestamp;
use std::error::Error;
use thiserror::Error;

pub type OutputResult<T> = Result<T, OutputError>;

const NO_HDF5_PATH_SET: &str = "[No HDF5 Path Set]";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("HDF5 Error: {error} at {0}", hdf5_path.as_deref().unwrap_or(NO_HDF5_PATH_SET))]
    HDF5 {
        error: hdf5::Error,
        hdf5_path: Option<String>,
    },
    #[error("HDF5String Error: {error} at {0}", hdf5_path.as_deref().unwrap_or(NO_HDF5_PATH_SET))]
    HDF5String {
        error: hdf5::types::StringError,
        hdf5_path: Option<String>,
    },
    #[error("Timestamp {timestamp} cannot be represented in nanoseconds at {0}", hdf5_path.as_deref().unwrap_or(NO_HDF5_PATH_SET))]
    TimestampOutOfRange {
        timestamp: Timestamp,
        hdf5_path: Option<String>,
    },
}

impl OutputError {
    fn with_hdf5_path(self, path: String) -> Self {
        match self {
            Self::HDF5 {
                error,
                hdf5_path: None,
            } => Self::HDF5 {
                error,
                hdf5_path: Some(path),
            },
            Self::HDF5String {
                error,
                hdf5_path: None,
            } => Self::HDF5String {
                error,
                hdf5_path: Some(path),
            },
            Self::TimestampOutOfRange {
                timestamp,
                hdf5_path: None,
            } => Self::TimestampOutOfRange {
                timestamp,
                hdf5_path: Some(path),
            },
            other => other,
        }
    }

    pub(crate) fn timestamp_out_of_range(timestamp: Timestamp) -> Self {
        Self::TimestampOutOfRange {
            timestamp,
            hdf5_path: None,
        }
    }
}

impl From<hdf5::Error> for OutputError {
    fn from(error: hdf5::Error) -> Self {
        OutputError::HDF5 {
            error,
            hdf5_path: None,
        }
    }
}

impl From<hdf5::types::StringError> for OutputError {
    fn from(error: hdf5::types::StringError) -> Self {
        OutputError::HDF5String {
            error,
            hdf5_path: None,
        }
    }
}

/// Allows errors which can be converted to [OutputError]s to be
/// tagged with the path of the hdf5 object they occurred at.
pub(crate) trait ConvertResult<T, E>
where
    E: Error + Into<OutputError>,
{
    fn err_group(self, group: &Group) -> OutputResult<T>;
    fn err_dataset(self, dataset: &Dataset) -> OutputResult<T>;
}

impl<T, E> ConvertResult<T, E> for Result<T, E>
where
    E: Error + Into<OutputError>,
{
    fn err_group(self, group: &Group) -> OutputResult<T> {
        self.map_err(|e| e.into().with_hdf5_path(group.name()))
    }

    fn err_dataset(self, dataset: &Dataset) -> OutputResult<T> {
        self.map_err(|e| e.into().with_hdf5_path(dataset.name()))
    }
}
