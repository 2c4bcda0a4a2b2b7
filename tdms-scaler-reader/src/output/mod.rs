//! Writes extraction results to an HDF5 file.
//!
//! The file holds a dataset `t` of timestamps, in nanoseconds since the Unix epoch,
//! and for rate extractions a dataset `f` of rates in counts per second.
//! Root attributes record how the results were produced.
mod error;

use crate::rate::RateSeries;
use error::ConvertResult;
pub use error::{OutputError, OutputResult};
use hdf5::{
    Dataset, Group, H5Type, SimpleExtents,
    filters::deflate_available,
    types::VarLenUnicode,
};
use ndarray::s;
use scaler_common::{ChannelIndex, Timestamp};
use std::path::{Path, PathBuf};
use tracing::info;

pub const TIME_DATASET: &str = "t";
pub const RATE_DATASET: &str = "f";
pub const TIME_UNITS: &str = "ns since 1970-01-01T00:00:00Z";
pub const RATE_UNITS: &str = "counts/s";

const CHUNK_SIZE: usize = 1024;
const DEFLATE_LEVEL: u8 = 4;

/// The extraction which produced the results, recorded in the output file.
#[derive(Debug, Clone, Copy, PartialEq, strum::Display)]
pub enum Extraction {
    #[strum(to_string = "rate")]
    Rate {
        channel: ChannelIndex,
        block_size: usize,
    },
    #[strum(to_string = "kicker")]
    Kicker { sample_rate_hz: f64 },
}

/// The path of the output file `<directory>/<name>.h5`.
pub fn output_path(directory: &Path, name: &str) -> PathBuf {
    directory.join(format!("{name}.h5"))
}

trait HasAttributesExt {
    fn add_attribute_to<T: H5Type>(&self, name: &str, value: &T) -> OutputResult<()>;
    fn add_string_attribute_to(&self, name: &str, value: &str) -> OutputResult<()>;
}

impl HasAttributesExt for Group {
    fn add_attribute_to<T: H5Type>(&self, name: &str, value: &T) -> OutputResult<()> {
        self.new_attr::<T>()
            .create(name)
            .err_group(self)?
            .write_scalar(value)
            .err_group(self)
    }

    fn add_string_attribute_to(&self, name: &str, value: &str) -> OutputResult<()> {
        self.add_attribute_to(name, &value.parse::<VarLenUnicode>().err_group(self)?)
    }
}

impl HasAttributesExt for Dataset {
    fn add_attribute_to<T: H5Type>(&self, name: &str, value: &T) -> OutputResult<()> {
        self.new_attr::<T>()
            .create(name)
            .err_dataset(self)?
            .write_scalar(value)
            .err_dataset(self)
    }

    fn add_string_attribute_to(&self, name: &str, value: &str) -> OutputResult<()> {
        self.add_attribute_to(name, &value.parse::<VarLenUnicode>().err_dataset(self)?)
    }
}

trait GroupExt {
    fn create_resizable_empty_dataset<T: H5Type>(
        &self,
        name: &str,
        chunk_size: usize,
    ) -> OutputResult<Dataset>;

    fn add_string_list_attribute_to(&self, name: &str, values: &[String]) -> OutputResult<()>;
}

impl GroupExt for Group {
    /// Creates a one-dimensional dataset of length zero which can be appended to,
    /// compressed if the deflate filter is available.
    fn create_resizable_empty_dataset<T: H5Type>(
        &self,
        name: &str,
        chunk_size: usize,
    ) -> OutputResult<Dataset> {
        let builder = self
            .new_dataset::<T>()
            .shape(SimpleExtents::resizable(vec![0]))
            .chunk(vec![chunk_size]);
        let builder = if deflate_available() {
            builder.deflate(DEFLATE_LEVEL)
        } else {
            builder
        };
        builder.create(name).err_group(self)
    }

    fn add_string_list_attribute_to(&self, name: &str, values: &[String]) -> OutputResult<()> {
        let values = values
            .iter()
            .map(|value| value.parse::<VarLenUnicode>())
            .collect::<Result<Vec<_>, _>>()
            .err_group(self)?;
        self.new_attr::<VarLenUnicode>()
            .shape(values.len())
            .create(name)
            .err_group(self)?
            .write_raw(values.as_slice())
            .err_group(self)
    }
}

trait DatasetExt {
    fn append_slice<T: H5Type>(&self, value: &[T]) -> OutputResult<()>;
}

impl DatasetExt for Dataset {
    fn append_slice<T: H5Type>(&self, value: &[T]) -> OutputResult<()> {
        if value.is_empty() {
            return Ok(());
        }
        let cur_size = self.size();
        let new_size = cur_size + value.len();
        self.resize(new_size).err_dataset(self)?;
        self.write_slice(value, s![cur_size..new_size])
            .err_dataset(self)
    }
}

fn create_file(path: &Path, files: &[PathBuf], extraction: &Extraction) -> OutputResult<hdf5::File> {
    let file = hdf5::File::create(path)?;
    file.add_string_attribute_to("extraction", &extraction.to_string())?;
    match extraction {
        Extraction::Rate {
            channel,
            block_size,
        } => {
            file.add_attribute_to("channel", channel)?;
            file.add_attribute_to("block_size", &(*block_size as u64))?;
        }
        Extraction::Kicker { sample_rate_hz } => {
            file.add_attribute_to("sample_rate_hz", sample_rate_hz)?;
        }
    }
    let files: Vec<String> = files
        .iter()
        .map(|file| file.display().to_string())
        .collect();
    file.add_string_list_attribute_to("files", &files)?;
    Ok(file)
}

fn write_timestamps(group: &Group, timestamps: &[Timestamp]) -> OutputResult<()> {
    let dataset = group.create_resizable_empty_dataset::<i64>(TIME_DATASET, CHUNK_SIZE)?;
    dataset.add_string_attribute_to("units", TIME_UNITS)?;
    let nanoseconds = timestamps
        .iter()
        .map(|timestamp| {
            timestamp
                .timestamp_nanos_opt()
                .ok_or_else(|| OutputError::timestamp_out_of_range(*timestamp))
        })
        .collect::<OutputResult<Vec<i64>>>()
        .err_dataset(&dataset)?;
    dataset.append_slice(&nanoseconds)
}

/// Writes a rate series to a new file at `path`, replacing any existing file.
pub fn write_rate(
    path: &Path,
    series: &RateSeries,
    files: &[PathBuf],
    extraction: &Extraction,
) -> OutputResult<()> {
    let file = create_file(path, files, extraction)?;
    write_timestamps(&file, &series.timestamps)?;

    let rates = file.create_resizable_empty_dataset::<f64>(RATE_DATASET, CHUNK_SIZE)?;
    rates.add_string_attribute_to("units", RATE_UNITS)?;
    rates.append_slice(&series.rates)?;

    file.close()?;
    info!("Wrote {} rates to {}", series.len(), path.display());
    Ok(())
}

/// Writes event timestamps to a new file at `path`, replacing any existing file.
pub fn write_events(
    path: &Path,
    events: &[Timestamp],
    files: &[PathBuf],
    extraction: &Extraction,
) -> OutputResult<()> {
    let file = create_file(path, files, extraction)?;
    write_timestamps(&file, events)?;

    file.close()?;
    info!("Wrote {} events to {}", events.len(), path.display());
    Ok(())
}
