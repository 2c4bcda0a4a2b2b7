//! Reads the channels of a scaler recording and runs the extractors over them.
use crate::{
    error::ScalerError,
    kicker::locate_events,
    rate::{RateSeries, extract_rate},
};
use scaler_common::{
    ChannelIndex, Count, DigitalLevel, KICKER_CHANNEL, SCALER_DATA_GROUP, TIMESTAMP_CHANNEL,
    TIMESTAMP_GROUP, Timestamp, channel_name,
};
use scaler_tdms::{TdmsError, TdmsFile};
use std::{
    io::{Read, Seek},
    path::Path,
};
use tracing::{debug, instrument};

/// The channels a scaler recording provides.
pub trait ScalerSource {
    /// Samples of the scaler channel `channel`, as integers.
    fn scaler_channel(&mut self, channel: ChannelIndex) -> Result<Vec<Count>, TdmsError>;
    /// The wall clock time of each block of scaler samples.
    fn block_timestamps(&mut self) -> Result<Vec<Timestamp>, TdmsError>;
}

impl<R: Read + Seek> ScalerSource for TdmsFile<R> {
    fn scaler_channel(&mut self, channel: ChannelIndex) -> Result<Vec<Count>, TdmsError> {
        self.read(SCALER_DATA_GROUP, &channel_name(channel))?
            .to_i64()
    }

    fn block_timestamps(&mut self) -> Result<Vec<Timestamp>, TdmsError> {
        self.read(TIMESTAMP_GROUP, TIMESTAMP_CHANNEL)?
            .into_timestamps()
    }
}

/// Extracts the rate of scaler channel `channel` from `source`.
pub fn extract_scaler_rate(
    source: &mut impl ScalerSource,
    channel: ChannelIndex,
    block_size: usize,
) -> Result<RateSeries, ScalerError> {
    let counter = source.scaler_channel(channel)?;
    let timestamps = source.block_timestamps()?;
    debug!(
        "Read {} counter samples and {} timestamps",
        counter.len(),
        timestamps.len()
    );
    Ok(extract_rate(&counter, &timestamps, block_size)?)
}

/// Extracts the kicker firing times from `source`, timed from its first block timestamp.
pub fn extract_kicker_times(
    source: &mut impl ScalerSource,
    sample_rate_hz: f64,
) -> Result<Vec<Timestamp>, ScalerError> {
    let timestamps = source.block_timestamps()?;
    let initial_timestamp = timestamps.first().copied().ok_or(ScalerError::NoTimestamps)?;
    let digital: Vec<DigitalLevel> = source.scaler_channel(KICKER_CHANNEL)?;
    debug!(
        "Read {} kicker samples starting at {initial_timestamp}",
        digital.len()
    );
    Ok(locate_events(&digital, initial_timestamp, sample_rate_hz)?)
}

/// Opens the TDMS file at `path` and extracts the rate of scaler channel `channel`.
/// The file is closed before returning.
#[instrument(skip_all, fields(path = %path.display(), channel = channel))]
pub fn read_scaler_rate(
    path: &Path,
    channel: ChannelIndex,
    block_size: usize,
) -> Result<RateSeries, ScalerError> {
    let mut file = TdmsFile::open(path)?;
    extract_scaler_rate(&mut file, channel, block_size)
}

/// Opens the TDMS file at `path` and extracts the kicker firing times.
/// The file is closed before returning.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_kicker_times(path: &Path, sample_rate_hz: f64) -> Result<Vec<Timestamp>, ScalerError> {
    let mut file = TdmsFile::open(path)?;
    extract_kicker_times(&mut file, sample_rate_hz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeDelta};
    use scaler_tdms::test_utils::{SegmentBuilder, TdmsValues, channel_path};
    use std::io::Cursor;

    fn t0() -> Timestamp {
        DateTime::from_timestamp(1_686_735_667, 500_000_000).unwrap()
    }

    fn recording(counter: Vec<u32>, kicker: Vec<u8>, timestamps: Vec<Timestamp>) -> Vec<u8> {
        SegmentBuilder::new()
            .object("/'SCData'")
            .channel(&channel_path("SCData", "CHANNEL_04"), TdmsValues::U8(kicker))
            .channel(&channel_path("SCData", "CHANNEL_05"), TdmsValues::U32(counter))
            .channel(
                &channel_path("SCTimestamps", "TimeStamp"),
                TdmsValues::Timestamp(timestamps),
            )
            .build()
    }

    fn open(bytes: Vec<u8>) -> TdmsFile<Cursor<Vec<u8>>> {
        TdmsFile::from_reader(Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn rate_from_recording() {
        let timestamps = vec![t0(), t0() + TimeDelta::seconds(2), t0() + TimeDelta::seconds(4)];
        let bytes = recording((0..12).collect(), vec![0; 12], timestamps);
        let series = extract_scaler_rate(&mut open(bytes), 5, 4).unwrap();
        assert_eq!(series.timestamps, vec![t0(), t0() + TimeDelta::seconds(2)]);
        assert_eq!(series.rates, vec![1.5, 1.5]);
    }

    #[test]
    fn kicker_from_recording() {
        let timestamps = vec![t0(), t0() + TimeDelta::seconds(1)];
        let kicker = vec![0, 1, 1, 0, 0, 1, 0, 0];
        let bytes = recording(vec![0; 8], kicker, timestamps);
        let events = extract_kicker_times(&mut open(bytes), 4.0).unwrap();
        assert_eq!(
            events,
            vec![
                t0() + TimeDelta::milliseconds(250),
                t0() + TimeDelta::milliseconds(1250)
            ]
        );
    }

    #[test]
    fn missing_channel() {
        let bytes = recording(vec![0; 8], vec![0; 8], vec![t0()]);
        let error = extract_scaler_rate(&mut open(bytes), 7, 4).unwrap_err();
        assert!(matches!(error, ScalerError::Tdms(ref e) if e.is_missing_object()));
    }

    #[test]
    fn missing_timestamp_group() {
        let bytes = SegmentBuilder::new()
            .channel(
                &channel_path("SCData", "CHANNEL_05"),
                TdmsValues::U32(vec![1, 2]),
            )
            .build();
        assert!(matches!(
            extract_scaler_rate(&mut open(bytes), 5, 2),
            Err(ScalerError::Tdms(TdmsError::GroupNotFound(_)))
        ));
    }

    #[test]
    fn no_timestamps_for_kicker() {
        let bytes = recording(vec![0; 2], vec![0, 1], Vec::new());
        assert!(matches!(
            extract_kicker_times(&mut open(bytes), 1024.0),
            Err(ScalerError::NoTimestamps)
        ));
    }

    #[test]
    fn float_counter_is_accepted() {
        let timestamps = vec![t0(), t0() + TimeDelta::seconds(1), t0() + TimeDelta::seconds(2)];
        let bytes = SegmentBuilder::new()
            .channel(
                &channel_path("SCData", "CHANNEL_05"),
                TdmsValues::F64((0..8).map(f64::from).collect()),
            )
            .channel(
                &channel_path("SCTimestamps", "TimeStamp"),
                TdmsValues::Timestamp(timestamps),
            )
            .build();
        let series = extract_scaler_rate(&mut open(bytes), 5, 4).unwrap();
        assert_eq!(series.rates, vec![3.0, 3.0]);
    }

    #[test]
    fn recording_without_samples_has_no_rates() {
        let bytes = SegmentBuilder::new()
            .object(&channel_path("SCData", "CHANNEL_05"))
            .object(&channel_path("SCTimestamps", "TimeStamp"))
            .build();
        let series = extract_scaler_rate(&mut open(bytes), 5, 1024).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn truncated_recording_loses_final_block() {
        let counter = channel_path("SCData", "CHANNEL_05");
        let timestamp = channel_path("SCTimestamps", "TimeStamp");
        let mut bytes = SegmentBuilder::new()
            .channel(
                &timestamp,
                TdmsValues::Timestamp(vec![t0(), t0() + TimeDelta::seconds(1)]),
            )
            .channel(&counter, TdmsValues::U32((0..8).collect()))
            .build();
        bytes.extend(
            SegmentBuilder::raw_data_only()
                .values(TdmsValues::Timestamp(vec![
                    t0() + TimeDelta::seconds(2),
                    t0() + TimeDelta::seconds(3),
                ]))
                .values(TdmsValues::U32((8..16).collect()))
                .build(),
        );
        let mut complete = open(bytes.clone());
        let series = extract_scaler_rate(&mut complete, 5, 4).unwrap();
        assert_eq!(series.rates, vec![3.0, 3.0, 3.0]);

        // The writer stopped after three of the final eight counter samples.
        bytes.truncate(bytes.len() - 20);
        let mut truncated = open(bytes);
        let series = extract_scaler_rate(&mut truncated, 5, 4).unwrap();
        assert_eq!(series.timestamps, vec![t0(), t0() + TimeDelta::seconds(1)]);
        assert_eq!(series.rates, vec![3.0, 3.0]);
    }

    #[test]
    fn read_from_disk() {
        let path = std::env::temp_dir().join("tdms_scaler_reader_source_test.tdms");
        let timestamps = vec![t0(), t0() + TimeDelta::seconds(1)];
        let bytes = recording((0..8).collect(), vec![0, 0, 1, 0, 0, 0, 0, 0], timestamps);
        std::fs::write(&path, bytes).unwrap();
        let series = read_scaler_rate(&path, 5, 4);
        let events = read_kicker_times(&path, 4.0);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(series.unwrap().rates, vec![3.0]);
        assert_eq!(events.unwrap(), vec![t0() + TimeDelta::milliseconds(500)]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join("tdms_scaler_reader_no_such_file.tdms");
        assert!(matches!(
            read_scaler_rate(&path, 5, 1024),
            Err(ScalerError::Tdms(TdmsError::IO(_)))
        ));
    }
}
