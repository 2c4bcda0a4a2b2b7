//! Runs an extraction over many input files, skipping those that cannot be read.
use crate::{error::ScalerError, rate::RateSeries};
use rayon::prelude::*;
use scaler_common::Timestamp;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Results which can be concatenated across files.
pub trait Accumulate: Default + Send {
    fn accumulate(&mut self, other: Self);
    fn number_of_samples(&self) -> usize;
}

impl Accumulate for RateSeries {
    fn accumulate(&mut self, other: Self) {
        self.append(other);
    }

    fn number_of_samples(&self) -> usize {
        self.len()
    }
}

impl Accumulate for Vec<Timestamp> {
    fn accumulate(&mut self, mut other: Self) {
        self.append(&mut other);
    }

    fn number_of_samples(&self) -> usize {
        self.len()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub samples: usize,
}

/// Expands glob patterns into the files they match, in sorted order.
/// A pattern which matches nothing, or is not valid glob syntax, is kept as a
/// literal path, so that a missing file is reported when it is processed.
pub fn expand_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for pattern in patterns {
        let mut matches = match glob::glob(pattern) {
            Ok(paths) => paths.filter_map(Result::ok).collect::<Vec<_>>(),
            Err(e) => {
                debug!("Treating {pattern} as a literal path: {e}");
                Vec::new()
            }
        };
        if matches.is_empty() {
            files.push(PathBuf::from(pattern));
        } else {
            matches.sort();
            files.append(&mut matches);
        }
    }
    files
}

fn process_file<T, F>(path: &Path, extract: &F) -> Result<T, ScalerError>
where
    F: Fn(&Path) -> Result<T, ScalerError>,
{
    info!("Processing file: {}", path.display());
    extract(path)
}

/// Applies `extract` to every file and concatenates the results in input order.
/// Files for which `extract` fails are logged and skipped.
/// # Parameters
/// - files: the input files.
/// - parallel: if true, files are processed concurrently on the rayon thread pool.
/// - extract: the per-file extraction.
pub fn run_batch<T, F>(files: &[PathBuf], parallel: bool, extract: F) -> (T, BatchSummary)
where
    T: Accumulate,
    F: Fn(&Path) -> Result<T, ScalerError> + Sync,
{
    let results: Vec<Result<T, ScalerError>> = if parallel {
        files
            .par_iter()
            .map(|path| process_file(path, &extract))
            .collect()
    } else {
        files
            .iter()
            .map(|path| process_file(path, &extract))
            .collect()
    };

    let mut summary = BatchSummary::default();
    let mut accumulated = T::default();
    for (path, result) in files.iter().zip(results) {
        match result {
            Ok(result) => {
                summary.processed += 1;
                summary.samples += result.number_of_samples();
                accumulated.accumulate(result);
            }
            Err(e) => {
                summary.skipped += 1;
                warn!("Invalid data in {}: {e}", path.display());
            }
        }
    }
    (accumulated, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ExtractionError, source::read_scaler_rate};
    use chrono::{DateTime, TimeDelta};
    use scaler_tdms::test_utils::{SegmentBuilder, TdmsValues, channel_path};

    fn t0() -> Timestamp {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    /// Each good file yields events at the whole seconds given by its name.
    fn fake_extract(path: &Path) -> Result<Vec<Timestamp>, ScalerError> {
        let name = path.to_string_lossy();
        if name.starts_with("bad") {
            return Err(ExtractionError::DataShape {
                counts: 5,
                intervals: 1,
            }
            .into());
        }
        Ok(name
            .split(',')
            .filter_map(|s| s.parse::<i64>().ok())
            .map(|s| t0() + TimeDelta::seconds(s))
            .collect())
    }

    fn files(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn bad_files_are_skipped() {
        let (events, summary) = run_batch(&files(&["1,2", "bad", "3", "bad2"]), false, fake_extract);
        assert_eq!(
            summary,
            BatchSummary {
                processed: 2,
                skipped: 2,
                samples: 3
            }
        );
        assert_eq!(
            events,
            (1..=3).map(|s| t0() + TimeDelta::seconds(s)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn parallel_preserves_order() {
        let names: Vec<String> = (0..64)
            .map(|i| if i % 5 == 0 { "bad".to_owned() } else { format!("{i},{}", i + 100) })
            .collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let sequential = run_batch(&files(&names), false, fake_extract);
        let parallel = run_batch(&files(&names), true, fake_extract);
        assert_eq!(sequential, parallel);
        assert_eq!(sequential.1.skipped, 13);
    }

    #[test]
    fn no_files() {
        let (series, summary): (RateSeries, _) = run_batch(&[], false, |_| unreachable!());
        assert!(series.is_empty());
        assert_eq!(summary, BatchSummary::default());
    }

    #[test]
    fn rate_series_accumulate() {
        let extract = |path: &Path| -> Result<RateSeries, ScalerError> {
            let rate = path.to_string_lossy().parse::<f64>().map_err(|_| ScalerError::NoTimestamps)?;
            Ok(RateSeries {
                timestamps: vec![t0()],
                rates: vec![rate],
            })
        };
        let (series, summary) = run_batch(&files(&["1.5", "x", "2.5"]), true, extract);
        assert_eq!(series.rates, vec![1.5, 2.5]);
        assert_eq!(summary.samples, 2);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn glob_expansion() {
        let directory = std::env::temp_dir().join("tdms_scaler_reader_glob_test");
        std::fs::create_dir_all(&directory).unwrap();
        for name in ["b.tdms", "a.tdms", "c.txt"] {
            std::fs::write(directory.join(name), b"").unwrap();
        }
        let pattern = directory.join("*.tdms").to_string_lossy().into_owned();
        let literal = directory.join("missing.tdms").to_string_lossy().into_owned();

        let expanded = expand_inputs(&[pattern, literal.clone()]);
        std::fs::remove_dir_all(&directory).unwrap();
        assert_eq!(
            expanded,
            vec![
                directory.join("a.tdms"),
                directory.join("b.tdms"),
                PathBuf::from(literal)
            ]
        );
    }

    #[test]
    fn invalid_pattern_is_a_literal_path() {
        assert_eq!(
            expand_inputs(&["run[1.tdms".to_owned(), "[".to_owned()]),
            vec![PathBuf::from("run[1.tdms"), PathBuf::from("[")]
        );
    }

    #[test]
    fn malformed_recordings_are_skipped() {
        let directory = std::env::temp_dir().join("tdms_scaler_reader_malformed_batch_test");
        std::fs::create_dir_all(&directory).unwrap();
        let counter = channel_path("SCData", "CHANNEL_05");
        let timestamps = channel_path("SCTimestamps", "TimeStamp");

        let good = SegmentBuilder::new()
            .channel(&counter, TdmsValues::U32((0..8).collect()))
            .channel(
                &timestamps,
                TdmsValues::Timestamp(vec![t0(), t0() + TimeDelta::seconds(1)]),
            )
            .build();
        // The counter's index claims more values than can be addressed.
        let overflowing = SegmentBuilder::new()
            .channel_claiming(&counter, TdmsValues::U32(vec![1, 2]), 1 << 62)
            .channel(&timestamps, TdmsValues::Timestamp(vec![t0()]))
            .build();
        let inputs = [
            ("good.tdms", good),
            ("overflowing.tdms", overflowing),
            ("garbage.tdms", b"not a tdms file, but long enough for a lead-in".to_vec()),
        ];
        for (name, bytes) in &inputs {
            std::fs::write(directory.join(name), bytes).unwrap();
        }
        let paths: Vec<PathBuf> = inputs.iter().map(|(name, _)| directory.join(name)).collect();

        let sequential = run_batch(&paths, false, |path| read_scaler_rate(path, 5, 4));
        let parallel = run_batch(&paths, true, |path| read_scaler_rate(path, 5, 4));
        std::fs::remove_dir_all(&directory).unwrap();

        let (series, summary) = sequential;
        assert_eq!(series.rates, vec![3.0]);
        assert_eq!(
            summary,
            BatchSummary {
                processed: 1,
                skipped: 2,
                samples: 1
            }
        );
        assert_eq!(parallel.0.rates, vec![3.0]);
        assert_eq!(parallel.1, summary);
    }
}
