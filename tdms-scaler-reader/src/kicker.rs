//! Locates kicker firings, the rising edges of a digital channel.
use crate::error::ExtractionError;
use chrono::TimeDelta;
use itertools::Itertools;
use scaler_common::{DigitalLevel, Timestamp};

pub const DEFAULT_SAMPLE_RATE_HZ: f64 = 1024.0;

const NANOSECONDS_PER_SECOND: f64 = 1e9;

/// Returns the absolute time of every rising edge in `digital`.
/// Only a step up of exactly one level is an edge.
/// The edge between samples `j` and `j + 1` is timed at sample `j + 1`,
/// rounded to the nearest nanosecond.
pub fn locate_events(
    digital: &[DigitalLevel],
    initial_timestamp: Timestamp,
    sample_rate_hz: f64,
) -> Result<Vec<Timestamp>, ExtractionError> {
    if !sample_rate_hz.is_finite() || sample_rate_hz <= 0.0 {
        return Err(ExtractionError::InvalidSampleRate(sample_rate_hz));
    }
    Ok(digital
        .iter()
        .tuple_windows()
        .positions(|(before, after)| after.checked_sub(*before) == Some(1))
        .map(|index| {
            let offset = (index + 1) as f64 / sample_rate_hz * NANOSECONDS_PER_SECOND;
            initial_timestamp + TimeDelta::nanoseconds(offset.round() as i64)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn t0() -> Timestamp {
        DateTime::from_timestamp(1_686_735_667, 0).unwrap()
    }

    #[test]
    fn two_rising_edges() {
        let events = locate_events(&[0, 0, 1, 1, 0, 1], t0(), 2.0).unwrap();
        assert_eq!(
            events,
            vec![
                t0() + TimeDelta::seconds(1),
                t0() + TimeDelta::milliseconds(2500)
            ]
        );
    }

    #[test]
    fn constant_channel_has_no_events() {
        assert!(locate_events(&[1; 100], t0(), 1024.0).unwrap().is_empty());
        assert!(locate_events(&[0; 100], t0(), 1024.0).unwrap().is_empty());
    }

    #[test]
    fn empty_and_single_sample_channels() {
        assert!(locate_events(&[], t0(), 1024.0).unwrap().is_empty());
        assert!(locate_events(&[1], t0(), 1024.0).unwrap().is_empty());
    }

    #[test]
    fn only_unit_rises_are_edges() {
        // falls, and rises of more than one level, are ignored
        let events = locate_events(&[0, 2, 0, 1, 0, 3, 2, 3], t0(), 1.0).unwrap();
        assert_eq!(
            events,
            vec![t0() + TimeDelta::seconds(3), t0() + TimeDelta::seconds(7)]
        );
    }

    #[test]
    fn rounds_to_nearest_nanosecond() {
        // 1/3 s = 333333333.33 ns, 2/3 s = 666666666.67 ns
        let events = locate_events(&[0, 1, 0, 1], t0(), 3.0).unwrap();
        assert_eq!(
            events,
            vec![
                t0() + TimeDelta::nanoseconds(333_333_333),
                t0() + TimeDelta::nanoseconds(1_000_000_000)
            ]
        );
        let events = locate_events(&[0, 0, 1], t0(), 3.0).unwrap();
        assert_eq!(events, vec![t0() + TimeDelta::nanoseconds(666_666_667)]);
    }

    #[test]
    fn events_are_strictly_increasing_and_within_recording() {
        let digital: Vec<DigitalLevel> = (0..4096).map(|i| (i / 7) % 2).collect();
        let events = locate_events(&digital, t0(), DEFAULT_SAMPLE_RATE_HZ).unwrap();
        assert!(!events.is_empty());
        assert!(events.iter().tuple_windows().all(|(a, b)| a < b));
        let duration = TimeDelta::nanoseconds((4096.0 / DEFAULT_SAMPLE_RATE_HZ * 1e9) as i64);
        assert!(events.iter().all(|t| *t >= t0() && *t <= t0() + duration));
    }

    #[test]
    fn invalid_sample_rates() {
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                locate_events(&[0, 1], t0(), rate),
                Err(ExtractionError::InvalidSampleRate(_))
            ));
        }
    }
}
