//! Logs the structure and contents of a TDMS file.
use scaler_tdms::{Property, TdmsFile, TdmsResult};
use std::io::{Read, Seek};
use tracing::{info, warn};

/// Values shown at each end of a channel's data.
const SUMMARY_EDGE: usize = 3;

fn log_properties(indent: &str, properties: &[Property]) {
    for property in properties {
        info!("{indent}{} = {}", property.name, property.value);
    }
}

/// Logs every group and channel of `file`, with its properties and data.
/// Channels whose data cannot be materialized are reported and skipped.
/// # Return
/// The number of channels logged.
pub fn log_tdms_info<R: Read + Seek>(file: &mut TdmsFile<R>) -> TdmsResult<usize> {
    info!(
        "{} segments, {} groups",
        file.number_of_segments(),
        file.groups().len()
    );
    log_properties("", file.properties());

    let layout: Vec<(String, Vec<String>)> = file
        .groups()
        .iter()
        .map(|group| {
            let channels = group
                .channels()
                .iter()
                .map(|channel| channel.name().to_owned())
                .collect();
            (group.name().to_owned(), channels)
        })
        .collect();

    let mut number_of_channels = 0;
    for (group_name, channel_names) in layout {
        info!("Group: {group_name}");
        log_properties("  ", file.group(&group_name)?.properties());
        for channel_name in channel_names {
            let channel = file.group(&group_name)?.channel(&channel_name)?;
            let data_type = channel
                .data_type()
                .map_or_else(|| "none".to_owned(), |data_type| data_type.to_string());
            info!(
                "  Channel: {channel_name}, type: {data_type}, length: {}",
                channel.len()
            );
            log_properties("    ", channel.properties());
            match file.read(&group_name, &channel_name) {
                Ok(data) => info!("    {}", data.summary(SUMMARY_EDGE)),
                Err(e) => warn!("    Cannot read data: {e}"),
            }
            number_of_channels += 1;
        }
    }
    Ok(number_of_channels)
}
