//! Parsing of segment lead-ins and metadata, and the layout of a segment's raw data.
use crate::{
    data_type::DataType,
    error::{TdmsError, TdmsResult},
    loader::{Endianness, Loader},
    property::Property,
};
use std::io::Read;
use tracing::warn;

const TDMS_TAG: [u8; 4] = *b"TDSm";
const SUPPORTED_VERSIONS: [u32; 2] = [4712, 4713];
/// Written as the next segment offset when the writer did not finish the segment.
const INCOMPLETE_SEGMENT: u64 = u64::MAX;

const NO_RAW_DATA: u32 = 0xFFFF_FFFF;
const SAME_AS_PREVIOUS: u32 = 0x0000_0000;
const DAQMX_FORMAT_CHANGING: u32 = 0x6912_0000;
const DAQMX_DIGITAL_LINE_SCALER: u32 = 0x6913_0000;

/// The table of contents bitmask of a lead-in.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TableOfContents(pub(crate) u32);

impl TableOfContents {
    pub(crate) const METADATA: u32 = 1 << 1;
    pub(crate) const NEW_OBJECT_LIST: u32 = 1 << 2;
    pub(crate) const RAW_DATA: u32 = 1 << 3;
    pub(crate) const INTERLEAVED: u32 = 1 << 5;
    pub(crate) const BIG_ENDIAN: u32 = 1 << 6;
    pub(crate) const DAQMX_RAW_DATA: u32 = 1 << 7;

    pub(crate) fn has_metadata(&self) -> bool {
        self.0 & Self::METADATA != 0
    }

    pub(crate) fn has_new_object_list(&self) -> bool {
        self.0 & Self::NEW_OBJECT_LIST != 0
    }

    pub(crate) fn has_raw_data(&self) -> bool {
        self.0 & Self::RAW_DATA != 0
    }

    pub(crate) fn is_interleaved(&self) -> bool {
        self.0 & Self::INTERLEAVED != 0
    }

    pub(crate) fn has_daqmx_raw_data(&self) -> bool {
        self.0 & Self::DAQMX_RAW_DATA != 0
    }

    pub(crate) fn endianness(&self) -> Endianness {
        if self.0 & Self::BIG_ENDIAN != 0 {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LeadIn {
    pub(crate) toc: TableOfContents,
    pub(crate) version: u32,
    pub(crate) next_segment_offset: u64,
    pub(crate) raw_data_offset: u64,
}

impl LeadIn {
    pub(crate) const SIZE: u64 = 28;

    /// Loads the lead-in of the segment starting at `position`.
    pub(crate) fn load<R: Read>(reader: &mut R, position: u64) -> TdmsResult<Self> {
        let mut tag = [0u8; 4];
        reader.read_exact(&mut tag)?;
        if tag != TDMS_TAG {
            return Err(TdmsError::InvalidTag { tag, position });
        }

        let toc = TableOfContents(Loader::new(reader, Endianness::Little).load::<u32>()?);
        let mut loader = Loader::new(reader, toc.endianness());
        let version = loader.load::<u32>()?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(TdmsError::UnsupportedVersion(version));
        }
        Ok(Self {
            toc,
            version,
            next_segment_offset: loader.load::<u64>()?,
            raw_data_offset: loader.load::<u64>()?,
        })
    }

    /// Position one past the last byte of the segment starting at `position`.
    /// Segments which were never finished, or which claim to run past the end
    /// of the file, are taken to run to the end of the file.
    pub(crate) fn segment_end(&self, position: u64, file_size: u64) -> u64 {
        if self.next_segment_offset == INCOMPLETE_SEGMENT {
            warn!("Segment at byte {position} is incomplete, reading to end of file");
            return file_size;
        }
        match (position + Self::SIZE).checked_add(self.next_segment_offset) {
            Some(end) if end <= file_size => end,
            _ => {
                warn!(
                    "Segment at byte {position} extends past end of file ({file_size} bytes), reading to end of file"
                );
                file_size
            }
        }
    }

    /// Position of the first byte of raw data, clamped to the segment.
    pub(crate) fn data_start(&self, position: u64, segment_end: u64) -> u64 {
        (position + Self::SIZE)
            .saturating_add(self.raw_data_offset)
            .min(segment_end)
    }
}

/// Describes how many values of which type an object writes per chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawDataIndex {
    pub(crate) data_type: DataType,
    pub(crate) number_of_values: u64,
    /// Bytes per chunk for this object.
    pub(crate) total_size: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawIndexEntry {
    None,
    SameAsPrevious,
    Explicit(RawDataIndex),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ObjectMetadata {
    pub(crate) path: String,
    pub(crate) raw_index: RawIndexEntry,
    pub(crate) properties: Vec<Property>,
}

impl<R: Read> Loader<'_, R> {
    pub(crate) fn load_segment_metadata(&mut self) -> TdmsResult<Vec<ObjectMetadata>> {
        let number_of_objects = self.load::<u32>()?;
        (0..number_of_objects)
            .map(|_| self.load_object_metadata())
            .collect()
    }

    fn load_object_metadata(&mut self) -> TdmsResult<ObjectMetadata> {
        let path = self.load_string()?;
        let raw_index = match self.load::<u32>()? {
            NO_RAW_DATA => RawIndexEntry::None,
            SAME_AS_PREVIOUS => RawIndexEntry::SameAsPrevious,
            DAQMX_FORMAT_CHANGING | DAQMX_DIGITAL_LINE_SCALER => {
                return Err(TdmsError::DaqmxUnsupported(path));
            }
            _ => RawIndexEntry::Explicit(self.load_raw_data_index(&path)?),
        };
        let number_of_properties = self.load::<u32>()?;
        let properties = (0..number_of_properties)
            .map(|_| self.load_property())
            .collect::<TdmsResult<_>>()?;
        Ok(ObjectMetadata {
            path,
            raw_index,
            properties,
        })
    }

    fn load_raw_data_index(&mut self, path: &str) -> TdmsResult<RawDataIndex> {
        let code = self.load::<u32>()?;
        if code == DataType::DAQMX_RAW_DATA {
            return Err(TdmsError::DaqmxUnsupported(path.to_owned()));
        }
        let data_type = DataType::from_code(code)?;
        let dimension = self.load::<u32>()?;
        if dimension != 1 {
            return Err(TdmsError::UnsupportedDimension {
                path: path.to_owned(),
                dimension,
            });
        }
        let number_of_values = self.load::<u64>()?;
        let total_size = match data_type.size() {
            Some(size) => size
                .checked_mul(number_of_values)
                .ok_or_else(|| TdmsError::SizeOverflow(path.to_owned()))?,
            None if data_type == DataType::String => self.load::<u64>()?,
            None => 0,
        };
        Ok(RawDataIndex {
            data_type,
            number_of_values,
            total_size,
        })
    }
}

/// A run of values belonging to one channel within a segment's raw data.
/// Value `i` starts at `offset + i * stride`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DataBlock {
    pub(crate) offset: u64,
    pub(crate) count: u64,
    pub(crate) stride: u64,
    pub(crate) endianness: Endianness,
}

impl DataBlock {
    /// Position one past the last byte of the block, for values of `value_size` bytes.
    pub(crate) fn end(&self, value_size: u64) -> Option<u64> {
        match self.count.checked_sub(1) {
            None => Some(self.offset),
            Some(last) => last
                .checked_mul(self.stride)?
                .checked_add(value_size)?
                .checked_add(self.offset),
        }
    }
}

/// Computes where each channel's values lie in a segment's raw data.
/// # Parameters
/// - indices: the raw data index of each channel with data, in object list order.
/// - data_start: position of the first byte of raw data.
/// - data_size: number of bytes of raw data actually present.
/// # Return
/// The blocks of each channel, in the same order as `indices`.
pub(crate) fn layout_segment(
    indices: &[RawDataIndex],
    data_start: u64,
    data_size: u64,
    interleaved: bool,
    endianness: Endianness,
) -> TdmsResult<Vec<Vec<DataBlock>>> {
    if interleaved {
        layout_interleaved(indices, data_start, data_size, endianness)
    } else {
        layout_contiguous(indices, data_start, data_size, endianness)
    }
}

fn layout_contiguous(
    indices: &[RawDataIndex],
    data_start: u64,
    data_size: u64,
    endianness: Endianness,
) -> TdmsResult<Vec<Vec<DataBlock>>> {
    let mut blocks = vec![Vec::new(); indices.len()];
    let chunk_size = indices
        .iter()
        .try_fold(0u64, |total, index| total.checked_add(index.total_size))
        .ok_or_else(|| TdmsError::SizeOverflow("segment chunk".to_owned()))?;
    if chunk_size == 0 {
        return Ok(blocks);
    }

    let number_of_chunks = data_size / chunk_size;
    for chunk in 0..number_of_chunks {
        let mut offset = data_start + chunk * chunk_size;
        for (index, channel_blocks) in indices.iter().zip(blocks.iter_mut()) {
            let size = index.data_type.size().filter(|size| *size != 0);
            if let (Some(stride), true) = (size, index.number_of_values != 0) {
                channel_blocks.push(DataBlock {
                    offset,
                    count: index.number_of_values,
                    stride,
                    endianness,
                });
            }
            offset += index.total_size;
        }
    }

    // The writer stopped part way through a chunk, channels are written in order
    // so each takes as many whole values as remain.
    let mut remaining = data_size % chunk_size;
    if remaining != 0 {
        warn!(
            "Raw data of {data_size} bytes is not a multiple of the chunk size {chunk_size}, reading partial final chunk"
        );
        let mut offset = data_start + number_of_chunks * chunk_size;
        for (index, channel_blocks) in indices.iter().zip(blocks.iter_mut()) {
            let Some(size) = index.data_type.size().filter(|size| *size != 0) else {
                break;
            };
            let count = index.number_of_values.min(remaining / size);
            if count != 0 {
                channel_blocks.push(DataBlock {
                    offset,
                    count,
                    stride: size,
                    endianness,
                });
            }
            offset += count * size;
            remaining -= count * size;
        }
    }
    Ok(blocks)
}

fn layout_interleaved(
    indices: &[RawDataIndex],
    data_start: u64,
    data_size: u64,
    endianness: Endianness,
) -> TdmsResult<Vec<Vec<DataBlock>>> {
    let sizes = indices
        .iter()
        .map(|index| {
            index
                .data_type
                .size()
                .ok_or(TdmsError::UnsupportedInterleavedType(index.data_type))
        })
        .collect::<TdmsResult<Vec<_>>>()?;
    let row_size: u64 = sizes.iter().sum();
    if row_size == 0 {
        return Ok(vec![Vec::new(); indices.len()]);
    }

    let rows = data_size / row_size;
    if data_size % row_size != 0 {
        warn!(
            "Interleaved raw data of {data_size} bytes is not a multiple of the row size {row_size}, ignoring partial final row"
        );
    }
    let mut column = 0;
    Ok(sizes
        .into_iter()
        .map(|size| {
            let block = DataBlock {
                offset: data_start + column,
                count: rows,
                stride: row_size,
                endianness,
            };
            column += size;
            if rows == 0 { Vec::new() } else { vec![block] }
        })
        .collect())
}
