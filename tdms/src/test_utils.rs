//! Builds TDMS segments in memory, for use as test fixtures.
use crate::{
    data_type::DataType,
    path::quote,
    property::{Property, PropertyValue},
    segment::TableOfContents,
    timestamp::to_tdms,
};
use scaler_common::Timestamp;

const VERSION: u32 = 4713;
const NO_RAW_DATA: u32 = 0xFFFF_FFFF;
const SAME_AS_PREVIOUS: u32 = 0;

/// Formats the object path of a channel, quoting the names.
pub fn channel_path(group: &str, channel: &str) -> String {
    format!("/{}/{}", quote(group), quote(channel))
}

/// Formats the object path of a group.
pub fn group_path(group: &str) -> String {
    format!("/{}", quote(group))
}

/// The samples written for one channel.
#[derive(Debug, Clone, PartialEq)]
pub enum TdmsValues {
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Bool(Vec<bool>),
    Timestamp(Vec<Timestamp>),
}

macro_rules! encode_slice {
    ($values:expr, $big_endian:expr, $out:expr) => {
        for value in $values {
            if $big_endian {
                $out.extend(value.to_be_bytes());
            } else {
                $out.extend(value.to_le_bytes());
            }
        }
    };
}

impl TdmsValues {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::I8(_) => DataType::I8,
            Self::I16(_) => DataType::I16,
            Self::I32(_) => DataType::I32,
            Self::I64(_) => DataType::I64,
            Self::U8(_) => DataType::U8,
            Self::U16(_) => DataType::U16,
            Self::U32(_) => DataType::U32,
            Self::U64(_) => DataType::U64,
            Self::F32(_) => DataType::F32,
            Self::F64(_) => DataType::F64,
            Self::Bool(_) => DataType::Boolean,
            Self::Timestamp(_) => DataType::Timestamp,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::I8(v) => v.len(),
            Self::I16(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::I64(v) => v.len(),
            Self::U8(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
            Self::U64(v) => v.len(),
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
            Self::Bool(v) => v.len(),
            Self::Timestamp(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Encodes values `start..end`, clamped to the available values.
    fn encode(&self, start: usize, end: usize, big_endian: bool, out: &mut Vec<u8>) {
        let end = end.min(self.len());
        let start = start.min(end);
        match self {
            Self::I8(v) => encode_slice!(&v[start..end], big_endian, out),
            Self::I16(v) => encode_slice!(&v[start..end], big_endian, out),
            Self::I32(v) => encode_slice!(&v[start..end], big_endian, out),
            Self::I64(v) => encode_slice!(&v[start..end], big_endian, out),
            Self::U8(v) => encode_slice!(&v[start..end], big_endian, out),
            Self::U16(v) => encode_slice!(&v[start..end], big_endian, out),
            Self::U32(v) => encode_slice!(&v[start..end], big_endian, out),
            Self::U64(v) => encode_slice!(&v[start..end], big_endian, out),
            Self::F32(v) => encode_slice!(&v[start..end], big_endian, out),
            Self::F64(v) => encode_slice!(&v[start..end], big_endian, out),
            Self::Bool(v) => out.extend(v[start..end].iter().map(|b| u8::from(*b))),
            Self::Timestamp(v) => {
                for timestamp in &v[start..end] {
                    encode_timestamp(timestamp, big_endian, out);
                }
            }
        }
    }
}

fn encode_timestamp(timestamp: &Timestamp, big_endian: bool, out: &mut Vec<u8>) {
    let (seconds, fractions) = to_tdms(timestamp);
    if big_endian {
        out.extend(seconds.to_be_bytes());
        out.extend(fractions.to_be_bytes());
    } else {
        out.extend(fractions.to_le_bytes());
        out.extend(seconds.to_le_bytes());
    }
}

#[derive(Debug, Clone)]
enum IndexEntry {
    None,
    SameAsPrevious,
    Explicit {
        data_type: DataType,
        number_of_values: u64,
    },
}

#[derive(Debug, Clone)]
struct ObjectEntry {
    path: String,
    index: IndexEntry,
    properties: Vec<Property>,
}

#[derive(Debug, Clone)]
struct RawEntry {
    values: TdmsValues,
    chunk_length: usize,
}

/// Builds one segment.
/// Raw data is written in the order `channel` and `values` are called,
/// which must match the order of the segment's active object list.
#[derive(Debug, Clone)]
pub struct SegmentBuilder {
    toc: u32,
    incomplete: bool,
    objects: Vec<ObjectEntry>,
    raw_data: Vec<RawEntry>,
}

impl Default for SegmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentBuilder {
    /// A segment with metadata that replaces the object list.
    pub fn new() -> Self {
        Self::with_toc(TableOfContents::METADATA | TableOfContents::NEW_OBJECT_LIST)
    }

    /// A segment with metadata that adds to the previous object list.
    pub fn append_objects() -> Self {
        Self::with_toc(TableOfContents::METADATA)
    }

    /// A segment without metadata, reusing the previous object list.
    pub fn raw_data_only() -> Self {
        Self::with_toc(0)
    }

    fn with_toc(toc: u32) -> Self {
        Self {
            toc,
            incomplete: false,
            objects: Vec::new(),
            raw_data: Vec::new(),
        }
    }

    pub fn big_endian(mut self) -> Self {
        self.toc |= TableOfContents::BIG_ENDIAN;
        self
    }

    pub fn interleaved(mut self) -> Self {
        self.toc |= TableOfContents::INTERLEAVED;
        self
    }

    /// Marks the segment as never finished by its writer.
    pub fn incomplete(mut self) -> Self {
        self.incomplete = true;
        self
    }

    /// Adds an object without raw data.
    pub fn object(mut self, path: &str) -> Self {
        self.objects.push(ObjectEntry {
            path: path.to_owned(),
            index: IndexEntry::None,
            properties: Vec::new(),
        });
        self
    }

    /// Adds a property to the most recently added object.
    pub fn property(mut self, name: &str, value: PropertyValue) -> Self {
        if let Some(object) = self.objects.last_mut() {
            object.properties.push(Property {
                name: name.to_owned(),
                value,
            });
        }
        self
    }

    /// Adds a channel whose values are all written in a single chunk.
    pub fn channel(self, path: &str, values: TdmsValues) -> Self {
        let length = values.len();
        self.chunked_channel(path, values, length)
    }

    /// Adds a channel whose values are split into chunks of `chunk_length`.
    pub fn chunked_channel(mut self, path: &str, values: TdmsValues, chunk_length: usize) -> Self {
        self.objects.push(ObjectEntry {
            path: path.to_owned(),
            index: IndexEntry::Explicit {
                data_type: values.data_type(),
                number_of_values: chunk_length as u64,
            },
            properties: Vec::new(),
        });
        self.raw_data.push(RawEntry {
            values,
            chunk_length,
        });
        self
    }

    /// Adds a channel whose raw data index claims `number_of_values` per chunk,
    /// regardless of how many `values` are actually written.
    pub fn channel_claiming(mut self, path: &str, values: TdmsValues, number_of_values: u64) -> Self {
        self.objects.push(ObjectEntry {
            path: path.to_owned(),
            index: IndexEntry::Explicit {
                data_type: values.data_type(),
                number_of_values,
            },
            properties: Vec::new(),
        });
        self.values(values)
    }

    /// Adds a channel stating its raw data index is unchanged from the previous segment.
    pub fn channel_same_index(mut self, path: &str, values: TdmsValues) -> Self {
        self.objects.push(ObjectEntry {
            path: path.to_owned(),
            index: IndexEntry::SameAsPrevious,
            properties: Vec::new(),
        });
        self.values(values)
    }

    /// Adds raw data for a channel already in the object list.
    pub fn values(mut self, values: TdmsValues) -> Self {
        let chunk_length = values.len();
        self.raw_data.push(RawEntry {
            values,
            chunk_length,
        });
        self
    }

    fn big_endian_data(&self) -> bool {
        self.toc & TableOfContents::BIG_ENDIAN != 0
    }

    fn encode_metadata(&self) -> Vec<u8> {
        let big_endian = self.big_endian_data();
        let mut out = Vec::new();
        macro_rules! put {
            ($value:expr) => {
                if big_endian {
                    out.extend($value.to_be_bytes())
                } else {
                    out.extend($value.to_le_bytes())
                }
            };
        }
        macro_rules! put_string {
            ($value:expr) => {{
                let string: &str = $value;
                put!(string.len() as u32);
                out.extend(string.as_bytes());
            }};
        }

        put!(self.objects.len() as u32);
        for object in &self.objects {
            put_string!(&object.path);
            match object.index {
                IndexEntry::None => put!(NO_RAW_DATA),
                IndexEntry::SameAsPrevious => put!(SAME_AS_PREVIOUS),
                IndexEntry::Explicit {
                    data_type,
                    number_of_values,
                } => {
                    // Index length, type, dimension, count
                    put!(20u32);
                    put!(data_type.code());
                    put!(1u32);
                    put!(number_of_values);
                }
            }
            put!(object.properties.len() as u32);
            for property in &object.properties {
                put_string!(&property.name);
                match &property.value {
                    PropertyValue::Int(value) => {
                        put!(DataType::I64.code());
                        put!(*value);
                    }
                    PropertyValue::UInt(value) => {
                        put!(DataType::U64.code());
                        put!(*value);
                    }
                    PropertyValue::Float(value) => {
                        put!(DataType::F64.code());
                        put!(*value);
                    }
                    PropertyValue::Bool(value) => {
                        put!(DataType::Boolean.code());
                        out.push(u8::from(*value));
                    }
                    PropertyValue::String(value) => {
                        put!(DataType::String.code());
                        put_string!(value);
                    }
                    PropertyValue::Timestamp(value) => {
                        put!(DataType::Timestamp.code());
                        encode_timestamp(value, big_endian, &mut out);
                    }
                }
            }
        }
        out
    }

    fn encode_raw_data(&self) -> Vec<u8> {
        let big_endian = self.big_endian_data();
        let mut out = Vec::new();
        if self.toc & TableOfContents::INTERLEAVED != 0 {
            let rows = self
                .raw_data
                .iter()
                .map(|entry| entry.values.len())
                .max()
                .unwrap_or_default();
            for row in 0..rows {
                for entry in &self.raw_data {
                    entry.values.encode(row, row + 1, big_endian, &mut out);
                }
            }
        } else {
            let chunks = self
                .raw_data
                .iter()
                .filter(|entry| entry.chunk_length != 0)
                .map(|entry| entry.values.len().div_ceil(entry.chunk_length))
                .max()
                .unwrap_or_default();
            for chunk in 0..chunks {
                for entry in &self.raw_data {
                    let start = chunk * entry.chunk_length;
                    entry
                        .values
                        .encode(start, start + entry.chunk_length, big_endian, &mut out);
                }
            }
        }
        out
    }

    /// Encodes the lead-in, metadata and raw data of the segment.
    pub fn build(self) -> Vec<u8> {
        let metadata = if self.toc & TableOfContents::METADATA != 0 {
            self.encode_metadata()
        } else {
            Vec::new()
        };
        let raw_data = self.encode_raw_data();
        let mut toc = self.toc;
        if !raw_data.is_empty() {
            toc |= TableOfContents::RAW_DATA;
        }

        let raw_data_offset = metadata.len() as u64;
        let next_segment_offset = if self.incomplete {
            u64::MAX
        } else {
            raw_data_offset + raw_data.len() as u64
        };

        let mut out = b"TDSm".to_vec();
        out.extend(toc.to_le_bytes());
        if self.big_endian_data() {
            out.extend(VERSION.to_be_bytes());
            out.extend(next_segment_offset.to_be_bytes());
            out.extend(raw_data_offset.to_be_bytes());
        } else {
            out.extend(VERSION.to_le_bytes());
            out.extend(next_segment_offset.to_le_bytes());
            out.extend(raw_data_offset.to_le_bytes());
        }
        out.extend(metadata);
        out.extend(raw_data);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_quoted() {
        assert_eq!(channel_path("SCData", "CHANNEL_05"), "/'SCData'/'CHANNEL_05'");
        assert_eq!(group_path("it's"), "/'it''s'");
    }

    #[test]
    fn lead_in_layout() {
        let bytes = SegmentBuilder::new()
            .channel("/'g'/'a'", TdmsValues::U8(vec![1, 2, 3]))
            .build();
        assert_eq!(&bytes[..4], b"TDSm");
        let toc = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        assert_ne!(toc & TableOfContents::RAW_DATA, 0);
        assert_eq!(u32::from_le_bytes(bytes[8..12].try_into().unwrap()), VERSION);
        let next = u64::from_le_bytes(bytes[12..20].try_into().unwrap());
        let raw = u64::from_le_bytes(bytes[20..28].try_into().unwrap());
        assert_eq!(next as usize, bytes.len() - 28);
        assert_eq!(next - raw, 3);
        assert_eq!(&bytes[bytes.len() - 3..], &[1, 2, 3]);
    }

    #[test]
    fn chunks_alternate_channels() {
        let bytes = SegmentBuilder::raw_data_only()
            .values(TdmsValues::U8(vec![1, 2]))
            .values(TdmsValues::U8(vec![3, 4]))
            .build();
        assert_eq!(&bytes[28..], &[1, 2, 3, 4]);

        let bytes = SegmentBuilder::new()
            .chunked_channel("/'g'/'a'", TdmsValues::U8(vec![1, 2]), 1)
            .chunked_channel("/'g'/'b'", TdmsValues::U8(vec![3, 4]), 1)
            .build();
        assert_eq!(&bytes[bytes.len() - 4..], &[1, 3, 2, 4]);
    }
}
