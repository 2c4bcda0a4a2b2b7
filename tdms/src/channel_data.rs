use crate::{
    data_type::DataType,
    error::{TdmsError, TdmsResult},
    loader::{Endianness, Scalar, TIMESTAMP_SIZE, decode_timestamp},
};
use scaler_common::Timestamp;
use std::{fmt::Display, mem::size_of};

/// The materialized samples of one channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelData {
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
    /// A channel declared in the metadata which never had raw data.
    Empty,
}

fn extend_scalars<T: Scalar>(values: &mut Vec<T>, bytes: &[u8], endianness: Endianness) {
    values.extend(
        bytes
            .chunks_exact(size_of::<T>())
            .map(|raw| T::decode(raw, endianness)),
    );
}

/// Formats the first and last `edge` values, eliding the middle of long sequences.
fn summarise<T: Display>(values: &[T], edge: usize) -> String {
    let format = |values: &[T]| {
        values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    if values.len() <= 2 * edge {
        format!("[{}]", format(values))
    } else {
        let (head, _) = values.split_at(edge);
        let (_, tail) = values.split_at(values.len() - edge);
        format!("[{}, ..., {}]", format(head), format(tail))
    }
}

impl ChannelData {
    pub(crate) fn with_capacity(data_type: DataType, capacity: usize) -> TdmsResult<Self> {
        Ok(match data_type {
            DataType::I8 => Self::I8(Vec::with_capacity(capacity)),
            DataType::I16 => Self::I16(Vec::with_capacity(capacity)),
            DataType::I32 => Self::I32(Vec::with_capacity(capacity)),
            DataType::I64 => Self::I64(Vec::with_capacity(capacity)),
            DataType::U8 => Self::U8(Vec::with_capacity(capacity)),
            DataType::U16 => Self::U16(Vec::with_capacity(capacity)),
            DataType::U32 => Self::U32(Vec::with_capacity(capacity)),
            DataType::U64 => Self::U64(Vec::with_capacity(capacity)),
            DataType::F32 | DataType::F32WithUnit => Self::F32(Vec::with_capacity(capacity)),
            DataType::F64 | DataType::F64WithUnit => Self::F64(Vec::with_capacity(capacity)),
            DataType::Boolean => Self::Bool(Vec::with_capacity(capacity)),
            DataType::Timestamp => Self::Timestamp(Vec::with_capacity(capacity)),
            DataType::Void | DataType::String => {
                return Err(TdmsError::UnsupportedDataType(data_type));
            }
        })
    }

    /// Appends values decoded from contiguous stored bytes.
    pub(crate) fn extend_from_bytes(
        &mut self,
        bytes: &[u8],
        endianness: Endianness,
    ) -> TdmsResult<()> {
        match self {
            Self::I8(values) => extend_scalars(values, bytes, endianness),
            Self::I16(values) => extend_scalars(values, bytes, endianness),
            Self::I32(values) => extend_scalars(values, bytes, endianness),
            Self::I64(values) => extend_scalars(values, bytes, endianness),
            Self::U8(values) => extend_scalars(values, bytes, endianness),
            Self::U16(values) => extend_scalars(values, bytes, endianness),
            Self::U32(values) => extend_scalars(values, bytes, endianness),
            Self::U64(values) => extend_scalars(values, bytes, endianness),
            Self::F32(values) => extend_scalars(values, bytes, endianness),
            Self::F64(values) => extend_scalars(values, bytes, endianness),
            Self::Bool(values) => values.extend(bytes.iter().map(|byte| *byte != 0)),
            Self::Timestamp(values) => {
                for raw in bytes.chunks_exact(TIMESTAMP_SIZE) {
                    values.push(decode_timestamp(raw, endianness)?);
                }
            }
            Self::Empty => {
                if !bytes.is_empty() {
                    return Err(TdmsError::UnsupportedDataType(DataType::Void));
                }
            }
        }
        Ok(())
    }

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
            Self::Empty => DataType::Void,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::I8(values) => values.len(),
            Self::I16(values) => values.len(),
            Self::I32(values) => values.len(),
            Self::I64(values) => values.len(),
            Self::U8(values) => values.len(),
            Self::U16(values) => values.len(),
            Self::U32(values) => values.len(),
            Self::U64(values) => values.len(),
            Self::F32(values) => values.len(),
            Self::F64(values) => values.len(),
            Self::Bool(values) => values.len(),
            Self::Timestamp(values) => values.len(),
            Self::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts numeric samples to `i64`.
    /// Unsigned values above `i64::MAX` saturate, floating point values are truncated
    /// towards zero (saturating, with NaN mapping to zero).
    pub fn to_i64(&self) -> TdmsResult<Vec<i64>> {
        Ok(match self {
            Self::I8(values) => values.iter().copied().map(i64::from).collect(),
            Self::I16(values) => values.iter().copied().map(i64::from).collect(),
            Self::I32(values) => values.iter().copied().map(i64::from).collect(),
            Self::I64(values) => values.clone(),
            Self::U8(values) => values.iter().copied().map(i64::from).collect(),
            Self::U16(values) => values.iter().copied().map(i64::from).collect(),
            Self::U32(values) => values.iter().copied().map(i64::from).collect(),
            Self::U64(values) => values
                .iter()
                .map(|value| i64::try_from(*value).unwrap_or(i64::MAX))
                .collect(),
            Self::F32(values) => values.iter().map(|value| *value as i64).collect(),
            Self::F64(values) => values.iter().map(|value| *value as i64).collect(),
            Self::Bool(values) => values.iter().copied().map(i64::from).collect(),
            Self::Empty => Vec::new(),
            Self::Timestamp(_) => {
                return Err(TdmsError::UnexpectedDataType {
                    data_type: self.data_type(),
                    requested: "integer",
                });
            }
        })
    }

    pub fn into_timestamps(self) -> TdmsResult<Vec<Timestamp>> {
        match self {
            Self::Timestamp(values) => Ok(values),
            Self::Empty => Ok(Vec::new()),
            other => Err(TdmsError::UnexpectedDataType {
                data_type: other.data_type(),
                requested: "timestamp",
            }),
        }
    }

    /// A short human readable rendering, showing at most `edge` values at each end.
    pub fn summary(&self, edge: usize) -> String {
        match self {
            Self::I8(values) => summarise(values, edge),
            Self::I16(values) => summarise(values, edge),
            Self::I32(values) => summarise(values, edge),
            Self::I64(values) => summarise(values, edge),
            Self::U8(values) => summarise(values, edge),
            Self::U16(values) => summarise(values, edge),
            Self::U32(values) => summarise(values, edge),
            Self::U64(values) => summarise(values, edge),
            Self::F32(values) => summarise(values, edge),
            Self::F64(values) => summarise(values, edge),
            Self::Bool(values) => summarise(values, edge),
            Self::Timestamp(values) => summarise(values, edge),
            Self::Empty => "[]".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_little_endian_u32() {
        let mut data = ChannelData::with_capacity(DataType::U32, 3).unwrap();
        let bytes: Vec<u8> = [1u32, 2, 70000]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        data.extend_from_bytes(&bytes, Endianness::Little).unwrap();
        assert_eq!(data, ChannelData::U32(vec![1, 2, 70000]));
        assert_eq!(data.to_i64().unwrap(), vec![1, 2, 70000]);
    }

    #[test]
    fn decode_big_endian_f64() {
        let mut data = ChannelData::with_capacity(DataType::F64WithUnit, 2).unwrap();
        let bytes: Vec<u8> = [1.5f64, -2.25]
            .iter()
            .flat_map(|v| v.to_be_bytes())
            .collect();
        data.extend_from_bytes(&bytes, Endianness::Big).unwrap();
        assert_eq!(data, ChannelData::F64(vec![1.5, -2.25]));
        assert_eq!(data.data_type(), DataType::F64);
        assert_eq!(data.to_i64().unwrap(), vec![1, -2]);
    }

    #[test]
    fn decode_bool() {
        let mut data = ChannelData::with_capacity(DataType::Boolean, 3).unwrap();
        data.extend_from_bytes(&[0, 1, 2], Endianness::Little).unwrap();
        assert_eq!(data.to_i64().unwrap(), vec![0, 1, 1]);
    }

    #[test]
    fn large_unsigned_saturates() {
        let data = ChannelData::U64(vec![5, u64::MAX]);
        assert_eq!(data.to_i64().unwrap(), vec![5, i64::MAX]);
    }

    #[test]
    fn timestamps_are_not_integers() {
        let data = ChannelData::Timestamp(vec![Timestamp::UNIX_EPOCH]);
        assert!(matches!(
            data.to_i64(),
            Err(TdmsError::UnexpectedDataType {
                requested: "integer",
                ..
            })
        ));
        assert_eq!(data.into_timestamps().unwrap(), vec![Timestamp::UNIX_EPOCH]);
    }

    #[test]
    fn integers_are_not_timestamps() {
        assert!(ChannelData::I32(vec![1]).into_timestamps().is_err());
    }

    #[test]
    fn strings_cannot_be_materialized() {
        assert!(matches!(
            ChannelData::with_capacity(DataType::String, 0),
            Err(TdmsError::UnsupportedDataType(DataType::String))
        ));
    }

    #[test]
    fn empty_channel_converts_to_nothing() {
        assert_eq!(ChannelData::Empty.len(), 0);
        assert_eq!(ChannelData::Empty.data_type(), DataType::Void);
        assert_eq!(ChannelData::Empty.to_i64().unwrap(), Vec::<i64>::new());
        assert!(ChannelData::Empty.into_timestamps().unwrap().is_empty());
        assert_eq!(ChannelData::Empty.summary(3), "[]");
    }

    #[test]
    fn summary_elides_middle() {
        let data = ChannelData::I64((0..10).collect());
        assert_eq!(data.summary(2), "[0, 1, ..., 8, 9]");
        let data = ChannelData::I64(vec![3, 4]);
        assert_eq!(data.summary(2), "[3, 4]");
        let data = ChannelData::U8(vec![]);
        assert_eq!(data.summary(3), "[]");
    }
}
