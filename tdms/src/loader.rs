use crate::{error::TdmsResult, timestamp};
use scaler_common::Timestamp;
use std::{io::Read, mem::size_of};

/// Byte order of a segment's metadata and raw data.
/// The lead-in's table of contents is always little endian.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Endianness {
    #[default]
    Little,
    Big,
}

/// A fixed-size value which can be decoded from its stored bytes.
pub(crate) trait Scalar: Sized {
    /// `bytes` must be exactly `size_of::<Self>()` long.
    fn decode(bytes: &[u8], endianness: Endianness) -> Self;
}

macro_rules! impl_scalar {
    ($($ty:ty),*) => {
        $(
            impl Scalar for $ty {
                fn decode(bytes: &[u8], endianness: Endianness) -> Self {
                    let mut raw = [0u8; size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    match endianness {
                        Endianness::Little => <$ty>::from_le_bytes(raw),
                        Endianness::Big => <$ty>::from_be_bytes(raw),
                    }
                }
            }
        )*
    };
}

impl_scalar!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

const MAX_SCALAR_SIZE: usize = 8;
pub(crate) const TIMESTAMP_SIZE: usize = 16;

pub(crate) fn decode_timestamp(bytes: &[u8], endianness: Endianness) -> TdmsResult<Timestamp> {
    let (first, second) = bytes.split_at(TIMESTAMP_SIZE / 2);
    let (seconds, fractions) = match endianness {
        Endianness::Little => (i64::decode(second, endianness), u64::decode(first, endianness)),
        Endianness::Big => (i64::decode(first, endianness), u64::decode(second, endianness)),
    };
    timestamp::from_tdms(seconds, fractions)
}

/// Reads values from a segment's metadata, counting the bytes consumed.
pub(crate) struct Loader<'a, R> {
    reader: &'a mut R,
    endianness: Endianness,
    total_bytes: u64,
}

impl<'a, R: Read> Loader<'a, R> {
    pub(crate) fn new(reader: &'a mut R, endianness: Endianness) -> Self {
        Self {
            reader,
            endianness,
            total_bytes: 0,
        }
    }

    pub(crate) fn get_total_bytes(&self) -> u64 {
        self.total_bytes
    }

    fn load_bytes(&mut self, bytes: &mut [u8]) -> TdmsResult<()> {
        self.reader.read_exact(bytes)?;
        self.total_bytes += bytes.len() as u64;
        Ok(())
    }

    pub(crate) fn load<T: Scalar>(&mut self) -> TdmsResult<T> {
        let mut bytes = [0u8; MAX_SCALAR_SIZE];
        let bytes = &mut bytes[..size_of::<T>()];
        self.load_bytes(bytes)?;
        Ok(T::decode(bytes, self.endianness))
    }

    pub(crate) fn load_bool(&mut self) -> TdmsResult<bool> {
        Ok(self.load::<u8>()? != 0)
    }

    pub(crate) fn load_string(&mut self) -> TdmsResult<String> {
        let size = self.load::<u32>()?;
        let mut string_bytes = vec![0; size as usize];
        self.load_bytes(&mut string_bytes)?;
        Ok(String::from_utf8(string_bytes)?)
    }

    pub(crate) fn load_timestamp(&mut self) -> TdmsResult<Timestamp> {
        let mut bytes = [0u8; TIMESTAMP_SIZE];
        self.load_bytes(&mut bytes)?;
        decode_timestamp(&bytes, self.endianness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn little_endian_scalars() {
        let mut bytes = Vec::new();
        bytes.extend(7u32.to_le_bytes());
        bytes.extend((-3i64).to_le_bytes());
        bytes.extend(2.5f64.to_le_bytes());
        let mut cursor = Cursor::new(bytes);
        let mut loader = Loader::new(&mut cursor, Endianness::Little);
        assert_eq!(loader.load::<u32>().unwrap(), 7);
        assert_eq!(loader.load::<i64>().unwrap(), -3);
        assert_eq!(loader.load::<f64>().unwrap(), 2.5);
        assert_eq!(loader.get_total_bytes(), 20);
    }

    #[test]
    fn big_endian_scalars() {
        let mut bytes = Vec::new();
        bytes.extend(0x0102u16.to_be_bytes());
        bytes.extend((-9i32).to_be_bytes());
        let mut cursor = Cursor::new(bytes);
        let mut loader = Loader::new(&mut cursor, Endianness::Big);
        assert_eq!(loader.load::<u16>().unwrap(), 0x0102);
        assert_eq!(loader.load::<i32>().unwrap(), -9);
    }

    #[test]
    fn string() {
        let mut bytes = Vec::new();
        bytes.extend(5u32.to_le_bytes());
        bytes.extend(b"SCData");
        let mut cursor = Cursor::new(bytes);
        let mut loader = Loader::new(&mut cursor, Endianness::Little);
        assert_eq!(loader.load_string().unwrap(), "SCDat");
        assert_eq!(loader.get_total_bytes(), 9);
    }

    #[test]
    fn truncated_input_is_an_error() {
        let mut cursor = Cursor::new(vec![1u8, 2]);
        let mut loader = Loader::new(&mut cursor, Endianness::Little);
        assert!(loader.load::<u32>().is_err());
    }

    #[test]
    fn timestamp_byte_order() {
        let mut little = Vec::new();
        little.extend((1u64 << 63).to_le_bytes());
        little.extend(2_082_844_800i64.to_le_bytes());
        let mut big = Vec::new();
        big.extend(2_082_844_800i64.to_be_bytes());
        big.extend((1u64 << 63).to_be_bytes());

        let from_little = decode_timestamp(&little, Endianness::Little).unwrap();
        let from_big = decode_timestamp(&big, Endianness::Big).unwrap();
        assert_eq!(from_little, from_big);
        assert_eq!(from_little.timestamp(), 0);
        assert_eq!(from_little.timestamp_subsec_nanos(), 500_000_000);
    }
}
