use crate::error::{TdmsError, TdmsResult};

/// The TDMS data types this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum DataType {
    #[strum(to_string = "void")]
    Void,
    #[strum(to_string = "i8")]
    I8,
    #[strum(to_string = "i16")]
    I16,
    #[strum(to_string = "i32")]
    I32,
    #[strum(to_string = "i64")]
    I64,
    #[strum(to_string = "u8")]
    U8,
    #[strum(to_string = "u16")]
    U16,
    #[strum(to_string = "u32")]
    U32,
    #[strum(to_string = "u64")]
    U64,
    #[strum(to_string = "f32")]
    F32,
    #[strum(to_string = "f64")]
    F64,
    #[strum(to_string = "f32 (with unit)")]
    F32WithUnit,
    #[strum(to_string = "f64 (with unit)")]
    F64WithUnit,
    #[strum(to_string = "string")]
    String,
    #[strum(to_string = "bool")]
    Boolean,
    #[strum(to_string = "timestamp")]
    Timestamp,
}

impl DataType {
    pub(crate) const DAQMX_RAW_DATA: u32 = 0xFFFF_FFFF;

    pub fn from_code(code: u32) -> TdmsResult<Self> {
        Ok(match code {
            0x00 => Self::Void,
            0x01 => Self::I8,
            0x02 => Self::I16,
            0x03 => Self::I32,
            0x04 => Self::I64,
            0x05 => Self::U8,
            0x06 => Self::U16,
            0x07 => Self::U32,
            0x08 => Self::U64,
            0x09 => Self::F32,
            0x0A => Self::F64,
            0x19 => Self::F32WithUnit,
            0x1A => Self::F64WithUnit,
            0x20 => Self::String,
            0x21 => Self::Boolean,
            0x44 => Self::Timestamp,
            _ => return Err(TdmsError::UnknownDataType(code)),
        })
    }

    pub fn code(&self) -> u32 {
        match self {
            Self::Void => 0x00,
            Self::I8 => 0x01,
            Self::I16 => 0x02,
            Self::I32 => 0x03,
            Self::I64 => 0x04,
            Self::U8 => 0x05,
            Self::U16 => 0x06,
            Self::U32 => 0x07,
            Self::U64 => 0x08,
            Self::F32 => 0x09,
            Self::F64 => 0x0A,
            Self::F32WithUnit => 0x19,
            Self::F64WithUnit => 0x1A,
            Self::String => 0x20,
            Self::Boolean => 0x21,
            Self::Timestamp => 0x44,
        }
    }

    /// Size in bytes of one stored value, `None` for variable-length and void types.
    pub fn size(&self) -> Option<u64> {
        match self {
            Self::Void | Self::String => None,
            Self::I8 | Self::U8 | Self::Boolean => Some(1),
            Self::I16 | Self::U16 => Some(2),
            Self::I32 | Self::U32 | Self::F32 | Self::F32WithUnit => Some(4),
            Self::I64 | Self::U64 | Self::F64 | Self::F64WithUnit => Some(8),
            Self::Timestamp => Some(16),
        }
    }
}
