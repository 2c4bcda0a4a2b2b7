use crate::{
    data_type::DataType,
    error::{TdmsError, TdmsResult},
    loader::Loader,
};
use scaler_common::{TIMESTAMP_FORMAT, Timestamp};
use std::{fmt::Display, io::Read};

/// The value of a property attached to the file, a group, or a channel.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    String(String),
    Timestamp(Timestamp),
}

impl Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::UInt(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::String(value) => write!(f, "{value:?}"),
            Self::Timestamp(value) => write!(f, "{}", value.format(TIMESTAMP_FORMAT)),
        }
    }
}

/// A named property, in the order it was first written.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub value: PropertyValue,
}

/// Inserts or overwrites a property; later segments may update earlier values.
pub(crate) fn set_property(properties: &mut Vec<Property>, property: Property) {
    match properties.iter_mut().find(|p| p.name == property.name) {
        Some(existing) => existing.value = property.value,
        None => properties.push(property),
    }
}

impl<R: Read> Loader<'_, R> {
    pub(crate) fn load_property(&mut self) -> TdmsResult<Property> {
        let name = self.load_string()?;
        let data_type = DataType::from_code(self.load::<u32>()?)?;
        let value = self.load_property_value(data_type)?;
        Ok(Property { name, value })
    }

    fn load_property_value(&mut self, data_type: DataType) -> TdmsResult<PropertyValue> {
        Ok(match data_type {
            DataType::I8 => PropertyValue::Int(self.load::<i8>()?.into()),
            DataType::I16 => PropertyValue::Int(self.load::<i16>()?.into()),
            DataType::I32 => PropertyValue::Int(self.load::<i32>()?.into()),
            DataType::I64 => PropertyValue::Int(self.load::<i64>()?),
            DataType::U8 => PropertyValue::UInt(self.load::<u8>()?.into()),
            DataType::U16 => PropertyValue::UInt(self.load::<u16>()?.into()),
            DataType::U32 => PropertyValue::UInt(self.load::<u32>()?.into()),
            DataType::U64 => PropertyValue::UInt(self.load::<u64>()?),
            DataType::F32 | DataType::F32WithUnit => {
                PropertyValue::Float(self.load::<f32>()?.into())
            }
            DataType::F64 | DataType::F64WithUnit => PropertyValue::Float(self.load::<f64>()?),
            DataType::Boolean => PropertyValue::Bool(self.load_bool()?),
            DataType::String => PropertyValue::String(self.load_string()?),
            DataType::Timestamp => PropertyValue::Timestamp(self.load_timestamp()?),
            DataType::Void => return Err(TdmsError::UnsupportedDataType(data_type)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Endianness;
    use std::io::Cursor;

    fn encode_name(bytes: &mut Vec<u8>, name: &str) {
        bytes.extend((name.len() as u32).to_le_bytes());
        bytes.extend(name.as_bytes());
    }

    #[test]
    fn numeric_properties() {
        let mut bytes = Vec::new();
        encode_name(&mut bytes, "wf_increment");
        bytes.extend(DataType::F64.code().to_le_bytes());
        bytes.extend(0.5f64.to_le_bytes());
        encode_name(&mut bytes, "wf_samples");
        bytes.extend(DataType::I32.code().to_le_bytes());
        bytes.extend((-1024i32).to_le_bytes());
        encode_name(&mut bytes, "count");
        bytes.extend(DataType::U16.code().to_le_bytes());
        bytes.extend(7u16.to_le_bytes());

        let mut cursor = Cursor::new(bytes);
        let mut loader = Loader::new(&mut cursor, Endianness::Little);
        assert_eq!(
            loader.load_property().unwrap(),
            Property {
                name: "wf_increment".into(),
                value: PropertyValue::Float(0.5)
            }
        );
        assert_eq!(
            loader.load_property().unwrap().value,
            PropertyValue::Int(-1024)
        );
        assert_eq!(loader.load_property().unwrap().value, PropertyValue::UInt(7));
    }

    #[test]
    fn string_property() {
        let mut bytes = Vec::new();
        encode_name(&mut bytes, "NI_ChannelName");
        bytes.extend(DataType::String.code().to_le_bytes());
        encode_name(&mut bytes, "Kicker");

        let mut cursor = Cursor::new(bytes);
        let mut loader = Loader::new(&mut cursor, Endianness::Little);
        assert_eq!(
            loader.load_property().unwrap().value,
            PropertyValue::String("Kicker".into())
        );
    }

    #[test]
    fn unknown_property_type() {
        let mut bytes = Vec::new();
        encode_name(&mut bytes, "complex");
        bytes.extend(0x08000Cu32.to_le_bytes());

        let mut cursor = Cursor::new(bytes);
        let mut loader = Loader::new(&mut cursor, Endianness::Little);
        assert!(matches!(
            loader.load_property(),
            Err(TdmsError::UnknownDataType(0x08000C))
        ));
    }

    #[test]
    fn later_values_overwrite() {
        let mut properties = Vec::new();
        set_property(
            &mut properties,
            Property {
                name: "a".into(),
                value: PropertyValue::Int(1),
            },
        );
        set_property(
            &mut properties,
            Property {
                name: "b".into(),
                value: PropertyValue::Bool(true),
            },
        );
        set_property(
            &mut properties,
            Property {
                name: "a".into(),
                value: PropertyValue::Int(2),
            },
        );
        assert_eq!(properties.len(), 2);
        assert_eq!(properties[0].value, PropertyValue::Int(2));
    }
}
