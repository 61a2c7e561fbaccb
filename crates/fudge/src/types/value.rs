//! The value variant carried by every field.

use std::fmt;

use crate::datetime::{FudgeDate, FudgeDateTime, FudgeTime};
use crate::message::FudgeMsg;

/// A field payload, spanning every standard wire type plus opaque payloads
/// preserved for unknown type ids.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Present-but-null; zero bytes on the wire.
    Indicator,
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// Byte array; the wire type narrows to a fixed-length id when the length
    /// matches one.
    Bytes(Vec<u8>),
    Str(String),
    ShortArray(Vec<i16>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
    FloatArray(Vec<f32>),
    DoubleArray(Vec<f64>),
    /// A nested message.
    Message(FudgeMsg),
    Date(FudgeDate),
    Time(FudgeTime),
    DateTime(FudgeDateTime),
    /// Payload of a wire type this process cannot interpret, preserved so the
    /// field round-trips byte-for-byte.
    Unknown { type_id: u8, bytes: Vec<u8> },
}

impl FieldValue {
    /// The integral value when this is one of the four integer types.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Byte(v) => Some(*v as i64),
            FieldValue::Short(v) => Some(*v as i64),
            FieldValue::Int(v) => Some(*v as i64),
            FieldValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// The floating-point value when this is a float or double.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v as f64),
            FieldValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&FudgeMsg> {
        match self {
            FieldValue::Message(msg) => Some(msg),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Indicator => write!(f, "indicator"),
            FieldValue::Boolean(v) => write!(f, "{v}"),
            FieldValue::Byte(v) => write!(f, "{v}"),
            FieldValue::Short(v) => write!(f, "{v}"),
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Long(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Double(v) => write!(f, "{v}"),
            FieldValue::Bytes(data) => write!(f, "byte[{}]", data.len()),
            FieldValue::Str(s) => write!(f, "{s}"),
            FieldValue::ShortArray(data) => write!(f, "{data:?}"),
            FieldValue::IntArray(data) => write!(f, "{data:?}"),
            FieldValue::LongArray(data) => write!(f, "{data:?}"),
            FieldValue::FloatArray(data) => write!(f, "{data:?}"),
            FieldValue::DoubleArray(data) => write!(f, "{data:?}"),
            FieldValue::Message(_) => write!(f, "submessage"),
            FieldValue::Date(v) => write!(f, "{v}"),
            FieldValue::Time(v) => write!(f, "{v}"),
            FieldValue::DateTime(v) => write!(f, "{v}"),
            FieldValue::Unknown { type_id, bytes } => {
                write!(f, "unknown(type={}, {} bytes)", type_id, bytes.len())
            }
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<i8> for FieldValue {
    fn from(v: i8) -> Self {
        FieldValue::Byte(v)
    }
}

impl From<i16> for FieldValue {
    fn from(v: i16) -> Self {
        FieldValue::Short(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Long(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::Float(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Double(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        FieldValue::Bytes(v)
    }
}

impl From<Vec<i16>> for FieldValue {
    fn from(v: Vec<i16>) -> Self {
        FieldValue::ShortArray(v)
    }
}

impl From<Vec<i32>> for FieldValue {
    fn from(v: Vec<i32>) -> Self {
        FieldValue::IntArray(v)
    }
}

impl From<Vec<i64>> for FieldValue {
    fn from(v: Vec<i64>) -> Self {
        FieldValue::LongArray(v)
    }
}

impl From<Vec<f32>> for FieldValue {
    fn from(v: Vec<f32>) -> Self {
        FieldValue::FloatArray(v)
    }
}

impl From<Vec<f64>> for FieldValue {
    fn from(v: Vec<f64>) -> Self {
        FieldValue::DoubleArray(v)
    }
}

impl From<FudgeMsg> for FieldValue {
    fn from(v: FudgeMsg) -> Self {
        FieldValue::Message(v)
    }
}

impl From<FudgeDate> for FieldValue {
    fn from(v: FudgeDate) -> Self {
        FieldValue::Date(v)
    }
}

impl From<FudgeTime> for FieldValue {
    fn from(v: FudgeTime) -> Self {
        FieldValue::Time(v)
    }
}

impl From<FudgeDateTime> for FieldValue {
    fn from(v: FudgeDateTime) -> Self {
        FieldValue::DateTime(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_accessor_spans_the_four_widths() {
        assert_eq!(FieldValue::Byte(-3).as_i64(), Some(-3));
        assert_eq!(FieldValue::Short(300).as_i64(), Some(300));
        assert_eq!(FieldValue::Int(70_000).as_i64(), Some(70_000));
        assert_eq!(FieldValue::Long(1 << 40).as_i64(), Some(1 << 40));
        assert_eq!(FieldValue::Str("5".into()).as_i64(), None);
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(FieldValue::Indicator.to_string(), "indicator");
        assert_eq!(FieldValue::Bytes(vec![0; 20]).to_string(), "byte[20]");
        assert_eq!(
            FieldValue::Unknown {
                type_id: 200,
                bytes: vec![1, 2, 3]
            }
            .to_string(),
            "unknown(type=200, 3 bytes)"
        );
    }
}
