//! Wire type ids and the type dictionary.
//!
//! Ids 0..=31 are reserved for the standard types below. The dictionary is a
//! per-context registry: standard ids are pre-registered, applications may
//! register additional ids (32..=255) so the reader can size and skip fields
//! it cannot interpret.

use crate::error::FudgeError;
use crate::types::value::FieldValue;

pub const INDICATOR_TYPE_ID: u8 = 0;
pub const BOOLEAN_TYPE_ID: u8 = 1;
pub const BYTE_TYPE_ID: u8 = 2;
pub const SHORT_TYPE_ID: u8 = 3;
pub const INT_TYPE_ID: u8 = 4;
pub const LONG_TYPE_ID: u8 = 5;
pub const FLOAT_TYPE_ID: u8 = 6;
pub const DOUBLE_TYPE_ID: u8 = 7;
pub const BYTE_ARRAY_4_TYPE_ID: u8 = 8;
pub const BYTE_ARRAY_8_TYPE_ID: u8 = 9;
pub const BYTE_ARRAY_16_TYPE_ID: u8 = 10;
pub const BYTE_ARRAY_20_TYPE_ID: u8 = 11;
pub const BYTE_ARRAY_32_TYPE_ID: u8 = 12;
pub const BYTE_ARRAY_64_TYPE_ID: u8 = 13;
pub const BYTE_ARRAY_128_TYPE_ID: u8 = 14;
pub const BYTE_ARRAY_TYPE_ID: u8 = 15;
pub const STRING_TYPE_ID: u8 = 16;
pub const SHORT_ARRAY_TYPE_ID: u8 = 17;
pub const INT_ARRAY_TYPE_ID: u8 = 18;
pub const LONG_ARRAY_TYPE_ID: u8 = 19;
pub const FLOAT_ARRAY_TYPE_ID: u8 = 20;
pub const SUB_MESSAGE_TYPE_ID: u8 = 21;
pub const DOUBLE_ARRAY_TYPE_ID: u8 = 22;
pub const FUDGE_MSG_WITH_ID_TYPE_ID: u8 = 23;
pub const DATE_TYPE_ID: u8 = 24;
pub const TIME_TYPE_ID: u8 = 25;
pub const DATETIME_TYPE_ID: u8 = 26;
pub const BYTE_ARRAY_256_TYPE_ID: u8 = 27;
pub const BYTE_ARRAY_512_TYPE_ID: u8 = 28;

/// Highest id reserved for standard types.
pub const LAST_RESERVED_TYPE_ID: u8 = 31;

/// The fixed byte-array lengths and their wire type ids, narrowest first.
const FIXED_BYTE_ARRAYS: [(usize, u8); 9] = [
    (4, BYTE_ARRAY_4_TYPE_ID),
    (8, BYTE_ARRAY_8_TYPE_ID),
    (16, BYTE_ARRAY_16_TYPE_ID),
    (20, BYTE_ARRAY_20_TYPE_ID),
    (32, BYTE_ARRAY_32_TYPE_ID),
    (64, BYTE_ARRAY_64_TYPE_ID),
    (128, BYTE_ARRAY_128_TYPE_ID),
    (256, BYTE_ARRAY_256_TYPE_ID),
    (512, BYTE_ARRAY_512_TYPE_ID),
];

/// A registered wire type: an 8-bit id plus, for fixed-width types, the
/// implied payload size in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireType {
    pub id: u8,
    pub fixed_size: Option<u32>,
}

impl WireType {
    pub const fn fixed(id: u8, size: u32) -> Self {
        Self {
            id,
            fixed_size: Some(size),
        }
    }

    pub const fn variable(id: u8) -> Self {
        Self {
            id,
            fixed_size: None,
        }
    }

    pub fn is_fixed_width(&self) -> bool {
        self.fixed_size.is_some()
    }
}

/// Registry of wire types for one context.
#[derive(Debug, Clone)]
pub struct TypeDictionary {
    types: [Option<WireType>; 256],
}

impl Default for TypeDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeDictionary {
    /// Creates a dictionary with the standard types registered.
    pub fn new() -> Self {
        let mut types = [None; 256];
        let standard = [
            WireType::fixed(INDICATOR_TYPE_ID, 0),
            WireType::fixed(BOOLEAN_TYPE_ID, 1),
            WireType::fixed(BYTE_TYPE_ID, 1),
            WireType::fixed(SHORT_TYPE_ID, 2),
            WireType::fixed(INT_TYPE_ID, 4),
            WireType::fixed(LONG_TYPE_ID, 8),
            WireType::fixed(FLOAT_TYPE_ID, 4),
            WireType::fixed(DOUBLE_TYPE_ID, 8),
            WireType::variable(BYTE_ARRAY_TYPE_ID),
            WireType::variable(STRING_TYPE_ID),
            WireType::variable(SHORT_ARRAY_TYPE_ID),
            WireType::variable(INT_ARRAY_TYPE_ID),
            WireType::variable(LONG_ARRAY_TYPE_ID),
            WireType::variable(FLOAT_ARRAY_TYPE_ID),
            WireType::variable(DOUBLE_ARRAY_TYPE_ID),
            WireType::variable(SUB_MESSAGE_TYPE_ID),
            WireType::variable(FUDGE_MSG_WITH_ID_TYPE_ID),
            WireType::fixed(DATE_TYPE_ID, 4),
            WireType::fixed(TIME_TYPE_ID, 8),
            WireType::fixed(DATETIME_TYPE_ID, 12),
        ];
        for wt in standard {
            types[wt.id as usize] = Some(wt);
        }
        for (len, id) in FIXED_BYTE_ARRAYS {
            types[id as usize] = Some(WireType::fixed(id, len as u32));
        }
        Self { types }
    }

    /// Looks up a wire type by id.
    pub fn get(&self, type_id: u8) -> Option<WireType> {
        self.types[type_id as usize]
    }

    /// Registers a non-standard wire type. Ids 0..=31 are reserved and cannot
    /// be replaced.
    pub fn register(&mut self, wire_type: WireType) -> Result<(), FudgeError> {
        if wire_type.id <= LAST_RESERVED_TYPE_ID {
            return Err(FudgeError::TypeMismatch(format!(
                "wire type id {} is reserved for standard types",
                wire_type.id
            )));
        }
        self.types[wire_type.id as usize] = Some(wire_type);
        Ok(())
    }

    /// Resolves a native value to its wire type.
    ///
    /// Byte arrays narrow to the matching fixed-length type when one exists.
    /// Unknown values keep the id they were decoded with; if that id has been
    /// registered here, the registered entry (and its fixed size) wins.
    pub fn by_value(&self, value: &FieldValue) -> WireType {
        match value {
            FieldValue::Unknown { type_id, .. } => self
                .get(*type_id)
                .unwrap_or_else(|| WireType::variable(*type_id)),
            other => standard_type_of(other),
        }
    }

    /// Chooses the narrowest fixed-length byte-array type for `len`, falling
    /// back to the variable byte-array type.
    pub fn best_match_byte_array(len: usize) -> WireType {
        for (fixed_len, id) in FIXED_BYTE_ARRAYS {
            if len == fixed_len {
                return WireType::fixed(id, fixed_len as u32);
            }
        }
        WireType::variable(BYTE_ARRAY_TYPE_ID)
    }
}

/// Resolves a standard value to its wire type without consulting a registry.
///
/// Every variant except `Unknown` maps to a standard type; `Unknown` keeps
/// its decoded id and is treated as variable width.
pub fn standard_type_of(value: &FieldValue) -> WireType {
    match value {
        FieldValue::Indicator => WireType::fixed(INDICATOR_TYPE_ID, 0),
        FieldValue::Boolean(_) => WireType::fixed(BOOLEAN_TYPE_ID, 1),
        FieldValue::Byte(_) => WireType::fixed(BYTE_TYPE_ID, 1),
        FieldValue::Short(_) => WireType::fixed(SHORT_TYPE_ID, 2),
        FieldValue::Int(_) => WireType::fixed(INT_TYPE_ID, 4),
        FieldValue::Long(_) => WireType::fixed(LONG_TYPE_ID, 8),
        FieldValue::Float(_) => WireType::fixed(FLOAT_TYPE_ID, 4),
        FieldValue::Double(_) => WireType::fixed(DOUBLE_TYPE_ID, 8),
        FieldValue::Bytes(data) => TypeDictionary::best_match_byte_array(data.len()),
        FieldValue::Str(_) => WireType::variable(STRING_TYPE_ID),
        FieldValue::ShortArray(_) => WireType::variable(SHORT_ARRAY_TYPE_ID),
        FieldValue::IntArray(_) => WireType::variable(INT_ARRAY_TYPE_ID),
        FieldValue::LongArray(_) => WireType::variable(LONG_ARRAY_TYPE_ID),
        FieldValue::FloatArray(_) => WireType::variable(FLOAT_ARRAY_TYPE_ID),
        FieldValue::DoubleArray(_) => WireType::variable(DOUBLE_ARRAY_TYPE_ID),
        FieldValue::Message(_) => WireType::variable(SUB_MESSAGE_TYPE_ID),
        FieldValue::Date(_) => WireType::fixed(DATE_TYPE_ID, 4),
        FieldValue::Time(_) => WireType::fixed(TIME_TYPE_ID, 8),
        FieldValue::DateTime(_) => WireType::fixed(DATETIME_TYPE_ID, 12),
        FieldValue::Unknown { type_id, .. } => WireType::variable(*type_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_ids_are_registered() {
        let dict = TypeDictionary::new();
        assert_eq!(dict.get(INT_TYPE_ID), Some(WireType::fixed(4, 4)));
        assert_eq!(dict.get(STRING_TYPE_ID), Some(WireType::variable(16)));
        assert_eq!(dict.get(DATETIME_TYPE_ID), Some(WireType::fixed(26, 12)));
        assert_eq!(dict.get(200), None);
    }

    #[test]
    fn byte_array_narrowing_matches_fixed_lengths() {
        for (len, id) in FIXED_BYTE_ARRAYS {
            let wt = TypeDictionary::best_match_byte_array(len);
            assert_eq!(wt.id, id, "length {len}");
            assert_eq!(wt.fixed_size, Some(len as u32));
        }
        assert_eq!(
            TypeDictionary::best_match_byte_array(5).id,
            BYTE_ARRAY_TYPE_ID
        );
        assert_eq!(
            TypeDictionary::best_match_byte_array(0).id,
            BYTE_ARRAY_TYPE_ID
        );
        assert_eq!(
            TypeDictionary::best_match_byte_array(513).id,
            BYTE_ARRAY_TYPE_ID
        );
    }

    #[test]
    fn register_rejects_reserved_ids() {
        let mut dict = TypeDictionary::new();
        let err = dict.register(WireType::fixed(4, 4)).unwrap_err();
        assert!(matches!(err, FudgeError::TypeMismatch(_)));
        dict.register(WireType::fixed(200, 3)).unwrap();
        assert_eq!(dict.get(200), Some(WireType::fixed(200, 3)));
    }

    #[test]
    fn unknown_values_resolve_through_the_registry() {
        let mut dict = TypeDictionary::new();
        let unknown = FieldValue::Unknown {
            type_id: 200,
            bytes: vec![1, 2, 3],
        };
        assert_eq!(dict.by_value(&unknown), WireType::variable(200));
        dict.register(WireType::fixed(200, 3)).unwrap();
        assert_eq!(dict.by_value(&unknown), WireType::fixed(200, 3));
    }

    #[test]
    fn values_resolve_to_standard_types() {
        let dict = TypeDictionary::new();
        assert_eq!(dict.by_value(&FieldValue::Indicator).id, INDICATOR_TYPE_ID);
        assert_eq!(dict.by_value(&FieldValue::Long(9)).id, LONG_TYPE_ID);
        assert_eq!(
            dict.by_value(&FieldValue::Bytes(vec![0; 20])).id,
            BYTE_ARRAY_20_TYPE_ID
        );
        assert_eq!(
            dict.by_value(&FieldValue::Bytes(vec![0; 21])).id,
            BYTE_ARRAY_TYPE_ID
        );
    }
}
