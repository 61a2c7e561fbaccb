//! The mutable message container.

use crate::error::FudgeError;
use crate::message::field::Field;
use crate::taxonomy::Taxonomy;
use crate::types::dictionary::standard_type_of;
use crate::types::FieldValue;

/// A message may hold at most this many fields (short-count ceiling).
pub const MAX_FIELDS: usize = i16::MAX as usize;

/// A field name is length-prefixed by a single byte on the wire.
pub const MAX_NAME_LENGTH: usize = u8::MAX as usize;

/// An ordered sequence of fields.
///
/// A message is not a map: duplicate names and duplicate ordinals are legal
/// and order is preserved through encode and decode. Mutation is not
/// thread-safe; a published message is safe for concurrent reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FudgeMsg {
    fields: Vec<Field>,
}

impl FudgeMsg {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Adds a named field, resolving and narrowing the value's wire type.
    pub fn add(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), FudgeError> {
        self.add_full(Some(name), None, value.into())
    }

    /// Adds an ordinal-only field.
    pub fn add_ordinal(
        &mut self,
        ordinal: i16,
        value: impl Into<FieldValue>,
    ) -> Result<(), FudgeError> {
        self.add_full(None, Some(ordinal), value.into())
    }

    /// Adds a field with any combination of name and ordinal.
    ///
    /// Integer values are adjusted to the narrowest standard integer type
    /// that losslessly represents them; byte arrays take the matching
    /// fixed-length wire type when one exists.
    pub fn add_full(
        &mut self,
        name: Option<&str>,
        ordinal: Option<i16>,
        value: FieldValue,
    ) -> Result<(), FudgeError> {
        let value = match value {
            FieldValue::Short(v) => narrow_integer(v as i64),
            FieldValue::Int(v) => narrow_integer(v as i64),
            FieldValue::Long(v) => narrow_integer(v),
            other => other,
        };
        let type_id = standard_type_of(&value).id;
        self.add_field(Field::new(type_id, value, name.map(str::to_owned), ordinal))
    }

    /// Adds a pre-built field without re-resolving its type, preserving
    /// whatever wire type it was decoded with.
    pub fn add_field(&mut self, field: Field) -> Result<(), FudgeError> {
        if self.fields.len() >= MAX_FIELDS {
            return Err(FudgeError::CapacityExceeded(format!(
                "a message may hold at most {MAX_FIELDS} fields"
            )));
        }
        if let Some(name) = field.name() {
            if name.len() > MAX_NAME_LENGTH {
                return Err(FudgeError::CapacityExceeded(format!(
                    "field name of {} bytes exceeds the {MAX_NAME_LENGTH}-byte wire limit",
                    name.len()
                )));
            }
        }
        self.fields.push(field);
        Ok(())
    }

    /// First field with the given name.
    pub fn by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == Some(name))
    }

    /// First field with the given ordinal.
    pub fn by_ordinal(&self, ordinal: i16) -> Option<&Field> {
        self.fields.iter().find(|f| f.ordinal() == Some(ordinal))
    }

    /// Every field with the given name, in message order.
    pub fn all_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Field> {
        self.fields.iter().filter(move |f| f.name() == Some(name))
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.by_name(name).and_then(|f| f.value().as_i64())
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.by_name(name).and_then(|f| f.value().as_f64())
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.by_name(name).and_then(|f| f.value().as_str())
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.by_name(name).and_then(|f| f.value().as_bool())
    }

    pub fn get_message(&self, name: &str) -> Option<&FudgeMsg> {
        self.by_name(name).and_then(|f| f.value().as_message())
    }

    /// Removes every field with the given name.
    pub fn remove_by_name(&mut self, name: &str) {
        self.fields.retain(|f| f.name() != Some(name));
    }

    /// Removes every field with the given ordinal.
    pub fn remove_by_ordinal(&mut self, ordinal: i16) {
        self.fields.retain(|f| f.ordinal() != Some(ordinal));
    }

    /// Removes every field matching both the given name and ordinal.
    pub fn remove(&mut self, name: Option<&str>, ordinal: Option<i16>) {
        self.fields
            .retain(|f| !(f.name() == name && f.ordinal() == ordinal));
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Fills in names for ordinal-only fields from the taxonomy, recursing
    /// into sub-messages.
    pub fn set_names_from_taxonomy(&mut self, taxonomy: &Taxonomy) {
        for field in &mut self.fields {
            if field.name().is_none() {
                if let Some(ordinal) = field.ordinal() {
                    if let Some(name) = taxonomy.name_of(ordinal) {
                        *field = field.with_name(name);
                    }
                }
            }
            if let FieldValue::Message(sub) = field.value_mut() {
                sub.set_names_from_taxonomy(taxonomy);
            }
        }
    }
}

/// Narrows an integral value to the smallest standard integer variant whose
/// range contains it.
fn narrow_integer(v: i64) -> FieldValue {
    if (i8::MIN as i64..=i8::MAX as i64).contains(&v) {
        FieldValue::Byte(v as i8)
    } else if (i16::MIN as i64..=i16::MAX as i64).contains(&v) {
        FieldValue::Short(v as i16)
    } else if (i32::MIN as i64..=i32::MAX as i64).contains(&v) {
        FieldValue::Int(v as i32)
    } else {
        FieldValue::Long(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::dictionary::{
        BYTE_ARRAY_4_TYPE_ID, BYTE_ARRAY_TYPE_ID, BYTE_TYPE_ID, INT_TYPE_ID, LONG_TYPE_ID,
        SHORT_TYPE_ID,
    };

    #[test]
    fn integers_narrow_on_add() {
        let vectors: [(i64, u8); 11] = [
            (0, BYTE_TYPE_ID),
            (1, BYTE_TYPE_ID),
            (-1, BYTE_TYPE_ID),
            (127, BYTE_TYPE_ID),
            (128, SHORT_TYPE_ID),
            (-128, BYTE_TYPE_ID),
            (-129, SHORT_TYPE_ID),
            (32767, SHORT_TYPE_ID),
            (32768, INT_TYPE_ID),
            ((1 << 31) - 1, INT_TYPE_ID),
            (1 << 31, LONG_TYPE_ID),
        ];
        for (value, expected_type) in vectors {
            let mut msg = FudgeMsg::new();
            msg.add("v", value).unwrap();
            let field = msg.by_name("v").unwrap();
            assert_eq!(field.type_id(), expected_type, "value {value}");
            assert_eq!(field.value().as_i64(), Some(value), "value {value}");
        }
    }

    #[test]
    fn short_and_int_inputs_narrow_too() {
        let mut msg = FudgeMsg::new();
        msg.add("a", 5i16).unwrap();
        msg.add("b", 5i32).unwrap();
        assert_eq!(msg.by_name("a").unwrap().type_id(), BYTE_TYPE_ID);
        assert_eq!(msg.by_name("b").unwrap().type_id(), BYTE_TYPE_ID);
    }

    #[test]
    fn byte_arrays_narrow_to_fixed_types() {
        let mut msg = FudgeMsg::new();
        msg.add("fixed", vec![0u8; 4]).unwrap();
        msg.add("var", vec![0u8; 5]).unwrap();
        assert_eq!(msg.by_name("fixed").unwrap().type_id(), BYTE_ARRAY_4_TYPE_ID);
        assert_eq!(msg.by_name("var").unwrap().type_id(), BYTE_ARRAY_TYPE_ID);
    }

    #[test]
    fn duplicate_names_are_legal_and_ordered() {
        let mut msg = FudgeMsg::new();
        msg.add("x", 1i64).unwrap();
        msg.add("x", "two").unwrap();
        msg.add("x", 3i64).unwrap();
        let values: Vec<_> = msg.all_by_name("x").map(|f| f.value().clone()).collect();
        assert_eq!(
            values,
            vec![
                FieldValue::Byte(1),
                FieldValue::Str("two".into()),
                FieldValue::Byte(3)
            ]
        );
    }

    #[test]
    fn long_names_are_rejected() {
        let mut msg = FudgeMsg::new();
        let name = "n".repeat(256);
        let err = msg.add(&name, 1i64).unwrap_err();
        assert!(matches!(err, FudgeError::CapacityExceeded(_)));
    }

    #[test]
    fn removers_match_name_and_ordinal() {
        let mut msg = FudgeMsg::new();
        msg.add_full(Some("a"), Some(1), FieldValue::Int(1)).unwrap();
        msg.add_full(Some("a"), Some(2), FieldValue::Int(2)).unwrap();
        msg.add_full(Some("b"), Some(1), FieldValue::Int(3)).unwrap();
        msg.remove(Some("a"), Some(1));
        assert_eq!(msg.len(), 2);
        msg.remove_by_name("a");
        assert_eq!(msg.len(), 1);
        msg.remove_by_ordinal(1);
        assert!(msg.is_empty());
    }

    #[test]
    fn taxonomy_names_fill_recursively() {
        let taxonomy = Taxonomy::new([(7, "price".to_owned()), (8, "inner".to_owned())]);
        let mut sub = FudgeMsg::new();
        sub.add_ordinal(7, 42i64).unwrap();
        let mut msg = FudgeMsg::new();
        msg.add_ordinal(8, sub).unwrap();
        msg.set_names_from_taxonomy(&taxonomy);
        let outer = msg.by_ordinal(8).unwrap();
        assert_eq!(outer.name(), Some("inner"));
        let inner = outer.value().as_message().unwrap().by_ordinal(7).unwrap();
        assert_eq!(inner.name(), Some("price"));
    }

    #[test]
    fn named_fields_keep_their_name_over_taxonomy() {
        let taxonomy = Taxonomy::new([(7, "price".to_owned())]);
        let mut msg = FudgeMsg::new();
        msg.add_full(Some("bid"), Some(7), FieldValue::Int(1)).unwrap();
        msg.set_names_from_taxonomy(&taxonomy);
        assert_eq!(msg.by_ordinal(7).unwrap().name(), Some("bid"));
    }
}
