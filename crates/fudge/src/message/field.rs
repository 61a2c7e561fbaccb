//! A single field of a message.

use crate::types::FieldValue;

/// An immutable field record: a wire type id, a value, and an optional name
/// and/or ordinal. Fields with neither name nor ordinal are legal.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    type_id: u8,
    value: FieldValue,
    name: Option<String>,
    ordinal: Option<i16>,
}

impl Field {
    pub fn new(
        type_id: u8,
        value: FieldValue,
        name: Option<String>,
        ordinal: Option<i16>,
    ) -> Self {
        Self {
            type_id,
            value,
            name,
            ordinal,
        }
    }

    pub fn type_id(&self) -> u8 {
        self.type_id
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Mutable access for in-place taxonomy recursion; fields stay immutable
    /// to callers outside the crate.
    pub(crate) fn value_mut(&mut self) -> &mut FieldValue {
        &mut self.value
    }

    pub fn into_value(self) -> FieldValue {
        self.value
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn ordinal(&self) -> Option<i16> {
        self.ordinal
    }

    /// Returns a copy of this field carrying the given name; used when a
    /// taxonomy recovers the name for an ordinal-only field.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            type_id: self.type_id,
            value: self.value.clone(),
            name: Some(name.into()),
            ordinal: self.ordinal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_name_keeps_everything_else() {
        let field = Field::new(4, FieldValue::Int(7), None, Some(9));
        let named = field.with_name("price");
        assert_eq!(named.name(), Some("price"));
        assert_eq!(named.ordinal(), Some(9));
        assert_eq!(named.type_id(), 4);
        assert_eq!(named.value(), &FieldValue::Int(7));
    }
}
