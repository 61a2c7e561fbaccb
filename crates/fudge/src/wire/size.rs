//! Size precomputation.
//!
//! Framing is length-prefixed, so a sub-message's encoded size must be known
//! before the containing field prefix can be written, and the envelope header
//! carries the total length up front. Sizes depend on the taxonomy in force:
//! substituting an ordinal for a name changes a field's header size.

use crate::message::{Field, FudgeMsg};
use crate::taxonomy::Taxonomy;
use crate::types::{FieldValue, TypeDictionary};
use crate::wire::prefix::var_width_for;

/// The envelope header is always eight bytes.
pub const ENVELOPE_HEADER_SIZE: u64 = 8;

/// The name and ordinal a field will actually carry on the wire.
///
/// With a taxonomy in force, a field that has a name, no ordinal, and an
/// unambiguous taxonomy mapping for that name is transmitted as the ordinal
/// alone.
pub fn effective_name_ordinal<'a>(
    field: &'a Field,
    taxonomy: Option<&Taxonomy>,
) -> (Option<&'a str>, Option<i16>) {
    if field.ordinal().is_none() {
        if let (Some(name), Some(taxonomy)) = (field.name(), taxonomy) {
            if let Some(ordinal) = taxonomy.ordinal_of(name) {
                return (None, Some(ordinal));
            }
        }
    }
    (field.name(), field.ordinal())
}

/// Encoded size of a value's payload, excluding any field header.
pub fn payload_size(
    value: &FieldValue,
    dictionary: &TypeDictionary,
    taxonomy: Option<&Taxonomy>,
) -> u64 {
    match value {
        FieldValue::Indicator => 0,
        FieldValue::Boolean(_) | FieldValue::Byte(_) => 1,
        FieldValue::Short(_) => 2,
        FieldValue::Int(_) | FieldValue::Float(_) => 4,
        FieldValue::Long(_) | FieldValue::Double(_) => 8,
        FieldValue::Bytes(data) => data.len() as u64,
        FieldValue::Str(s) => s.len() as u64,
        FieldValue::ShortArray(data) => data.len() as u64 * 2,
        FieldValue::IntArray(data) => data.len() as u64 * 4,
        FieldValue::LongArray(data) => data.len() as u64 * 8,
        FieldValue::FloatArray(data) => data.len() as u64 * 4,
        FieldValue::DoubleArray(data) => data.len() as u64 * 8,
        FieldValue::Message(msg) => message_size(msg, dictionary, taxonomy),
        FieldValue::Date(_) => 4,
        FieldValue::Time(_) => 8,
        FieldValue::DateTime(_) => 12,
        FieldValue::Unknown { bytes, .. } => bytes.len() as u64,
    }
}

/// Encoded size of a field: prefix, type id, ordinal, name, payload-length
/// field and payload.
pub fn field_size(field: &Field, dictionary: &TypeDictionary, taxonomy: Option<&Taxonomy>) -> u64 {
    let (name, ordinal) = effective_name_ordinal(field, taxonomy);
    let payload = payload_size(field.value(), dictionary, taxonomy);
    let fixed = dictionary
        .get(field.type_id())
        .and_then(|wt| wt.fixed_size)
        .is_some();
    let mut size = 2 + payload; // prefix byte + type id
    if ordinal.is_some() {
        size += 2;
    }
    if let Some(name) = name {
        size += 1 + name.len() as u64;
    }
    if !fixed {
        size += var_width_for(payload) as u64;
    }
    size
}

/// Encoded size of a message body: the sum of its field sizes.
pub fn message_size(
    msg: &FudgeMsg,
    dictionary: &TypeDictionary,
    taxonomy: Option<&Taxonomy>,
) -> u64 {
    msg.iter()
        .map(|field| field_size(field, dictionary, taxonomy))
        .sum()
}

/// Total envelope length, including the eight header bytes.
pub fn envelope_size(
    msg: &FudgeMsg,
    dictionary: &TypeDictionary,
    taxonomy: Option<&Taxonomy>,
) -> u64 {
    ENVELOPE_HEADER_SIZE + message_size(msg, dictionary, taxonomy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_message_is_header_only() {
        let dict = TypeDictionary::new();
        assert_eq!(envelope_size(&FudgeMsg::new(), &dict, None), 8);
    }

    #[test]
    fn named_indicator_field_sizes_to_fifteen() {
        let dict = TypeDictionary::new();
        let mut msg = FudgeMsg::new();
        msg.add("flag", FieldValue::Indicator).unwrap();
        // prefix + type + nameLen + "flag" = 7, plus the 8-byte header
        assert_eq!(envelope_size(&msg, &dict, None), 15);
    }

    #[test]
    fn variable_fields_count_their_length_field() {
        let dict = TypeDictionary::new();
        let mut msg = FudgeMsg::new();
        msg.add("s", "hello").unwrap();
        // prefix + type + nameLen + "s" + len byte + 5 payload bytes
        assert_eq!(message_size(&msg, &dict, None), 10);
    }

    #[test]
    fn taxonomy_substitution_shrinks_the_header() {
        let dict = TypeDictionary::new();
        let taxonomy = Taxonomy::new([(7, "price".to_owned())]);
        let mut msg = FudgeMsg::new();
        msg.add("price", 1i64).unwrap();
        // Named: prefix + type + nameLen + 5 name bytes + 1 payload.
        assert_eq!(message_size(&msg, &dict, None), 9);
        // Substituted: prefix + type + 2 ordinal bytes + 1 payload.
        assert_eq!(message_size(&msg, &dict, Some(&taxonomy)), 5);
    }

    #[test]
    fn submessage_size_includes_nested_headers() {
        let dict = TypeDictionary::new();
        let mut inner = FudgeMsg::new();
        inner.add("b", true).unwrap();
        let mut outer = FudgeMsg::new();
        outer.add("sub", inner).unwrap();
        // Inner field: prefix + type + nameLen + "b" + 1 payload = 5.
        // Outer field: prefix + type + nameLen + "sub" + 1 len byte + 5 = 12.
        assert_eq!(message_size(&outer, &dict, None), 12);
    }
}
