//! Renders message trees as JSON documents.
//!
//! A message becomes a JSON object. A field's key is its name, its ordinal
//! rendered as a decimal string when only an ordinal is present, or the empty
//! string for anonymous fields. Fields repeating a key collapse into a JSON
//! array under that key (a documented equivalence: homogeneous number arrays
//! decode back as primitive-array fields, not repeated fields). Envelope
//! metadata is written under the configured keys only when non-zero.

use serde_json::{json, Map, Value};

use crate::json::settings::JsonSettings;
use crate::message::{Envelope, Field, FudgeMsg};
use crate::types::FieldValue;

/// Writer producing the JSON rendering of envelopes and messages.
#[derive(Debug, Clone, Default)]
pub struct FudgeJsonWriter {
    settings: JsonSettings,
}

impl FudgeJsonWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: JsonSettings) -> Self {
        Self { settings }
    }

    /// Renders an envelope, including its non-zero metadata.
    pub fn envelope_to_value(&self, envelope: &Envelope) -> Value {
        let mut map = Map::new();
        if envelope.processing_directives() != 0 {
            map.insert(
                self.settings.processing_directives_field.clone(),
                json!(envelope.processing_directives()),
            );
        }
        if envelope.schema_version() != 0 {
            map.insert(
                self.settings.schema_version_field.clone(),
                json!(envelope.schema_version()),
            );
        }
        if envelope.taxonomy_id() != 0 {
            map.insert(
                self.settings.taxonomy_field.clone(),
                json!(envelope.taxonomy_id()),
            );
        }
        fields_into_map(&mut map, envelope.message());
        Value::Object(map)
    }

    /// Renders a bare message.
    pub fn message_to_value(&self, msg: &FudgeMsg) -> Value {
        let mut map = Map::new();
        fields_into_map(&mut map, msg);
        Value::Object(map)
    }

    pub fn envelope_to_string(&self, envelope: &Envelope) -> String {
        self.envelope_to_value(envelope).to_string()
    }

    pub fn message_to_string(&self, msg: &FudgeMsg) -> String {
        self.message_to_value(msg).to_string()
    }
}

fn field_key(field: &Field) -> String {
    match (field.name(), field.ordinal()) {
        (Some(name), _) => name.to_owned(),
        (None, Some(ordinal)) => ordinal.to_string(),
        (None, None) => String::new(),
    }
}

fn fields_into_map(map: &mut Map<String, Value>, msg: &FudgeMsg) {
    // Keys that repeat collapse into one array entry; count first so a
    // single array-valued field stays distinguishable from a repeat.
    for field in msg.iter() {
        let key = field_key(field);
        let rendered = value_to_json(field.value());
        if let Some(Value::Array(existing)) = map.get_mut(&key) {
            existing.push(rendered);
            continue;
        }
        let repeats = msg.iter().filter(|f| field_key(f) == key).count();
        if repeats > 1 {
            map.insert(key, Value::Array(vec![rendered]));
        } else {
            map.insert(key, rendered);
        }
    }
}

fn value_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Indicator => Value::Null,
        FieldValue::Boolean(v) => json!(v),
        FieldValue::Byte(v) => json!(v),
        FieldValue::Short(v) => json!(v),
        FieldValue::Int(v) => json!(v),
        FieldValue::Long(v) => json!(v),
        FieldValue::Float(v) => json!(*v as f64),
        FieldValue::Double(v) => json!(v),
        FieldValue::Bytes(data) => Value::Array(data.iter().map(|b| json!(b)).collect()),
        FieldValue::Str(s) => json!(s),
        FieldValue::ShortArray(data) => Value::Array(data.iter().map(|v| json!(v)).collect()),
        FieldValue::IntArray(data) => Value::Array(data.iter().map(|v| json!(v)).collect()),
        FieldValue::LongArray(data) => Value::Array(data.iter().map(|v| json!(v)).collect()),
        FieldValue::FloatArray(data) => {
            Value::Array(data.iter().map(|v| json!(*v as f64)).collect())
        }
        FieldValue::DoubleArray(data) => Value::Array(data.iter().map(|v| json!(v)).collect()),
        FieldValue::Message(msg) => {
            let mut map = Map::new();
            fields_into_map(&mut map, msg);
            Value::Object(map)
        }
        FieldValue::Date(v) => json!(v.to_string()),
        FieldValue::Time(v) => json!(v.to_string()),
        FieldValue::DateTime(v) => json!(v.to_string()),
        FieldValue::Unknown { bytes, .. } => {
            Value::Array(bytes.iter().map(|b| json!(b)).collect())
        }
    }
}
