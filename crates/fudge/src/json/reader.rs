//! Pull parser over the JSON rendering.
//!
//! Produces the same event sequence as the binary stream reader. Two
//! lookahead queues expand arrays into repeated fields without consuming the
//! document out of order: a field-name queue and a value queue. Envelope
//! metadata keys are recognized by name during the initial key scan; the
//! first non-envelope key encountered is pushed into the name queue so field
//! ordering is preserved.

use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::{Map, Number, Value};

use crate::context::FudgeContext;
use crate::error::FudgeError;
use crate::json::settings::JsonSettings;
use crate::message::{Envelope, FudgeMsg};
use crate::taxonomy::Taxonomy;
use crate::types::{FieldValue, WireType};
use crate::wire::reader::StreamElement;

/// One object being walked: its map, its keys in document order, and the
/// scan position.
struct ObjFrame {
    map: Map<String, Value>,
    keys: Vec<String>,
    idx: usize,
}

impl ObjFrame {
    fn new(map: Map<String, Value>) -> Self {
        let keys = map.keys().cloned().collect();
        Self { map, keys, idx: 0 }
    }

    fn exhausted(&self) -> bool {
        self.idx >= self.keys.len()
    }
}

/// A reader that interprets a JSON document as a Fudge stream.
pub struct FudgeJsonStreamReader {
    context: FudgeContext,
    settings: JsonSettings,
    root: Option<Map<String, Value>>,
    object_stack: Vec<ObjFrame>,
    field_lookahead: VecDeque<String>,
    value_lookahead: VecDeque<Value>,

    current_element: Option<StreamElement>,
    field_name: Option<String>,
    field_ordinal: Option<i16>,
    field_value: Option<FieldValue>,
    processing_directives: u8,
    schema_version: u8,
    taxonomy_id: i16,
    taxonomy: Option<Arc<Taxonomy>>,
}

impl FudgeJsonStreamReader {
    /// Parses a JSON document for reading. The top level must be an object.
    pub fn new(context: FudgeContext, text: &str) -> Result<Self, FudgeError> {
        let settings = context.json_settings().clone();
        Self::with_settings(context, settings, text)
    }

    pub fn with_settings(
        context: FudgeContext,
        settings: JsonSettings,
        text: &str,
    ) -> Result<Self, FudgeError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| FudgeError::InvalidJson(e.to_string()))?;
        let root = match value {
            Value::Object(map) => map,
            other => {
                return Err(FudgeError::InvalidJson(format!(
                    "a message must be a json object, got {other}"
                )))
            }
        };
        Ok(Self {
            context,
            settings,
            root: Some(root),
            object_stack: Vec::new(),
            field_lookahead: VecDeque::new(),
            value_lookahead: VecDeque::new(),
            current_element: None,
            field_name: None,
            field_ordinal: None,
            field_value: None,
            processing_directives: 0,
            schema_version: 0,
            taxonomy_id: 0,
            taxonomy: None,
        })
    }

    /// Whether another stream element is available.
    pub fn has_next(&mut self) -> bool {
        if self.current_element.is_none() {
            return self.root.is_some();
        }
        if self.object_stack.is_empty() {
            // Nothing left on the stack: the message fragment has ended.
            self.current_element = None;
            false
        } else {
            true
        }
    }

    /// Decodes and returns the next stream element.
    pub fn next(&mut self) -> Result<StreamElement, FudgeError> {
        if self.object_stack.is_empty() {
            let root = self
                .root
                .take()
                .ok_or_else(|| FudgeError::InvalidJson("no message left in input".to_owned()))?;
            let mut frame = ObjFrame::new(root);
            let mut directives = 0;
            let mut version = 0;
            let mut taxonomy_id = 0;
            while !frame.exhausted() {
                let key = frame.keys[frame.idx].clone();
                frame.idx += 1;
                if key == self.settings.processing_directives_field {
                    directives = integer_value(frame.map.get(&key)) as u8;
                } else if key == self.settings.schema_version_field {
                    version = integer_value(frame.map.get(&key)) as u8;
                } else if key == self.settings.taxonomy_field {
                    taxonomy_id = integer_value(frame.map.get(&key)) as i16;
                } else {
                    self.field_lookahead.push_back(key);
                    break;
                }
            }
            self.processing_directives = directives;
            self.schema_version = version;
            self.taxonomy_id = taxonomy_id;
            self.taxonomy = self.context.taxonomy(taxonomy_id);
            self.object_stack.push(frame);
            self.check_message_end();
            return Ok(self.emit(StreamElement::MessageEnvelope));
        }
        let top_has_more = !self.object_stack.last().expect("open object").exhausted();
        if top_has_more || !self.field_lookahead.is_empty() {
            let key = match self.field_lookahead.pop_front() {
                Some(key) => key,
                None => {
                    let top = self.object_stack.last_mut().expect("open object");
                    let key = top.keys[top.idx].clone();
                    top.idx += 1;
                    key
                }
            };
            self.set_current_field_name(&key);
            let (value, from_lookahead) = match self.value_lookahead.pop_front() {
                Some(value) => (value, true),
                None => {
                    let top = self.object_stack.last().expect("open object");
                    (top.map.get(&key).cloned().unwrap_or(Value::Null), false)
                }
            };
            match value {
                Value::Null => self.field_value = Some(FieldValue::Indicator),
                Value::Bool(b) => self.field_value = Some(FieldValue::Boolean(b)),
                Value::Number(n) => self.field_value = Some(number_value(&n)),
                Value::String(s) => self.field_value = Some(FieldValue::Str(s)),
                Value::Object(map) => {
                    self.object_stack.push(ObjFrame::new(map));
                    return Ok(self.emit(StreamElement::SubmessageFieldStart));
                }
                Value::Array(arr) => match array_to_primitive(&arr) {
                    Some(primitive) => self.field_value = Some(primitive),
                    None if from_lookahead => {
                        // The array came out of a repeated-field expansion and
                        // still is not a primitive array: keep its JSON source.
                        self.field_value = Some(FieldValue::Str(Value::Array(arr).to_string()));
                    }
                    None => {
                        for element in arr {
                            self.field_lookahead.push_back(key.clone());
                            self.value_lookahead.push_back(element);
                        }
                        return self.next();
                    }
                },
            }
            self.check_message_end();
            Ok(self.emit(StreamElement::SimpleField))
        } else {
            self.object_stack.pop();
            self.check_message_end();
            self.field_name = None;
            self.field_ordinal = None;
            self.field_value = None;
            Ok(self.emit(StreamElement::SubmessageFieldEnd))
        }
    }

    pub fn current_element(&self) -> Option<StreamElement> {
        self.current_element
    }

    pub fn field_name(&self) -> Option<&str> {
        self.field_name.as_deref()
    }

    pub fn field_ordinal(&self) -> Option<i16> {
        self.field_ordinal
    }

    /// Wire type of the current field value, resolved through the context's
    /// dictionary.
    pub fn field_type(&self) -> Option<WireType> {
        self.field_value
            .as_ref()
            .map(|v| self.context.dictionary().by_value(v))
    }

    pub fn field_value(&self) -> Option<&FieldValue> {
        self.field_value.as_ref()
    }

    pub fn take_field_value(&mut self) -> Option<FieldValue> {
        self.field_value.take()
    }

    pub fn processing_directives(&self) -> u8 {
        self.processing_directives
    }

    pub fn schema_version(&self) -> u8 {
        self.schema_version
    }

    pub fn taxonomy_id(&self) -> i16 {
        self.taxonomy_id
    }

    /// Reads the whole document as an envelope, reassembling the message
    /// tree. Integer values narrow exactly as they would on a binary encode,
    /// and taxonomy names are filled in when the taxonomy resolves.
    pub fn read_envelope(&mut self) -> Result<Envelope, FudgeError> {
        match self.next()? {
            StreamElement::MessageEnvelope => {}
            other => {
                return Err(FudgeError::InvalidJson(format!(
                    "expected a message envelope, got {other:?}"
                )))
            }
        }
        let mut stack: Vec<(Option<String>, Option<i16>, FudgeMsg)> =
            vec![(None, None, FudgeMsg::new())];
        while !self.object_stack.is_empty() {
            match self.next()? {
                StreamElement::SimpleField => {
                    let value = self.field_value.take().ok_or_else(|| {
                        FudgeError::InvalidJson("simple field event carried no value".to_owned())
                    })?;
                    let name = self.field_name.clone();
                    let ordinal = self.field_ordinal;
                    let (_, _, msg) = stack.last_mut().expect("open message");
                    msg.add_full(name.as_deref(), ordinal, value)?;
                }
                StreamElement::SubmessageFieldStart => {
                    stack.push((self.field_name.clone(), self.field_ordinal, FudgeMsg::new()));
                }
                StreamElement::SubmessageFieldEnd => {
                    let (name, ordinal, sub) = stack.pop().expect("open sub-message");
                    let (_, _, parent) = stack.last_mut().ok_or_else(|| {
                        FudgeError::InvalidJson("sub-message end without a parent".to_owned())
                    })?;
                    parent.add_full(name.as_deref(), ordinal, FieldValue::Message(sub))?;
                }
                StreamElement::MessageEnvelope => {
                    return Err(FudgeError::InvalidJson(
                        "nested message envelope inside a message".to_owned(),
                    ))
                }
            }
        }
        let (_, _, mut root) = stack.pop().expect("root message");
        if let Some(taxonomy) = &self.taxonomy {
            root.set_names_from_taxonomy(taxonomy);
        }
        Ok(Envelope::full(
            root,
            self.schema_version,
            self.processing_directives,
            self.taxonomy_id,
        ))
    }

    fn emit(&mut self, element: StreamElement) -> StreamElement {
        self.current_element = Some(element);
        element
    }

    /// An empty key is an anonymous field; a key parsing as a 16-bit integer
    /// is an ordinal; anything else is a name.
    fn set_current_field_name(&mut self, key: &str) {
        if key.is_empty() {
            self.field_name = None;
            self.field_ordinal = None;
        } else if let Ok(ordinal) = key.parse::<i16>() {
            self.field_name = None;
            self.field_ordinal = Some(ordinal);
        } else {
            self.field_name = Some(key.to_owned());
            self.field_ordinal = None;
        }
    }

    /// Pops the root object once its keys and the name queue are spent, so
    /// the stream ends cleanly after the last field.
    fn check_message_end(&mut self) {
        if self.object_stack.len() == 1
            && self.object_stack[0].exhausted()
            && self.field_lookahead.is_empty()
        {
            self.object_stack.pop();
        }
    }
}

fn integer_value(value: Option<&Value>) -> i64 {
    value.and_then(Value::as_i64).unwrap_or(0)
}

fn number_value(n: &Number) -> FieldValue {
    if let Some(i) = n.as_i64() {
        FieldValue::Long(i)
    } else {
        FieldValue::Double(n.as_f64().unwrap_or(0.0))
    }
}

/// Recognizes a JSON array of homogeneous numbers as the narrowest primitive
/// array (int → long → double). Any non-number element disqualifies it.
fn array_to_primitive(arr: &[Value]) -> Option<FieldValue> {
    let mut fits_int = true;
    let mut fits_long = true;
    for element in arr {
        match element {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    if i32::try_from(i).is_err() {
                        fits_int = false;
                    }
                } else {
                    fits_int = false;
                    fits_long = false;
                }
            }
            _ => return None,
        }
    }
    if fits_int {
        Some(FieldValue::IntArray(
            arr.iter()
                .map(|v| v.as_i64().unwrap_or(0) as i32)
                .collect(),
        ))
    } else if fits_long {
        Some(FieldValue::LongArray(
            arr.iter().map(|v| v.as_i64().unwrap_or(0)).collect(),
        ))
    } else {
        Some(FieldValue::DoubleArray(
            arr.iter().map(|v| v.as_f64().unwrap_or(0.0)).collect(),
        ))
    }
}
