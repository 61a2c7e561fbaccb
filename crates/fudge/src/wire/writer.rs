//! The streaming binary writer.
//!
//! Framing is length-prefixed, so sub-message payloads are assembled in a
//! stack of child buffers and prefixed once their size is known; whole-field
//! writes of message values take the same path recursively. Envelope totals
//! are precomputed by [`crate::wire::size`].

use std::io::Write;
use std::sync::Arc;

use fudge_buffers::Writer as BufWriter;

use crate::error::FudgeError;
use crate::message::{Field, FudgeMsg};
use crate::message::msg::MAX_NAME_LENGTH;
use crate::taxonomy::Taxonomy;
use crate::types::dictionary::SUB_MESSAGE_TYPE_ID;
use crate::types::{FieldValue, TypeDictionary};
use crate::wire::prefix::{var_width_for, FieldPrefix};
use crate::wire::size::effective_name_ordinal;

/// An open sub-message frame: its header waits for the payload size.
struct OpenFrame {
    name: Option<String>,
    ordinal: Option<i16>,
    buf: BufWriter,
}

/// The streaming writer over a binary transport.
///
/// The writer owns its transport and releases it exactly once on [`close`];
/// double-close is a no-op. The writer never mutates the messages it is
/// given.
///
/// [`close`]: FudgeStreamWriter::close
pub struct FudgeStreamWriter<W: Write> {
    transport: Option<W>,
    dictionary: TypeDictionary,
    taxonomy: Option<Arc<Taxonomy>>,
    frames: Vec<OpenFrame>,
}

impl<W: Write> FudgeStreamWriter<W> {
    pub fn new(dictionary: TypeDictionary, transport: W) -> Self {
        Self {
            transport: Some(transport),
            dictionary,
            taxonomy: None,
            frames: Vec::new(),
        }
    }

    /// Sets the taxonomy used for name → ordinal substitution on subsequent
    /// fields.
    pub fn set_taxonomy(&mut self, taxonomy: Option<Arc<Taxonomy>>) {
        self.taxonomy = taxonomy;
    }

    /// Writes the 8-byte envelope header. The total length covers the header
    /// itself plus the whole payload and must be precomputed.
    pub fn write_envelope_header(
        &mut self,
        processing_directives: u8,
        schema_version: u8,
        taxonomy_id: i16,
        total_length: i32,
    ) -> Result<(), FudgeError> {
        if !self.frames.is_empty() {
            return Err(FudgeError::framing(
                0,
                "envelope header inside an open sub-message",
            ));
        }
        if total_length < 8 {
            return Err(FudgeError::CapacityExceeded(format!(
                "envelope total length {total_length} cannot cover its own header"
            )));
        }
        let mut header = BufWriter::with_capacity(8);
        header.u8(processing_directives);
        header.u8(schema_version);
        header.i16(taxonomy_id);
        header.i32(total_length);
        self.sink(header.as_slice())
    }

    /// Writes one field, recursing into message values.
    pub fn write_field(&mut self, field: &Field) -> Result<(), FudgeError> {
        let mut out = BufWriter::new();
        encode_field(&mut out, field, &self.dictionary, self.taxonomy.as_deref())?;
        self.sink(out.as_slice())
    }

    /// Opens a sub-message field; its header is written when the matching
    /// [`write_submessage_end`] closes it.
    ///
    /// [`write_submessage_end`]: FudgeStreamWriter::write_submessage_end
    pub fn write_submessage_start(
        &mut self,
        name: Option<&str>,
        ordinal: Option<i16>,
    ) -> Result<(), FudgeError> {
        self.frames.push(OpenFrame {
            name: name.map(str::to_owned),
            ordinal,
            buf: BufWriter::new(),
        });
        Ok(())
    }

    /// Closes the innermost sub-message frame, framing its buffered payload
    /// into the parent.
    pub fn write_submessage_end(&mut self) -> Result<(), FudgeError> {
        let frame = self.frames.pop().ok_or_else(|| {
            FudgeError::framing(0, "sub-message end without a matching start")
        })?;
        let mut out = BufWriter::new();
        let payload = frame.buf.into_vec();
        encode_field_header(
            &mut out,
            SUB_MESSAGE_TYPE_ID,
            frame.name.as_deref(),
            frame.ordinal,
            None,
            payload.len() as u64,
            self.taxonomy.as_deref(),
        )?;
        out.buf(&payload);
        self.sink(out.as_slice())
    }

    /// Flushes the underlying transport.
    pub fn flush(&mut self) -> Result<(), FudgeError> {
        if let Some(t) = self.transport.as_mut() {
            t.flush()?;
        }
        Ok(())
    }

    /// Flushes and releases the underlying transport. Safe to call more than
    /// once.
    pub fn close(&mut self) -> Result<(), FudgeError> {
        if !self.frames.is_empty() {
            self.frames.clear();
            self.transport.take();
            return Err(FudgeError::framing(
                0,
                "stream closed with open sub-message frames",
            ));
        }
        if let Some(mut t) = self.transport.take() {
            t.flush()?;
        }
        Ok(())
    }

    /// Returns the underlying transport, if not yet closed.
    pub fn into_inner(mut self) -> Option<W> {
        self.transport.take()
    }

    fn sink(&mut self, bytes: &[u8]) -> Result<(), FudgeError> {
        if let Some(frame) = self.frames.last_mut() {
            frame.buf.buf(bytes);
            return Ok(());
        }
        let transport = self
            .transport
            .as_mut()
            .ok_or_else(|| FudgeError::framing(0, "write on a closed stream"))?;
        transport.write_all(bytes)?;
        Ok(())
    }
}

/// Encodes a whole field: header plus payload.
pub(crate) fn encode_field(
    out: &mut BufWriter,
    field: &Field,
    dictionary: &TypeDictionary,
    taxonomy: Option<&Taxonomy>,
) -> Result<(), FudgeError> {
    let (name, ordinal) = effective_name_ordinal(field, taxonomy);
    let mut payload = BufWriter::new();
    encode_value(&mut payload, field.value(), dictionary, taxonomy)?;
    let fixed_size = dictionary
        .get(field.type_id())
        .and_then(|wt| wt.fixed_size);
    if let Some(size) = fixed_size {
        if payload.len() != size as usize {
            return Err(FudgeError::TypeMismatch(format!(
                "payload of {} bytes does not match the fixed {size}-byte width of type {}",
                payload.len(),
                field.type_id()
            )));
        }
    }
    encode_field_header(
        out,
        field.type_id(),
        name,
        ordinal,
        fixed_size,
        payload.len() as u64,
        None,
    )?;
    out.buf(payload.as_slice());
    Ok(())
}

/// Encodes a field header: prefix byte, type id, ordinal, name and the
/// payload-length field. When `taxonomy` is given, name → ordinal
/// substitution is applied first.
fn encode_field_header(
    out: &mut BufWriter,
    type_id: u8,
    name: Option<&str>,
    ordinal: Option<i16>,
    fixed_size: Option<u32>,
    payload_len: u64,
    taxonomy: Option<&Taxonomy>,
) -> Result<(), FudgeError> {
    let (name, ordinal) = match (name, ordinal, taxonomy) {
        (Some(n), None, Some(t)) => match t.ordinal_of(n) {
            Some(sub) => (None, Some(sub)),
            None => (Some(n), None),
        },
        other => (other.0, other.1),
    };
    if payload_len > u32::MAX as u64 {
        return Err(FudgeError::CapacityExceeded(format!(
            "payload of {payload_len} bytes overflows the 4-byte length field"
        )));
    }
    let var_width = if fixed_size.is_some() {
        0
    } else {
        var_width_for(payload_len)
    };
    let prefix = FieldPrefix {
        fixed_width: false,
        has_ordinal: ordinal.is_some(),
        has_name: name.is_some(),
        var_width,
    };
    out.u8(prefix.encode());
    out.u8(type_id);
    if let Some(ordinal) = ordinal {
        out.i16(ordinal);
    }
    if let Some(name) = name {
        if name.len() > MAX_NAME_LENGTH {
            return Err(FudgeError::CapacityExceeded(format!(
                "field name of {} bytes exceeds the {MAX_NAME_LENGTH}-byte wire limit",
                name.len()
            )));
        }
        out.u8(name.len() as u8);
        out.utf8(name);
    }
    match var_width {
        0 => {}
        1 => out.u8(payload_len as u8),
        2 => out.u16(payload_len as u16),
        _ => out.u32(payload_len as u32),
    }
    Ok(())
}

/// Encodes a value's payload bytes.
fn encode_value(
    out: &mut BufWriter,
    value: &FieldValue,
    dictionary: &TypeDictionary,
    taxonomy: Option<&Taxonomy>,
) -> Result<(), FudgeError> {
    match value {
        FieldValue::Indicator => {}
        FieldValue::Boolean(v) => out.u8(u8::from(*v)),
        FieldValue::Byte(v) => out.i8(*v),
        FieldValue::Short(v) => out.i16(*v),
        FieldValue::Int(v) => out.i32(*v),
        FieldValue::Long(v) => out.i64(*v),
        FieldValue::Float(v) => out.f32(*v),
        FieldValue::Double(v) => out.f64(*v),
        FieldValue::Bytes(data) => out.buf(data),
        FieldValue::Str(s) => {
            out.utf8(s);
        }
        FieldValue::ShortArray(data) => {
            for v in data {
                out.i16(*v);
            }
        }
        FieldValue::IntArray(data) => {
            for v in data {
                out.i32(*v);
            }
        }
        FieldValue::LongArray(data) => {
            for v in data {
                out.i64(*v);
            }
        }
        FieldValue::FloatArray(data) => {
            for v in data {
                out.f32(*v);
            }
        }
        FieldValue::DoubleArray(data) => {
            for v in data {
                out.f64(*v);
            }
        }
        FieldValue::Message(msg) => encode_message(out, msg, dictionary, taxonomy)?,
        FieldValue::Date(v) => out.i32(v.to_packed()),
        FieldValue::Time(v) => out.u64(v.to_packed()),
        FieldValue::DateTime(v) => {
            out.i32(v.date.to_packed());
            out.u64(v.time.to_packed());
        }
        FieldValue::Unknown { bytes, .. } => out.buf(bytes),
    }
    Ok(())
}

/// Encodes every field of a message body.
pub(crate) fn encode_message(
    out: &mut BufWriter,
    msg: &FudgeMsg,
    dictionary: &TypeDictionary,
    taxonomy: Option<&Taxonomy>,
) -> Result<(), FudgeError> {
    for field in msg.iter() {
        encode_field(out, field, dictionary, taxonomy)?;
    }
    Ok(())
}
