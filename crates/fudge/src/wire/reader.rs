//! The streaming binary reader.
//!
//! A pull parser: each `next()` yields one stream element, blocking on the
//! underlying transport until a whole envelope has been buffered internally
//! so that partial reads never surface mid-field. Frames are tracked as a
//! stack of remaining-byte counters; sub-message bracketing is strict LIFO.

use std::io::Read;
use std::sync::Arc;

use fudge_buffers::{BufferError, Reader as BufReader};

use crate::context::FudgeContext;
use crate::datetime::{FudgeDate, FudgeDateTime, FudgeTime};
use crate::error::FudgeError;
use crate::taxonomy::Taxonomy;
use crate::types::dictionary::{
    BOOLEAN_TYPE_ID, BYTE_ARRAY_128_TYPE_ID, BYTE_ARRAY_16_TYPE_ID, BYTE_ARRAY_20_TYPE_ID,
    BYTE_ARRAY_256_TYPE_ID, BYTE_ARRAY_32_TYPE_ID, BYTE_ARRAY_4_TYPE_ID, BYTE_ARRAY_512_TYPE_ID,
    BYTE_ARRAY_64_TYPE_ID, BYTE_ARRAY_8_TYPE_ID, BYTE_ARRAY_TYPE_ID, BYTE_TYPE_ID, DATETIME_TYPE_ID,
    DATE_TYPE_ID, DOUBLE_ARRAY_TYPE_ID, DOUBLE_TYPE_ID, FLOAT_ARRAY_TYPE_ID, FLOAT_TYPE_ID,
    FUDGE_MSG_WITH_ID_TYPE_ID, INDICATOR_TYPE_ID, INT_ARRAY_TYPE_ID, INT_TYPE_ID,
    LONG_ARRAY_TYPE_ID, LONG_TYPE_ID, SHORT_ARRAY_TYPE_ID, SHORT_TYPE_ID, STRING_TYPE_ID,
    SUB_MESSAGE_TYPE_ID, TIME_TYPE_ID,
};
use crate::types::FieldValue;
use crate::wire::prefix::FieldPrefix;
use crate::wire::size::ENVELOPE_HEADER_SIZE;

/// One element of the decoded stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamElement {
    MessageEnvelope,
    SimpleField,
    SubmessageFieldStart,
    SubmessageFieldEnd,
}

/// What one field decode produced, before the reader state is updated.
enum FieldOutcome {
    Simple {
        consumed: u64,
        type_id: u8,
        name: Option<String>,
        ordinal: Option<i16>,
        value: FieldValue,
    },
    SubmessageStart {
        header_len: u64,
        payload_len: u64,
        type_id: u8,
        name: Option<String>,
        ordinal: Option<i16>,
    },
}

/// The streaming reader over a binary transport.
///
/// The reader owns its transport and releases it exactly once on [`close`];
/// double-close is a no-op. After a `Truncated` or framing error the reader
/// is terminal for good: `has_next` answers false and `next` keeps failing.
///
/// [`close`]: FudgeStreamReader::close
pub struct FudgeStreamReader<R: Read> {
    transport: Option<R>,
    context: FudgeContext,
    /// Bytes consumed from the transport so far.
    stream_pos: u64,
    /// Current envelope payload (the 8 header bytes are never buffered here).
    buf: Vec<u8>,
    /// Whether the transport supplied the whole claimed payload.
    buf_complete: bool,
    /// Stream offset of `buf[0]`.
    base_offset: u64,
    /// Cursor within `buf`.
    x: usize,
    /// Payload length the envelope header claimed.
    claimed_len: u64,
    /// Envelope buffered but its event not yet emitted.
    envelope_ready: bool,
    /// Remaining claimed bytes per open frame; index 0 is the envelope.
    frames: Vec<u64>,
    terminal: bool,

    current_element: Option<StreamElement>,
    field_name: Option<String>,
    field_ordinal: Option<i16>,
    field_type: u8,
    field_value: Option<FieldValue>,
    processing_directives: u8,
    schema_version: u8,
    taxonomy_id: i16,
    taxonomy: Option<Arc<Taxonomy>>,
}

impl<R: Read> FudgeStreamReader<R> {
    pub fn new(context: FudgeContext, transport: R) -> Self {
        Self {
            transport: Some(transport),
            context,
            stream_pos: 0,
            buf: Vec::new(),
            buf_complete: true,
            base_offset: 0,
            x: 0,
            claimed_len: 0,
            envelope_ready: false,
            frames: Vec::new(),
            terminal: false,
            current_element: None,
            field_name: None,
            field_ordinal: None,
            field_type: INDICATOR_TYPE_ID,
            field_value: None,
            processing_directives: 0,
            schema_version: 0,
            taxonomy_id: 0,
            taxonomy: None,
        }
    }

    /// Whether another stream element is available. May block to buffer the
    /// next envelope; answers false at a clean end of stream and after any
    /// terminal error.
    pub fn has_next(&mut self) -> Result<bool, FudgeError> {
        if self.terminal {
            return Ok(false);
        }
        self.normalize_message_end();
        if self.envelope_ready || !self.frames.is_empty() {
            return Ok(true);
        }
        let res = self.try_buffer_envelope();
        if res.is_err() {
            self.terminal = true;
        }
        res
    }

    /// Decodes and returns the next stream element.
    pub fn next(&mut self) -> Result<StreamElement, FudgeError> {
        if self.terminal {
            return Err(FudgeError::Truncated {
                offset: self.offset(),
            });
        }
        let res = self.next_inner();
        if res.is_err() {
            self.terminal = true;
        }
        res
    }

    /// True while the current envelope still has elements to deliver.
    pub fn in_message(&self) -> bool {
        match self.frames.as_slice() {
            [] => false,
            [outer] => *outer != 0,
            _ => true,
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

    /// Wire type id of the current field.
    pub fn field_type(&self) -> u8 {
        self.field_type
    }

    pub fn field_value(&self) -> Option<&FieldValue> {
        self.field_value.as_ref()
    }

    /// Takes ownership of the current field's value.
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

    pub fn taxonomy(&self) -> Option<&Arc<Taxonomy>> {
        self.taxonomy.as_ref()
    }

    pub fn context(&self) -> &FudgeContext {
        &self.context
    }

    /// Releases the underlying transport. Safe to call more than once.
    pub fn close(&mut self) -> Result<(), FudgeError> {
        self.transport.take();
        Ok(())
    }

    fn offset(&self) -> u64 {
        self.base_offset + self.x as u64
    }

    /// Collapses a fully-drained envelope so the reader returns to its
    /// initial state between messages.
    fn normalize_message_end(&mut self) {
        if let [0] = self.frames.as_slice() {
            self.frames.clear();
            self.buf.clear();
            self.x = 0;
            self.current_element = None;
        }
    }

    fn next_inner(&mut self) -> Result<StreamElement, FudgeError> {
        self.normalize_message_end();
        if self.frames.is_empty() {
            if !self.envelope_ready && !self.try_buffer_envelope()? {
                return Err(FudgeError::Truncated {
                    offset: self.stream_pos,
                });
            }
            self.envelope_ready = false;
            self.frames.push(self.claimed_len);
            self.current_element = Some(StreamElement::MessageEnvelope);
            return Ok(StreamElement::MessageEnvelope);
        }
        if let Some(0) = self.frames.last().copied() {
            // An inner frame drained; the outer case was normalized above.
            self.frames.pop();
            self.field_name = None;
            self.field_ordinal = None;
            self.field_value = None;
            self.current_element = Some(StreamElement::SubmessageFieldEnd);
            return Ok(StreamElement::SubmessageFieldEnd);
        }
        match self.read_field()? {
            FieldOutcome::Simple {
                consumed,
                type_id,
                name,
                ordinal,
                value,
            } => {
                *self.frames.last_mut().expect("open frame") -= consumed;
                self.x += consumed as usize;
                self.set_field(type_id, name, ordinal);
                self.field_value = Some(value);
                self.current_element = Some(StreamElement::SimpleField);
                Ok(StreamElement::SimpleField)
            }
            FieldOutcome::SubmessageStart {
                header_len,
                payload_len,
                type_id,
                name,
                ordinal,
            } => {
                *self.frames.last_mut().expect("open frame") -= header_len + payload_len;
                self.x += header_len as usize;
                self.frames.push(payload_len);
                self.set_field(type_id, name, ordinal);
                self.field_value = None;
                self.current_element = Some(StreamElement::SubmessageFieldStart);
                Ok(StreamElement::SubmessageFieldStart)
            }
        }
    }

    fn set_field(&mut self, type_id: u8, name: Option<String>, ordinal: Option<i16>) {
        self.field_type = type_id;
        self.field_ordinal = ordinal;
        self.field_name = match (name, ordinal, &self.taxonomy) {
            (None, Some(ordinal), Some(taxonomy)) => {
                taxonomy.name_of(ordinal).map(str::to_owned)
            }
            (name, _, _) => name,
        };
    }

    /// Reads and parses the next envelope header, buffering its payload.
    /// Returns false at a clean end of stream.
    fn try_buffer_envelope(&mut self) -> Result<bool, FudgeError> {
        let header_start = self.stream_pos;
        let mut header = [0u8; ENVELOPE_HEADER_SIZE as usize];
        let got = self.fill(&mut header)?;
        if got == 0 {
            return Ok(false);
        }
        if got < header.len() {
            return Err(FudgeError::Truncated {
                offset: self.stream_pos,
            });
        }
        let directives = header[0];
        let version = header[1];
        let taxonomy_id = i16::from_be_bytes([header[2], header[3]]);
        let total = i32::from_be_bytes([header[4], header[5], header[6], header[7]]);
        if total < ENVELOPE_HEADER_SIZE as i32 {
            return Err(FudgeError::framing(
                header_start,
                format!("envelope claims a total length of {total} bytes, less than its own header"),
            ));
        }
        let payload_len = (total as u64 - ENVELOPE_HEADER_SIZE) as usize;
        let mut payload = vec![0u8; payload_len];
        let got = self.fill(&mut payload)?;
        payload.truncate(got);
        // A short payload is not reported here: the envelope event is still
        // delivered, and the cursor runs into the missing bytes on a later
        // next().
        self.buf = payload;
        self.buf_complete = got == payload_len;
        self.base_offset = header_start + ENVELOPE_HEADER_SIZE;
        self.x = 0;
        self.claimed_len = payload_len as u64;
        self.processing_directives = directives;
        self.schema_version = version;
        self.taxonomy_id = taxonomy_id;
        self.taxonomy = self.context.taxonomy(taxonomy_id);
        self.envelope_ready = true;
        Ok(true)
    }

    /// Reads from the transport until `buf` is full or the stream ends,
    /// returning the number of bytes read.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize, FudgeError> {
        let transport = match self.transport.as_mut() {
            Some(t) => t,
            None => return Ok(0),
        };
        let mut filled = 0;
        while filled < buf.len() {
            match transport.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(FudgeError::IoFailure(e)),
            }
        }
        self.stream_pos += filled as u64;
        Ok(filled)
    }

    fn read_field(&mut self) -> Result<FieldOutcome, FudgeError> {
        let base = self.offset();
        let complete = self.buf_complete;
        let frame_remaining = *self.frames.last().expect("open frame");
        let dictionary = self.context.dictionary();
        let mut r = BufReader::new(&self.buf[self.x..]);
        // Running off the end of a fully-supplied envelope means the length
        // fields lied; off the end of a short one, the stream was cut.
        let underrun = |r: &BufReader, e: BufferError| match e {
            BufferError::EndOfBuffer => {
                let at = base + r.offset() as u64;
                if complete {
                    FudgeError::framing(at, "field runs past the end of its envelope")
                } else {
                    FudgeError::Truncated { offset: at }
                }
            }
            BufferError::InvalidUtf8 => FudgeError::framing(
                base + r.offset() as u64,
                "field name is not valid utf-8",
            ),
        };

        let prefix_byte = r.u8().map_err(|e| underrun(&r, e))?;
        let prefix =
            FieldPrefix::decode(prefix_byte).map_err(|detail| FudgeError::framing(base, detail))?;
        let type_id = r.u8().map_err(|e| underrun(&r, e))?;
        let ordinal = if prefix.has_ordinal {
            Some(r.i16().map_err(|e| underrun(&r, e))?)
        } else {
            None
        };
        let name = if prefix.has_name {
            let len = r.u8().map_err(|e| underrun(&r, e))? as usize;
            Some(r.utf8(len).map_err(|e| underrun(&r, e))?.to_owned())
        } else {
            None
        };
        let payload_len: u64 = if prefix.fixed_width || prefix.var_width == 0 {
            dictionary
                .get(type_id)
                .and_then(|wt| wt.fixed_size)
                .ok_or_else(|| {
                    FudgeError::framing(
                        base,
                        format!("wire type {type_id} has no fixed size and no advertised length"),
                    )
                })? as u64
        } else {
            match prefix.var_width {
                1 => r.u8().map_err(|e| underrun(&r, e))? as u64,
                2 => r.u16().map_err(|e| underrun(&r, e))? as u64,
                _ => r.u32().map_err(|e| underrun(&r, e))? as u64,
            }
        };
        let header_len = r.offset() as u64;
        if header_len + payload_len > frame_remaining {
            return Err(FudgeError::framing(
                base,
                format!(
                    "field of {} bytes exceeds the {} bytes remaining in its frame",
                    header_len + payload_len,
                    frame_remaining
                ),
            ));
        }
        if type_id == SUB_MESSAGE_TYPE_ID || type_id == FUDGE_MSG_WITH_ID_TYPE_ID {
            return Ok(FieldOutcome::SubmessageStart {
                header_len,
                payload_len,
                type_id,
                name,
                ordinal,
            });
        }
        let payload_at = base + r.offset() as u64;
        let payload = match r.buf(payload_len as usize) {
            Ok(payload) => payload,
            Err(e) => return Err(underrun(&r, e)),
        };
        let value = decode_value(type_id, payload, payload_at)?;
        Ok(FieldOutcome::Simple {
            consumed: header_len + payload_len,
            type_id,
            name,
            ordinal,
            value,
        })
    }
}

/// Decodes one payload into a value. Unknown type ids are preserved as
/// opaque bytes; this is recovery, not failure.
fn decode_value(type_id: u8, payload: &[u8], at: u64) -> Result<FieldValue, FudgeError> {
    let mut r = BufReader::new(payload);
    let short = |_: BufferError| FudgeError::framing(at, "payload shorter than its type requires");
    let value = match type_id {
        INDICATOR_TYPE_ID => FieldValue::Indicator,
        BOOLEAN_TYPE_ID => FieldValue::Boolean(r.u8().map_err(short)? != 0),
        BYTE_TYPE_ID => FieldValue::Byte(r.i8().map_err(short)?),
        SHORT_TYPE_ID => FieldValue::Short(r.i16().map_err(short)?),
        INT_TYPE_ID => FieldValue::Int(r.i32().map_err(short)?),
        LONG_TYPE_ID => FieldValue::Long(r.i64().map_err(short)?),
        FLOAT_TYPE_ID => FieldValue::Float(r.f32().map_err(short)?),
        DOUBLE_TYPE_ID => FieldValue::Double(r.f64().map_err(short)?),
        BYTE_ARRAY_TYPE_ID
        | BYTE_ARRAY_4_TYPE_ID
        | BYTE_ARRAY_8_TYPE_ID
        | BYTE_ARRAY_16_TYPE_ID
        | BYTE_ARRAY_20_TYPE_ID
        | BYTE_ARRAY_32_TYPE_ID
        | BYTE_ARRAY_64_TYPE_ID
        | BYTE_ARRAY_128_TYPE_ID
        | BYTE_ARRAY_256_TYPE_ID
        | BYTE_ARRAY_512_TYPE_ID => FieldValue::Bytes(payload.to_vec()),
        STRING_TYPE_ID => FieldValue::Str(
            std::str::from_utf8(payload)
                .map_err(|_| FudgeError::framing(at, "string payload is not valid utf-8"))?
                .to_owned(),
        ),
        SHORT_ARRAY_TYPE_ID => FieldValue::ShortArray(decode_array(payload, 2, at, |r| r.i16())?),
        INT_ARRAY_TYPE_ID => FieldValue::IntArray(decode_array(payload, 4, at, |r| r.i32())?),
        LONG_ARRAY_TYPE_ID => FieldValue::LongArray(decode_array(payload, 8, at, |r| r.i64())?),
        FLOAT_ARRAY_TYPE_ID => FieldValue::FloatArray(decode_array(payload, 4, at, |r| r.f32())?),
        DOUBLE_ARRAY_TYPE_ID => FieldValue::DoubleArray(decode_array(payload, 8, at, |r| r.f64())?),
        DATE_TYPE_ID => FieldValue::Date(FudgeDate::from_packed(r.i32().map_err(short)?)),
        TIME_TYPE_ID => FieldValue::Time(FudgeTime::from_packed(r.u64().map_err(short)?)),
        DATETIME_TYPE_ID => {
            let date = FudgeDate::from_packed(r.i32().map_err(short)?);
            let time = FudgeTime::from_packed(r.u64().map_err(short)?);
            FieldValue::DateTime(FudgeDateTime::new(date, time))
        }
        other => FieldValue::Unknown {
            type_id: other,
            bytes: payload.to_vec(),
        },
    };
    Ok(value)
}

fn decode_array<T>(
    payload: &[u8],
    elem_size: usize,
    at: u64,
    mut read: impl FnMut(&mut BufReader) -> Result<T, BufferError>,
) -> Result<Vec<T>, FudgeError> {
    if payload.len() % elem_size != 0 {
        return Err(FudgeError::framing(
            at,
            format!(
                "array payload of {} bytes is not a multiple of the {elem_size}-byte element size",
                payload.len()
            ),
        ));
    }
    let mut r = BufReader::new(payload);
    let mut out = Vec::with_capacity(payload.len() / elem_size);
    while !r.is_exhausted() {
        out.push(read(&mut r).map_err(|_| {
            FudgeError::framing(at, "array payload shorter than its element count")
        })?);
    }
    Ok(out)
}
