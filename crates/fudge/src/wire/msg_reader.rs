//! Facade that reassembles stream events into whole message trees.

use std::io::Read;

use crate::context::FudgeContext;
use crate::error::FudgeError;
use crate::message::{Envelope, Field, FudgeMsg};
use crate::wire::reader::{FudgeStreamReader, StreamElement};

/// Reads whole messages from a binary transport, hiding event management
/// from callers who prefer trees.
pub struct FudgeMsgReader<R: Read> {
    stream: FudgeStreamReader<R>,
}

impl<R: Read> FudgeMsgReader<R> {
    pub fn new(context: FudgeContext, transport: R) -> Self {
        Self {
            stream: FudgeStreamReader::new(context, transport),
        }
    }

    /// Wraps an existing stream reader.
    pub fn from_stream(stream: FudgeStreamReader<R>) -> Self {
        Self { stream }
    }

    /// Whether another envelope is available.
    pub fn has_next(&mut self) -> Result<bool, FudgeError> {
        self.stream.has_next()
    }

    /// Reads the next envelope, or `None` at a clean end of stream.
    pub fn next_envelope(&mut self) -> Result<Option<Envelope>, FudgeError> {
        if !self.stream.has_next()? {
            return Ok(None);
        }
        match self.stream.next()? {
            StreamElement::MessageEnvelope => {}
            other => {
                return Err(FudgeError::framing(
                    0,
                    format!("expected a message envelope, got {other:?}"),
                ))
            }
        }
        let directives = self.stream.processing_directives();
        let version = self.stream.schema_version();
        let taxonomy_id = self.stream.taxonomy_id();

        // Each open sub-message keeps the (type, name, ordinal) of the field
        // that started it until its end event arrives.
        let mut stack: Vec<(u8, Option<String>, Option<i16>, FudgeMsg)> =
            vec![(0, None, None, FudgeMsg::new())];
        while self.stream.in_message() {
            match self.stream.next()? {
                StreamElement::SimpleField => {
                    let value = self.stream.take_field_value().ok_or_else(|| {
                        FudgeError::framing(0, "simple field event carried no value")
                    })?;
                    let field = Field::new(
                        self.stream.field_type(),
                        value,
                        self.stream.field_name().map(str::to_owned),
                        self.stream.field_ordinal(),
                    );
                    let (_, _, _, msg) = stack.last_mut().expect("open message");
                    msg.add_field(field)?;
                }
                StreamElement::SubmessageFieldStart => {
                    stack.push((
                        self.stream.field_type(),
                        self.stream.field_name().map(str::to_owned),
                        self.stream.field_ordinal(),
                        FudgeMsg::new(),
                    ));
                }
                StreamElement::SubmessageFieldEnd => {
                    let (type_id, name, ordinal, sub) =
                        stack.pop().expect("submessage end with open frame");
                    let (_, _, _, parent) = stack.last_mut().ok_or_else(|| {
                        FudgeError::framing(0, "sub-message end without a parent message")
                    })?;
                    parent.add_field(Field::new(type_id, sub.into(), name, ordinal))?;
                }
                StreamElement::MessageEnvelope => {
                    return Err(FudgeError::framing(
                        0,
                        "nested message envelope inside a message",
                    ))
                }
            }
        }
        let (_, _, _, root) = stack.pop().expect("root message");
        Ok(Some(Envelope::full(root, version, directives, taxonomy_id)))
    }

    /// Reads the next message, discarding its envelope header.
    pub fn next_message(&mut self) -> Result<Option<FudgeMsg>, FudgeError> {
        Ok(self.next_envelope()?.map(Envelope::into_message))
    }

    pub fn stream(&self) -> &FudgeStreamReader<R> {
        &self.stream
    }

    /// Releases the underlying transport. Safe to call more than once.
    pub fn close(&mut self) -> Result<(), FudgeError> {
        self.stream.close()
    }
}
