//! Facade that frames whole message trees into envelopes.

use std::io::Write;

use crate::context::FudgeContext;
use crate::error::FudgeError;
use crate::message::{Envelope, FudgeMsg};
use crate::wire::size::envelope_size;
use crate::wire::writer::FudgeStreamWriter;

/// Writes whole messages to a binary transport, wrapping each in an
/// envelope.
pub struct FudgeMsgWriter<W: Write> {
    context: FudgeContext,
    stream: FudgeStreamWriter<W>,
}

impl<W: Write> FudgeMsgWriter<W> {
    pub fn new(context: FudgeContext, transport: W) -> Self {
        let stream = FudgeStreamWriter::new(context.dictionary().clone(), transport);
        Self { context, stream }
    }

    /// Writes a message wrapped in an envelope with the given schema version
    /// and no taxonomy.
    pub fn write_message(&mut self, msg: &FudgeMsg, schema_version: u8) -> Result<(), FudgeError> {
        self.write_envelope(&Envelope::with_version(msg.clone(), schema_version))
    }

    /// Writes an envelope, resolving its taxonomy id through the context and
    /// precomputing the total length.
    pub fn write_envelope(&mut self, envelope: &Envelope) -> Result<(), FudgeError> {
        let taxonomy = self.context.taxonomy(envelope.taxonomy_id());
        let total = envelope_size(
            envelope.message(),
            self.context.dictionary(),
            taxonomy.as_deref(),
        );
        if total > i32::MAX as u64 {
            return Err(FudgeError::CapacityExceeded(format!(
                "envelope of {total} bytes overflows the 32-bit total-length field"
            )));
        }
        self.stream.set_taxonomy(taxonomy);
        self.stream.write_envelope_header(
            envelope.processing_directives(),
            envelope.schema_version(),
            envelope.taxonomy_id(),
            total as i32,
        )?;
        for field in envelope.message().iter() {
            self.stream.write_field(field)?;
        }
        self.stream.set_taxonomy(None);
        Ok(())
    }

    /// Flushes the underlying transport.
    pub fn flush(&mut self) -> Result<(), FudgeError> {
        self.stream.flush()
    }

    /// Flushes and releases the underlying transport. Safe to call more than
    /// once.
    pub fn close(&mut self) -> Result<(), FudgeError> {
        self.stream.close()
    }

    /// Returns the underlying transport, if not yet closed.
    pub fn into_inner(self) -> Option<W> {
        self.stream.into_inner()
    }
}
