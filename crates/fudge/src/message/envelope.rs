//! The top-level message envelope.

use crate::message::FudgeMsg;

/// The envelope enclosing a top-level message.
///
/// An envelope appears only at the stream root; sub-messages use their own
/// field framing. Processing directives and the schema version are single
/// bytes by construction; a taxonomy id of 0 means no taxonomy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    processing_directives: u8,
    schema_version: u8,
    taxonomy_id: i16,
    message: FudgeMsg,
}

impl Envelope {
    /// Wraps a message with no version, directives or taxonomy.
    pub fn new(message: FudgeMsg) -> Self {
        Self {
            processing_directives: 0,
            schema_version: 0,
            taxonomy_id: 0,
            message,
        }
    }

    /// Wraps a message with a schema version.
    pub fn with_version(message: FudgeMsg, schema_version: u8) -> Self {
        Self {
            schema_version,
            ..Self::new(message)
        }
    }

    pub fn full(
        message: FudgeMsg,
        schema_version: u8,
        processing_directives: u8,
        taxonomy_id: i16,
    ) -> Self {
        Self {
            processing_directives,
            schema_version,
            taxonomy_id,
            message,
        }
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

    pub fn message(&self) -> &FudgeMsg {
        &self.message
    }

    pub fn into_message(self) -> FudgeMsg {
        self.message
    }
}
