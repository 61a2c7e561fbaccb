//! Error kinds shared across the crate.
//!
//! Low-level I/O errors wrap the transport error and propagate. Structural
//! violations abort the current envelope and carry the byte offset at which
//! they were detected. Unknown wire types are not errors at all: the reader
//! recovers them as opaque payloads.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FudgeError {
    /// The underlying transport failed.
    #[error("i/o failure: {0}")]
    IoFailure(#[from] std::io::Error),

    /// The stream ended mid-field or mid-envelope. Terminal for the current
    /// message.
    #[error("truncated stream at offset {offset}")]
    Truncated { offset: u64 },

    /// Length fields disagree, or a header overlaps its payload. Fatal for
    /// the current message.
    #[error("framing violation at offset {offset}: {detail}")]
    FramingViolation { offset: u64, detail: String },

    /// Encode-side: a value could not be resolved to a wire type, or a field
    /// held a different type than the caller asked for.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A message would exceed 32767 fields, or a header field overflowed its
    /// wire width.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// The JSON surface was handed text that does not parse, or a document
    /// whose shape cannot carry a message.
    #[error("invalid json: {0}")]
    InvalidJson(String),
}

impl FudgeError {
    pub(crate) fn framing(offset: u64, detail: impl Into<String>) -> Self {
        FudgeError::FramingViolation {
            offset,
            detail: detail.into(),
        }
    }
}
