//! Big-endian buffer primitives shared by the Fudge wire codec.
//!
//! Fudge is a big-endian format throughout, and every read from the wire must
//! be able to fail cleanly when the stream is shorter than a frame claims, so
//! the [`Reader`] here only offers bounds-checked operations. The cursor never
//! advances on a failed read.

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

use thiserror::Error;

/// Errors raised by buffer reads.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    #[error("end of buffer")]
    EndOfBuffer,
    #[error("invalid utf-8")]
    InvalidUtf8,
}
