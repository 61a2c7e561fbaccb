//! Fudge: a self-describing, hierarchical, binary message format for
//! financial-services interchange.
//!
//! Messages are ordered lists of fields, each tagged with a wire type and
//! optionally named, numbered (ordinal), or both. The crate covers the wire
//! protocol engine: the typed field model and type dictionary, the binary
//! envelope and field framing with taxonomy handling, the streaming reader
//! and writer state machines, and a JSON rendering that round-trips the
//! binary shape.
//!
//! # Example
//!
//! ```
//! use fudge::{FudgeContext, FudgeMsg, FudgeMsgReader, FudgeMsgWriter};
//!
//! let context = FudgeContext::new();
//! let mut msg = context.new_message();
//! msg.add("symbol", "ACME")?;
//! msg.add("price", 10125i64)?;
//!
//! let mut wire = Vec::new();
//! let mut writer = FudgeMsgWriter::new(context.clone(), &mut wire);
//! writer.write_message(&msg, 0)?;
//! writer.close()?;
//!
//! let mut reader = FudgeMsgReader::new(context, wire.as_slice());
//! let decoded = reader.next_message()?.expect("one message");
//! assert_eq!(decoded, msg);
//! # Ok::<(), fudge::FudgeError>(())
//! ```

pub mod context;
pub mod datetime;
pub mod error;
pub mod formatter;
pub mod json;
pub mod mapping;
pub mod message;
pub mod taxonomy;
pub mod types;
pub mod wire;

pub use context::FudgeContext;
pub use datetime::{FudgeDate, FudgeDateTime, FudgeTime};
pub use error::FudgeError;
pub use formatter::FudgeMsgFormatter;
pub use json::{FudgeJsonStreamReader, FudgeJsonWriter, JsonSettings};
pub use message::{Envelope, Field, FudgeMsg};
pub use taxonomy::{MapTaxonomyResolver, Taxonomy, TaxonomyResolver};
pub use types::{FieldValue, TypeDictionary, WireType};
pub use wire::{
    FudgeMsgReader, FudgeMsgWriter, FudgeStreamReader, FudgeStreamWriter, StreamElement,
};
