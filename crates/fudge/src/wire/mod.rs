//! The binary wire protocol: field framing, size precomputation, and the
//! streaming reader/writer state machines with their message-tree facades.

pub mod msg_reader;
pub mod msg_writer;
pub mod prefix;
pub mod reader;
pub mod size;
pub mod writer;

pub use msg_reader::FudgeMsgReader;
pub use msg_writer::FudgeMsgWriter;
pub use prefix::FieldPrefix;
pub use reader::{FudgeStreamReader, StreamElement};
pub use writer::FudgeStreamWriter;
