//! The field model: immutable field records, the mutable message container,
//! and the top-level envelope.

pub mod envelope;
pub mod field;
pub mod msg;

pub use envelope::Envelope;
pub use field::Field;
pub use msg::FudgeMsg;
