//! Diagnostic dump of a message tree.

use std::io::{self, Write};

use crate::message::{Field, FudgeMsg};
use crate::types::FieldValue;

/// Writes a textual dump of a message: one line per field with ordinal,
/// name, type id and value, indented by nesting depth. Sub-messages recurse.
/// This output has no round-trip requirement.
pub struct FudgeMsgFormatter<W: Write> {
    out: W,
    indent_width: usize,
}

impl<W: Write> FudgeMsgFormatter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            indent_width: 2,
        }
    }

    pub fn with_indent(out: W, indent_width: usize) -> Self {
        Self { out, indent_width }
    }

    /// Formats the whole message.
    pub fn format(&mut self, msg: &FudgeMsg) -> io::Result<()> {
        self.format_at(msg, 0)
    }

    fn format_at(&mut self, msg: &FudgeMsg, depth: usize) -> io::Result<()> {
        for field in msg.iter() {
            self.format_field(field, depth)?;
            if let FieldValue::Message(sub) = field.value() {
                self.format_at(sub, depth + 1)?;
            }
        }
        Ok(())
    }

    fn format_field(&mut self, field: &Field, depth: usize) -> io::Result<()> {
        let pad = " ".repeat(depth * self.indent_width);
        let ordinal = field
            .ordinal()
            .map(|o| o.to_string())
            .unwrap_or_default();
        let name = field.name().unwrap_or("");
        writeln!(
            self.out,
            "{pad}{ordinal}, {name}, {}, {}",
            field.type_id(),
            field.value()
        )
    }
}

/// Formats a message into a string.
pub fn format_to_string(msg: &FudgeMsg) -> String {
    let mut out = Vec::new();
    FudgeMsgFormatter::new(&mut out)
        .format(msg)
        .expect("writing to a vec cannot fail");
    String::from_utf8(out).expect("formatter output is utf-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_line_per_field_with_blanks() {
        let mut msg = FudgeMsg::new();
        msg.add("price", 42i64).unwrap();
        msg.add_ordinal(7, "bid").unwrap();
        msg.add_full(None, None, FieldValue::Boolean(true)).unwrap();
        let text = format_to_string(&msg);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], ", price, 2, 42");
        assert_eq!(lines[1], "7, , 16, bid");
        assert_eq!(lines[2], ", , 1, true");
    }

    #[test]
    fn submessages_indent_and_recurse() {
        let mut inner = FudgeMsg::new();
        inner.add("b", true).unwrap();
        let mut msg = FudgeMsg::new();
        msg.add("sub", inner).unwrap();
        let text = format_to_string(&msg);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ", sub, 21, submessage");
        assert_eq!(lines[1], "  , b, 1, true");
    }
}
