//! The field prefix byte.
//!
//! Bit layout, MSB to LSB: `F O N V V 0 0 0` where F marks a fixed-width
//! payload (size implied by the type id), O the presence of a 2-byte ordinal,
//! N the presence of a length-prefixed name, and VV selects the width of the
//! payload-length field: 0, 1, 2 or 4 bytes. The low three bits are reserved
//! and must be zero.
//!
//! The writer signals fixed-width payloads with a var-width code of 0 and
//! leaves F clear; the reader honours either form.

pub const FIXED_WIDTH_FLAG: u8 = 0x80;
pub const ORDINAL_FLAG: u8 = 0x40;
pub const NAME_FLAG: u8 = 0x20;

const VAR_WIDTH_SHIFT: u8 = 3;
const VAR_WIDTH_MASK: u8 = 0b11;
const RESERVED_MASK: u8 = 0b0000_0111;

/// Decoded form of the field prefix byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPrefix {
    pub fixed_width: bool,
    pub has_ordinal: bool,
    pub has_name: bool,
    /// Width in bytes of the payload-length field: 0, 1, 2 or 4.
    /// 0 means the payload size is the type's fixed size.
    pub var_width: u8,
}

impl FieldPrefix {
    /// Packs into the wire byte.
    pub fn encode(&self) -> u8 {
        let code = match self.var_width {
            0 => 0,
            1 => 1,
            2 => 2,
            _ => 3,
        };
        let mut byte = code << VAR_WIDTH_SHIFT;
        if self.fixed_width {
            byte |= FIXED_WIDTH_FLAG;
        }
        if self.has_ordinal {
            byte |= ORDINAL_FLAG;
        }
        if self.has_name {
            byte |= NAME_FLAG;
        }
        byte
    }

    /// Unpacks a wire byte, rejecting set reserved bits.
    pub fn decode(byte: u8) -> Result<Self, &'static str> {
        if byte & RESERVED_MASK != 0 {
            return Err("reserved field-prefix bits set");
        }
        let var_width = match (byte >> VAR_WIDTH_SHIFT) & VAR_WIDTH_MASK {
            0 => 0,
            1 => 1,
            2 => 2,
            _ => 4,
        };
        Ok(Self {
            fixed_width: byte & FIXED_WIDTH_FLAG != 0,
            has_ordinal: byte & ORDINAL_FLAG != 0,
            has_name: byte & NAME_FLAG != 0,
            var_width,
        })
    }
}

/// Width of the payload-length field needed for a variable payload of `len`
/// bytes.
pub fn var_width_for(len: u64) -> u8 {
    if len <= 0xff {
        1
    } else if len <= 0xffff {
        2
    } else {
        4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_only_fixed_field_is_0x40() {
        let prefix = FieldPrefix {
            fixed_width: false,
            has_ordinal: true,
            has_name: false,
            var_width: 0,
        };
        assert_eq!(prefix.encode(), 0x40);
        assert_eq!(FieldPrefix::decode(0x40), Ok(prefix));
    }

    #[test]
    fn named_variable_field_packs_name_and_width() {
        let prefix = FieldPrefix {
            fixed_width: false,
            has_ordinal: false,
            has_name: true,
            var_width: 1,
        };
        assert_eq!(prefix.encode(), 0x20 | 0x08);
        assert_eq!(FieldPrefix::decode(0x28), Ok(prefix));
    }

    #[test]
    fn var_width_codes_round_trip() {
        for width in [0u8, 1, 2, 4] {
            let prefix = FieldPrefix {
                fixed_width: false,
                has_ordinal: false,
                has_name: false,
                var_width: width,
            };
            assert_eq!(
                FieldPrefix::decode(prefix.encode()).unwrap().var_width,
                width
            );
        }
    }

    #[test]
    fn fixed_width_flag_is_honoured_on_decode() {
        let prefix = FieldPrefix::decode(0x80).unwrap();
        assert!(prefix.fixed_width);
        assert_eq!(prefix.var_width, 0);
    }

    #[test]
    fn reserved_bits_are_rejected() {
        assert!(FieldPrefix::decode(0x01).is_err());
        assert!(FieldPrefix::decode(0x47).is_err());
    }

    #[test]
    fn length_field_widths() {
        assert_eq!(var_width_for(0), 1);
        assert_eq!(var_width_for(255), 1);
        assert_eq!(var_width_for(256), 2);
        assert_eq!(var_width_for(65535), 2);
        assert_eq!(var_width_for(65536), 4);
    }
}
