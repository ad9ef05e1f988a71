//! Name decompression (RFC 1035 Section 4.1.4).

use super::Name;
use crate::error::{Error, Result};
use crate::MAX_NAME_LENGTH;
use smallvec::SmallVec;

/// Maximum number of compression pointer jumps to prevent infinite loops.
pub const MAX_COMPRESSION_JUMPS: usize = 128;

/// Reads domain names out of a complete message.
///
/// Pointers may only point backwards, at most [`MAX_COMPRESSION_JUMPS`]
/// are followed, and the expanded name may not exceed 255 octets. Any of
/// these is an error, never a panic or a hang.
#[derive(Debug, Clone, Copy)]
pub struct NameParser<'a> {
    message: &'a [u8],
}

impl<'a> NameParser<'a> {
    /// Creates a new name parser over `message`.
    #[inline]
    pub const fn new(message: &'a [u8]) -> Self {
        Self { message }
    }

    fn byte(&self, pos: usize) -> Result<u8> {
        self.message
            .get(pos)
            .copied()
            .ok_or_else(|| Error::unexpected_eof(pos))
    }

    /// Parses a name starting at `offset`.
    ///
    /// Returns the name and the bytes consumed at `offset` (a followed
    /// pointer counts as two).
    pub fn parse_name(&self, offset: usize) -> Result<(Name, usize)> {
        let mut wire = SmallVec::<[u8; 64]>::new();
        let mut consumed = None;
        let mut pos = offset;
        let mut jumps = 0;
        let mut label_count = 0u8;

        loop {
            let len_byte = self.byte(pos)?;

            match len_byte & 0xC0 {
                0xC0 => {
                    let low = self.byte(pos + 1)?;
                    let target = usize::from(u16::from_be_bytes([len_byte & 0x3F, low]));

                    if target >= pos {
                        return Err(Error::InvalidCompressionPointer {
                            offset: pos,
                            target,
                        });
                    }

                    if jumps == 0 {
                        consumed = Some(pos - offset + 2);
                    }

                    jumps += 1;
                    if jumps > MAX_COMPRESSION_JUMPS {
                        return Err(Error::TooManyCompressionJumps {
                            max_jumps: MAX_COMPRESSION_JUMPS,
                        });
                    }

                    pos = target;
                }
                0x00 => {
                    let len = usize::from(len_byte);
                    label_count = label_count.saturating_add(1);

                    if wire.len() + 1 + len > MAX_NAME_LENGTH {
                        return Err(Error::name_too_long(wire.len() + 1 + len));
                    }

                    if len == 0 {
                        wire.push(0);
                        if jumps == 0 {
                            consumed = Some(pos - offset + 1);
                        }
                        break;
                    }

                    let label = self
                        .message
                        .get(pos + 1..pos + 1 + len)
                        .ok_or_else(|| Error::unexpected_eof(pos + 1 + len))?;
                    wire.push(len_byte);
                    wire.extend_from_slice(label);
                    pos += 1 + len;
                }
                _ => {
                    return Err(Error::ReservedLabelType {
                        offset: pos,
                        label_type: len_byte,
                    });
                }
            }
        }

        Ok((
            Name { wire, label_count },
            consumed.unwrap_or_default(),
        ))
    }

    /// Parses a name and discards the consumed length.
    #[inline]
    pub fn parse(&self, offset: usize) -> Result<Name> {
        self.parse_name(offset).map(|(name, _)| name)
    }

    /// Skips over a name, returning the number of bytes it occupies at
    /// `offset`. Pointers are not followed.
    pub fn skip_name(&self, offset: usize) -> Result<usize> {
        let mut pos = offset;

        loop {
            let len_byte = self.byte(pos)?;

            match len_byte & 0xC0 {
                0xC0 => {
                    self.byte(pos + 1)?;
                    return Ok(pos - offset + 2);
                }
                0x00 if len_byte == 0 => return Ok(pos - offset + 1),
                0x00 => {
                    pos += 1 + usize::from(len_byte);
                    if pos - offset > MAX_NAME_LENGTH {
                        return Err(Error::name_too_long(pos - offset));
                    }
                }
                _ => {
                    return Err(Error::ReservedLabelType {
                        offset: pos,
                        label_type: len_byte,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_name() {
        let wire = [
            3, b'w', b'w', b'w', 7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm',
            0,
        ];

        let (name, consumed) = NameParser::new(&wire).parse_name(0).unwrap();

        assert_eq!(name.to_string(), "www.example.com.");
        assert_eq!(name.label_count(), 4);
        assert_eq!(consumed, wire.len());
    }

    #[test]
    fn test_parse_compressed_name() {
        let wire = [
            7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm', 0, // example.com.
            3, b'w', b'w', b'w', 0xC0, 0x00, // www.<ptr to 0>
            0xC0, 13, // <ptr to www>
        ];

        let parser = NameParser::new(&wire);

        let (name1, consumed1) = parser.parse_name(0).unwrap();
        assert_eq!(name1.to_string(), "example.com.");
        assert_eq!(consumed1, 13);

        let (name2, consumed2) = parser.parse_name(13).unwrap();
        assert_eq!(name2.to_string(), "www.example.com.");
        assert_eq!(consumed2, 6);

        let (name3, consumed3) = parser.parse_name(19).unwrap();
        assert_eq!(name3, name2);
        assert_eq!(consumed3, 2);
    }

    #[test]
    fn test_pointer_to_question_name() {
        // 12 header bytes, "example.org." at 12, then owner and MX target
        let mut wire = vec![0u8; 12];
        wire.extend_from_slice(&[7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'o', b'r', b'g', 0]);
        let owner = wire.len();
        wire.extend_from_slice(&[0xC0, 0x0C]);
        let exchange = wire.len();
        wire.extend_from_slice(&[2, b'm', b'x', 0xC0, 0x0C]);
        let chained = wire.len();
        wire.extend_from_slice(&[0xC0, exchange as u8]);

        let parser = NameParser::new(&wire);

        let (name, consumed) = parser.parse_name(owner).unwrap();
        assert_eq!(name.to_string(), "example.org.");
        assert_eq!(consumed, 2);

        let (name, consumed) = parser.parse_name(exchange).unwrap();
        assert_eq!(name.to_string(), "mx.example.org.");
        assert_eq!(consumed, 5);

        let (name, consumed) = parser.parse_name(chained).unwrap();
        assert_eq!(name.to_string(), "mx.example.org.");
        assert_eq!(consumed, 2);
    }

    #[test]
    fn test_self_pointer_rejected() {
        let wire = [0xC0, 0x00];

        assert!(matches!(
            NameParser::new(&wire).parse_name(0),
            Err(Error::InvalidCompressionPointer { offset: 0, target: 0 })
        ));
    }

    #[test]
    fn test_forward_pointer_rejected() {
        let wire = [0xC0, 0x04, 0, 0, 1, b'a', 0];

        assert!(matches!(
            NameParser::new(&wire).parse_name(0),
            Err(Error::InvalidCompressionPointer { .. })
        ));
    }

    #[test]
    fn test_expanded_length_bounded() {
        // a chain of backward pointers, each adding a 63-byte label
        let mut wire = vec![0u8];
        let mut prev = 0usize;
        for _ in 0..8 {
            let here = wire.len();
            wire.push(63);
            wire.extend(std::iter::repeat(b'a').take(63));
            wire.push(0xC0 | (prev >> 8) as u8);
            wire.push(prev as u8);
            prev = here;
        }

        assert!(matches!(
            NameParser::new(&wire).parse_name(prev),
            Err(Error::NameTooLong { .. })
        ));
    }

    #[test]
    fn test_truncated_label() {
        let wire = [5, b'a', b'b'];
        assert!(matches!(
            NameParser::new(&wire).parse_name(0),
            Err(Error::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_reserved_label_type() {
        let wire = [0x41, b'a', 0];
        assert!(matches!(
            NameParser::new(&wire).parse_name(0),
            Err(Error::ReservedLabelType {
                offset: 0,
                label_type: 0x41
            })
        ));
    }

    #[test]
    fn test_skip_name() {
        let wire = [3, b'w', b'w', b'w', 0xC0, 0x10];
        assert_eq!(NameParser::new(&wire).skip_name(0).unwrap(), 6);

        let wire = [3, b'w', b'w', b'w', 0];
        assert_eq!(NameParser::new(&wire).skip_name(0).unwrap(), 5);

        let wire = [3, b'w', b'w'];
        assert!(NameParser::new(&wire).skip_name(0).is_err());
    }
}
