//! DNS question section.

use crate::class::{Class, RecordClass};
use crate::error::Result;
use crate::name::Name;
use crate::rtype::{RecordType, Type};
use crate::wire::{WireReader, WireWriter};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A DNS question.
///
/// # Wire Format
///
/// ```text
///                                 1  1  1  1  1  1
///   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// /                     QNAME                     /
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                     QTYPE                     |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                     QCLASS                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Question {
    /// The domain name being queried.
    pub qname: Name,

    /// The type of record being requested.
    pub qtype: Type,

    /// The class of the query.
    pub qclass: Class,
}

impl Question {
    /// Creates a new question.
    #[inline]
    pub fn new(qname: Name, qtype: RecordType, qclass: RecordClass) -> Self {
        Self {
            qname,
            qtype: Type::Known(qtype),
            qclass: Class::Known(qclass),
        }
    }

    /// Reads a question at the reader's position.
    pub fn read(reader: &mut WireReader<'_>) -> Result<Self> {
        let qname = reader.read_name()?;
        let qtype = Type::from_u16(reader.read_u16()?);
        let qclass = Class::from_u16(reader.read_u16()?);
        Ok(Self {
            qname,
            qtype,
            qclass,
        })
    }

    /// Returns the wire format length of this question.
    pub fn wire_len(&self) -> usize {
        self.qname.wire_len() + 4
    }

    /// Writes the question in wire format.
    pub fn write_to(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_name(&self.qname)?;
        writer.write_u16(self.qtype.to_u16())?;
        writer.write_u16(self.qclass.to_u16())
    }

    /// Returns true if `other` asks the same thing, ignoring name case.
    pub fn matches(&self, other: &Question) -> bool {
        self.qname == other.qname && self.qtype == other.qtype && self.qclass == other.qclass
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.qname, self.qclass, self.qtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_question_read() {
        let wire = [
            7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'o', b'r', b'g', 0, 0, 15, 0, 1,
        ];
        let mut reader = WireReader::new(&wire);
        let q = Question::read(&mut reader).unwrap();

        assert_eq!(q.qname.to_string(), "example.org.");
        assert!(q.qtype.is(RecordType::MX));
        assert!(q.qclass.is_internet());
        assert!(reader.is_empty());
    }

    #[test]
    fn test_question_truncated() {
        let wire = [1, b'a', 0, 0, 15, 0];
        assert!(Question::read(&mut WireReader::new(&wire)).is_err());
    }

    #[test]
    fn test_question_write() {
        let q = Question::new(
            Name::from_str("_25._tcp.mx.example.org").unwrap(),
            RecordType::TLSA,
            RecordClass::IN,
        );
        let mut writer = WireWriter::new(64);
        q.write_to(&mut writer).unwrap();

        assert_eq!(writer.len(), q.wire_len());
        let back = Question::read(&mut WireReader::new(writer.as_bytes())).unwrap();
        assert!(back.matches(&q));
        assert_eq!(q.to_string(), "_25._tcp.mx.example.org. IN TLSA");
    }
}
