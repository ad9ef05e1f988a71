//! DNS resource records.
//!
//! A resource record (RR) is the fundamental unit of DNS data,
//! containing a name, type, class, TTL, and record-specific data.

use crate::class::{Class, RecordClass};
use crate::error::{Error, Result};
use crate::name::Name;
use crate::rdata::{RData, CNAME, MX, TLSA, TXT, A, AAAA};
use crate::rtype::{RecordType, Type};
use crate::wire::{WireReader, WireWriter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;

/// A DNS resource record.
///
/// # Wire Format
///
/// ```text
///                                 1  1  1  1  1  1
///   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// /                      NAME                     /
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      TYPE                     |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                     CLASS                     |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      TTL                      |
/// |                                               |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                   RDLENGTH                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// /                     RDATA                     /
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// The domain name this record is for.
    name: Name,
    /// The record type.
    rtype: Type,
    /// The record class.
    rclass: Class,
    /// Time to live in seconds.
    ttl: u32,
    /// RDLENGTH as it appeared on the wire.
    size: u16,
    /// The record data.
    rdata: RData,
}

impl ResourceRecord {
    /// Creates a new resource record. The type is taken from the payload.
    pub fn new(name: Name, rclass: Class, ttl: u32, rdata: RData) -> Self {
        // RDATA never exceeds 65535 bytes on the wire
        #[allow(clippy::cast_possible_truncation)]
        let size = rdata.wire_len() as u16;
        Self {
            name,
            rtype: rdata.record_type(),
            rclass,
            ttl,
            size,
            rdata,
        }
    }

    /// Creates an A record.
    pub fn a(name: Name, ttl: u32, addr: Ipv4Addr) -> Self {
        Self::new(name, RecordClass::IN.into(), ttl, RData::A(A::new(addr)))
    }

    /// Creates an AAAA record.
    pub fn aaaa(name: Name, ttl: u32, addr: Ipv6Addr) -> Self {
        Self::new(name, RecordClass::IN.into(), ttl, RData::AAAA(AAAA::new(addr)))
    }

    /// Creates a CNAME record.
    pub fn cname(name: Name, ttl: u32, target: Name) -> Self {
        Self::new(
            name,
            RecordClass::IN.into(),
            ttl,
            RData::CNAME(CNAME::new(target)),
        )
    }

    /// Creates an MX record.
    pub fn mx(name: Name, ttl: u32, preference: u16, exchange: Name) -> Self {
        Self::new(
            name,
            RecordClass::IN.into(),
            ttl,
            RData::MX(MX::new(preference, exchange)),
        )
    }

    /// Creates a TLSA record.
    pub fn tlsa(name: Name, ttl: u32, usage: u8, selector: u8, mtype: u8, data: &[u8]) -> Self {
        Self::new(
            name,
            RecordClass::IN.into(),
            ttl,
            RData::TLSA(TLSA::new(usage, selector, mtype, data)),
        )
    }

    /// Creates a TXT record holding one string.
    pub fn txt(name: Name, ttl: u32, text: impl Into<Vec<u8>>) -> Self {
        Self::new(
            name,
            RecordClass::IN.into(),
            ttl,
            RData::TXT(TXT::new([text.into()])),
        )
    }

    /// Returns the record name.
    #[inline]
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Returns the record type.
    #[inline]
    pub fn rtype(&self) -> Type {
        self.rtype
    }

    /// Returns the record type if known.
    #[inline]
    pub fn record_type(&self) -> Option<RecordType> {
        self.rtype.as_known()
    }

    /// Returns the record class.
    #[inline]
    pub fn rclass(&self) -> Class {
        self.rclass
    }

    /// Returns the TTL in seconds.
    #[inline]
    pub const fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Returns the TTL as a Duration.
    #[inline]
    pub fn ttl_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.ttl))
    }

    /// Returns the RDLENGTH the record was received with.
    #[inline]
    pub const fn size(&self) -> u16 {
        self.size
    }

    /// Returns the record data.
    #[inline]
    pub fn rdata(&self) -> &RData {
        &self.rdata
    }

    /// Returns true if the record is of the given type.
    #[inline]
    pub fn is(&self, rtype: RecordType) -> bool {
        self.rtype.is(rtype)
    }

    /// Reads one record at the reader's position.
    ///
    /// On success the reader is left after the record. A payload error
    /// (see [`Error::is_payload_error`]) also leaves the reader after the
    /// record, so the caller may drop it and continue; any other error
    /// means the section can no longer be delimited.
    pub fn read(reader: &mut WireReader<'_>) -> Result<Self> {
        let fixed = RecordHeader::read(reader)?;
        let message = reader.data();
        let offset = reader.position();
        reader.advance(usize::from(fixed.rdlength))?;

        let rdata = RData::parse(fixed.rtype, message, offset, usize::from(fixed.rdlength))?;
        Ok(Self {
            name: fixed.name,
            rtype: fixed.rtype,
            rclass: fixed.rclass,
            ttl: fixed.ttl,
            size: fixed.rdlength,
            rdata,
        })
    }

    /// Returns the wire format length.
    pub fn wire_len(&self) -> usize {
        self.name.wire_len() + 10 + self.rdata.wire_len()
    }

    /// Writes the resource record to wire format (uncompressed).
    pub fn write_to(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_name(&self.name)?;
        writer.write_u16(self.rtype.to_u16())?;
        writer.write_u16(self.rclass.to_u16())?;
        writer.write_u32(self.ttl)?;

        let length_at = writer.len();
        writer.write_u16(0)?;
        self.rdata.write_to(writer)?;

        let rdlength = u16::try_from(writer.len() - length_at - 2)
            .map_err(|_| Error::invalid_rdata(self.rtype.to_string(), "RDATA exceeds 65535 bytes"))?;
        writer.patch_u16(length_at, rdlength)
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.name, self.ttl, self.rclass, self.rtype, self.rdata
        )
    }
}

/// Owner name and fixed fields of a record, up to and including RDLENGTH.
#[derive(Debug, Clone)]
pub(crate) struct RecordHeader {
    pub(crate) name: Name,
    pub(crate) rtype: Type,
    pub(crate) rclass: Class,
    pub(crate) ttl: u32,
    pub(crate) rdlength: u16,
}

impl RecordHeader {
    /// Reads the fixed part and checks that RDLENGTH fits in the message.
    pub(crate) fn read(reader: &mut WireReader<'_>) -> Result<Self> {
        let name = reader.read_name()?;
        let rtype = Type::from_u16(reader.read_u16()?);
        let rclass = Class::from_u16(reader.read_u16()?);
        let ttl = reader.read_u32()?;
        let rdlength = reader.read_u16()?;

        if usize::from(rdlength) > reader.remaining() {
            return Err(Error::record_overrun(
                reader.position(),
                usize::from(rdlength),
                reader.remaining(),
            ));
        }

        Ok(Self {
            name,
            rtype,
            rclass,
            ttl,
            rdlength,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn name(s: &str) -> Name {
        Name::from_str(s).unwrap()
    }

    #[test]
    fn test_record_write_then_read() {
        let record = ResourceRecord::mx(name("example.com"), 300, 10, name("mx.example.com"));
        let mut writer = WireWriter::new(64);
        record.write_to(&mut writer).unwrap();
        assert_eq!(writer.len(), record.wire_len());

        let mut reader = WireReader::new(writer.as_bytes());
        let parsed = ResourceRecord::read(&mut reader).unwrap();
        assert_eq!(parsed, record);
        assert!(reader.is_empty());
        assert_eq!(parsed.size(), 18);
        assert!(parsed.is(RecordType::MX));
    }

    #[test]
    fn test_payload_error_leaves_reader_after_record() {
        // A record with a 3-byte address, followed by one more byte
        let mut wire = vec![0, 0, 1, 0, 1, 0, 0, 0, 60, 0, 3, 1, 2, 3];
        wire.push(0xEE);

        let mut reader = WireReader::new(&wire);
        let err = ResourceRecord::read(&mut reader).unwrap_err();
        assert!(err.is_payload_error());
        assert_eq!(reader.peek_u8().unwrap(), 0xEE);
    }

    #[test]
    fn test_rdlength_overrun() {
        let wire = [0, 0, 1, 0, 1, 0, 0, 0, 60, 0, 40, 1, 2, 3, 4];
        let mut reader = WireReader::new(&wire);
        assert!(matches!(
            ResourceRecord::read(&mut reader),
            Err(Error::RecordOverrun {
                rdlength: 40,
                remaining: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_display() {
        let record = ResourceRecord::a(name("host.example"), 60, Ipv4Addr::new(192, 0, 2, 7));
        assert_eq!(record.to_string(), "host.example.\t60\tIN\tA\t192.0.2.7");
    }
}
