//! DNS record data (RDATA) types.
//!
//! Only the types a mail resolver acts on get a decoder:
//!
//! - **Address records**: A, AAAA
//! - **Name records**: NS, CNAME, PTR, MX, SRV
//! - **Text records**: TXT
//! - **Certificate records**: TLSA
//!
//! Everything else is kept as opaque bytes.
//!
//! Decoders never look past their own RDATA. A decoder failure inside a
//! correctly delimited record is reported as a payload error so the
//! caller can drop that one record and keep walking the section.

pub mod address;
pub mod cert;
pub mod name;
pub mod text;
pub mod unknown;

pub use address::{A, AAAA};
pub use cert::{TlsaMatchingType, TlsaSelector, TlsaUsage, TLSA};
pub use name::{CNAME, MX, NS, PTR, SRV};
pub use text::TXT;
pub use unknown::Unknown;

use crate::error::{Error, Result};
use crate::name::Name;
use crate::rtype::{RecordType, Type};
use crate::wire::{WireReader, WireWriter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// DNS record data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum RData {
    /// IPv4 address (A record)
    A(A),

    /// IPv6 address (AAAA record)
    AAAA(AAAA),

    /// Name server (NS record)
    NS(NS),

    /// Canonical name (CNAME record)
    CNAME(CNAME),

    /// Pointer (PTR record)
    PTR(PTR),

    /// Mail exchange (MX record)
    MX(MX),

    /// Service location (SRV record)
    SRV(SRV),

    /// Text (TXT record)
    TXT(TXT),

    /// TLSA certificate association
    TLSA(TLSA),

    /// Unknown or undecoded record type (preserved as raw bytes)
    Unknown(Unknown),
}

impl RData {
    /// Parses RDATA from wire format.
    ///
    /// # Arguments
    ///
    /// * `rtype` - The record type
    /// * `message` - The complete message (for name compression)
    /// * `offset` - Offset to the start of the RDATA
    /// * `rdlength` - Length of the RDATA
    ///
    /// # Errors
    ///
    /// [`Error::RecordOverrun`] if the RDATA runs past the message, or a
    /// payload error (see [`Error::is_payload_error`]) if the content does
    /// not decode.
    pub fn parse(rtype: Type, message: &[u8], offset: usize, rdlength: usize) -> Result<Self> {
        let slice = rdata_reader(message, offset, rdlength)?.slice_at(offset, rdlength)?;

        let Some(known) = rtype.as_known() else {
            return Ok(RData::Unknown(Unknown::new(rtype.to_u16(), slice)));
        };

        match known {
            RecordType::A => Ok(RData::A(A::parse(slice)?)),
            RecordType::AAAA => Ok(RData::AAAA(AAAA::parse(slice)?)),
            RecordType::NS => Ok(RData::NS(NS::parse(message, offset, rdlength)?)),
            RecordType::CNAME => Ok(RData::CNAME(CNAME::parse(message, offset, rdlength)?)),
            RecordType::PTR => Ok(RData::PTR(PTR::parse(message, offset, rdlength)?)),
            RecordType::MX => Ok(RData::MX(MX::parse(message, offset, rdlength)?)),
            RecordType::SRV => Ok(RData::SRV(SRV::parse(message, offset, rdlength)?)),
            RecordType::TXT => Ok(RData::TXT(TXT::parse(slice)?)),
            RecordType::TLSA => Ok(RData::TLSA(TLSA::parse(slice)?)),
            other => Ok(RData::Unknown(Unknown::new(other.to_u16(), slice))),
        }
    }

    /// Returns the record type for this RDATA.
    pub fn record_type(&self) -> Type {
        match self {
            RData::A(_) => Type::Known(RecordType::A),
            RData::AAAA(_) => Type::Known(RecordType::AAAA),
            RData::NS(_) => Type::Known(RecordType::NS),
            RData::CNAME(_) => Type::Known(RecordType::CNAME),
            RData::PTR(_) => Type::Known(RecordType::PTR),
            RData::MX(_) => Type::Known(RecordType::MX),
            RData::SRV(_) => Type::Known(RecordType::SRV),
            RData::TXT(_) => Type::Known(RecordType::TXT),
            RData::TLSA(_) => Type::Known(RecordType::TLSA),
            RData::Unknown(u) => Type::from_u16(u.type_code()),
        }
    }

    /// Returns the wire format length of this RDATA.
    pub fn wire_len(&self) -> usize {
        match self {
            RData::A(r) => r.wire_len(),
            RData::AAAA(r) => r.wire_len(),
            RData::NS(r) => r.wire_len(),
            RData::CNAME(r) => r.wire_len(),
            RData::PTR(r) => r.wire_len(),
            RData::MX(r) => r.wire_len(),
            RData::SRV(r) => r.wire_len(),
            RData::TXT(r) => r.wire_len(),
            RData::TLSA(r) => r.wire_len(),
            RData::Unknown(r) => r.wire_len(),
        }
    }

    /// Writes this RDATA to wire format.
    pub fn write_to(&self, writer: &mut WireWriter) -> Result<()> {
        match self {
            RData::A(r) => r.write_to(writer),
            RData::AAAA(r) => r.write_to(writer),
            RData::NS(r) => r.write_to(writer),
            RData::CNAME(r) => r.write_to(writer),
            RData::PTR(r) => r.write_to(writer),
            RData::MX(r) => r.write_to(writer),
            RData::SRV(r) => r.write_to(writer),
            RData::TXT(r) => r.write_to(writer),
            RData::TLSA(r) => r.write_to(writer),
            RData::Unknown(r) => r.write_to(writer),
        }
    }

    /// Returns the address if this is an A or AAAA record.
    pub fn as_ip(&self) -> Option<IpAddr> {
        match self {
            RData::A(a) => Some(IpAddr::V4(a.address())),
            RData::AAAA(aaaa) => Some(IpAddr::V6(aaaa.address())),
            _ => None,
        }
    }

    /// Returns the target name if this is a CNAME record.
    pub fn as_cname(&self) -> Option<&Name> {
        match self {
            RData::CNAME(cname) => Some(cname.target()),
            _ => None,
        }
    }

    /// Returns the record if this is an MX record.
    pub fn as_mx(&self) -> Option<&MX> {
        match self {
            RData::MX(mx) => Some(mx),
            _ => None,
        }
    }

    /// Returns the record if this is a TLSA record.
    pub fn as_tlsa(&self) -> Option<&TLSA> {
        match self {
            RData::TLSA(tlsa) => Some(tlsa),
            _ => None,
        }
    }
}

impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RData::A(r) => write!(f, "{r}"),
            RData::AAAA(r) => write!(f, "{r}"),
            RData::NS(r) => write!(f, "{r}"),
            RData::CNAME(r) => write!(f, "{r}"),
            RData::PTR(r) => write!(f, "{r}"),
            RData::MX(r) => write!(f, "{r}"),
            RData::SRV(r) => write!(f, "{r}"),
            RData::TXT(r) => write!(f, "{r}"),
            RData::TLSA(r) => write!(f, "{r}"),
            RData::Unknown(r) => write!(f, "{r}"),
        }
    }
}

/// Returns a reader positioned at `offset` that cannot see past the RDATA.
///
/// Compression pointers only point backwards, so truncating the message
/// at the end of the record keeps every legal pointer reachable.
pub(crate) fn rdata_reader(message: &[u8], offset: usize, rdlength: usize) -> Result<WireReader<'_>> {
    let remaining = message.len().saturating_sub(offset);
    if rdlength > remaining {
        return Err(Error::record_overrun(offset, rdlength, remaining));
    }
    Ok(WireReader::at(&message[..offset + rdlength], offset))
}

/// Maps a decode failure inside a delimited record to a payload error.
pub(crate) fn payload_error(rtype: &'static str) -> impl Fn(Error) -> Error {
    move |err| {
        if err.is_payload_error() {
            err
        } else {
            Error::invalid_rdata(rtype, err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_mx_with_pointer() {
        // example.com. at 0, then MX 10 mx.<ptr 0> at 13
        let mut msg = vec![7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm', 0];
        msg.extend_from_slice(&[0, 10, 2, b'm', b'x', 0xC0, 0]);

        let rdata = RData::parse(Type::Known(RecordType::MX), &msg, 13, 7).unwrap();
        let mx = rdata.as_mx().unwrap();
        assert_eq!(mx.preference(), 10);
        assert_eq!(mx.exchange(), &Name::from_str("mx.example.com").unwrap());
        assert_eq!(rdata.wire_len(), 2 + 16);
    }

    #[test]
    fn test_overrun_is_not_a_payload_error() {
        let msg = [0, 10, 0];
        let err = RData::parse(Type::Known(RecordType::MX), &msg, 0, 8).unwrap_err();
        assert!(matches!(err, Error::RecordOverrun { rdlength: 8, remaining: 3, .. }));
        assert!(!err.is_payload_error());
    }

    #[test]
    fn test_name_cannot_escape_rdata() {
        // the CNAME target label claims bytes beyond rdlength
        let msg = [5, b'a', b'b', b'c', b'd', b'e', 0];
        let err = RData::parse(Type::Known(RecordType::CNAME), &msg, 0, 3).unwrap_err();
        assert!(err.is_payload_error());
    }

    #[test]
    fn test_bad_address_length() {
        let msg = [1, 2, 3];
        let err = RData::parse(Type::Known(RecordType::A), &msg, 0, 3).unwrap_err();
        assert!(err.is_payload_error());
    }

    #[test]
    fn test_unknown_type_kept() {
        let msg = [0xAA, 0xBB];
        let rdata = RData::parse(Type::from_u16(65400), &msg, 0, 2).unwrap();
        assert_eq!(rdata.record_type().to_u16(), 65400);
        assert_eq!(rdata.to_string(), "\\# 2 aabb");

        let rdata = RData::parse(Type::Known(RecordType::SOA), &msg, 0, 2).unwrap();
        assert!(rdata.record_type().is(RecordType::SOA));
    }

    #[test]
    fn test_write_round_trip() {
        let rdata = RData::TLSA(TLSA::new(3, 1, 1, &[0x11; 32]));
        let mut writer = WireWriter::new(64);
        rdata.write_to(&mut writer).unwrap();
        let parsed = RData::parse(Type::Known(RecordType::TLSA), writer.as_bytes(), 0, writer.len()).unwrap();
        assert_eq!(parsed, rdata);
    }
}
