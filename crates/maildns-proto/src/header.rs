//! DNS message header.
//!
//! The header is a fixed 12-byte structure at the start of every message.

use crate::error::{Error, Result};
use crate::rcode::ResponseCode;
use crate::wire::{WireReader, WireWriter};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of the DNS header in bytes.
pub const HEADER_SIZE: usize = 12;

bitflags! {
    /// DNS header flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct HeaderFlags: u16 {
        /// Query/Response flag: 0 = query, 1 = response
        const QR = 0x8000;

        /// Authoritative Answer
        const AA = 0x0400;

        /// Truncation: message was truncated
        const TC = 0x0200;

        /// Recursion Desired
        const RD = 0x0100;

        /// Recursion Available
        const RA = 0x0080;

        /// Reserved (must be zero)
        const Z = 0x0040;

        /// Authentic Data: the resolver validated the answer (DNSSEC)
        const AD = 0x0020;

        /// Checking Disabled
        const CD = 0x0010;
    }
}

impl Default for HeaderFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// DNS message header.
///
/// # Wire Format
///
/// ```text
///                                 1  1  1  1  1  1
///   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      ID                       |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |QR|   Opcode  |AA|TC|RD|RA| Z|AD|CD|   RCODE   |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    QDCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    ANCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    NSCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    ARCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Message identifier.
    pub id: u16,

    /// Single-bit flags.
    pub flags: HeaderFlags,

    /// Operation code (0 for a standard query).
    pub opcode: u8,

    /// Response code.
    pub rcode: ResponseCode,

    /// Number of questions.
    pub qd_count: u16,

    /// Number of answer records.
    pub an_count: u16,

    /// Number of authority records.
    pub ns_count: u16,

    /// Number of additional records.
    pub ar_count: u16,
}

impl Header {
    /// Creates a new header with the given message ID.
    #[inline]
    pub const fn new(id: u16) -> Self {
        Self {
            id,
            flags: HeaderFlags::empty(),
            opcode: 0,
            rcode: ResponseCode::NoError,
            qd_count: 0,
            an_count: 0,
            ns_count: 0,
            ar_count: 0,
        }
    }

    /// Creates a recursive query header with one question.
    pub const fn query(id: u16) -> Self {
        let mut header = Self::new(id);
        header.flags = HeaderFlags::RD;
        header.qd_count = 1;
        header
    }

    /// Returns true if this is a response.
    #[inline]
    pub fn is_response(&self) -> bool {
        self.flags.contains(HeaderFlags::QR)
    }

    /// Returns true if the message was truncated.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.flags.contains(HeaderFlags::TC)
    }

    /// Returns true if the response data is authenticated (DNSSEC).
    #[inline]
    pub fn is_authentic_data(&self) -> bool {
        self.flags.contains(HeaderFlags::AD)
    }

    /// Sets or clears a flag.
    #[inline]
    pub fn set_flag(&mut self, flag: HeaderFlags, on: bool) {
        self.flags.set(flag, on);
    }

    /// Parses a header from the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::buffer_too_short(HEADER_SIZE, data.len()));
        }
        Self::read(&mut WireReader::new(data))
    }

    /// Reads a header at the reader's position.
    pub fn read(reader: &mut WireReader<'_>) -> Result<Self> {
        let id = reader.read_u16()?;
        let flags_raw = reader.read_u16()?;

        // opcode and rcode occupy bits the flag set does not define
        let opcode = ((flags_raw >> 11) & 0x0F) as u8;
        let rcode = ResponseCode::from_header((flags_raw & 0x0F) as u8);
        let flags = HeaderFlags::from_bits_truncate(flags_raw);

        Ok(Self {
            id,
            flags,
            opcode,
            rcode,
            qd_count: reader.read_u16()?,
            an_count: reader.read_u16()?,
            ns_count: reader.read_u16()?,
            ar_count: reader.read_u16()?,
        })
    }

    /// Serializes the header to wire format.
    pub fn to_wire(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];

        let flags_raw = self.flags.bits()
            | (u16::from(self.opcode & 0x0F) << 11)
            | u16::from(self.rcode.header_rcode());

        buf[0..2].copy_from_slice(&self.id.to_be_bytes());
        buf[2..4].copy_from_slice(&flags_raw.to_be_bytes());
        buf[4..6].copy_from_slice(&self.qd_count.to_be_bytes());
        buf[6..8].copy_from_slice(&self.an_count.to_be_bytes());
        buf[8..10].copy_from_slice(&self.ns_count.to_be_bytes());
        buf[10..12].copy_from_slice(&self.ar_count.to_be_bytes());

        buf
    }

    /// Writes the header to a wire writer.
    pub fn write_to(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_bytes(&self.to_wire())
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new(0)
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID:{:04X} {} opcode:{} {}",
            self.id,
            if self.is_response() { "response" } else { "query" },
            self.opcode,
            self.rcode
        )?;

        for (name, flag) in self.flags.iter_names() {
            if flag != HeaderFlags::QR {
                write!(f, " {name}")?;
            }
        }

        write!(
            f,
            " QD:{} AN:{} NS:{} AR:{}",
            self.qd_count, self.an_count, self.ns_count, self.ar_count
        )
    }
}
