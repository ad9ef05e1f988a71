//! EDNS(0) OPT pseudo-record (RFC 6891).
//!
//! Only the query side is needed: an OPT record advertising the UDP
//! payload size and, when DNSSEC records are wanted, the DO bit.

use crate::error::Result;
use crate::rtype::RecordType;
use crate::wire::WireWriter;
use serde::{Deserialize, Serialize};
use std::fmt;

/// DO bit in the OPT TTL field.
const DNSSEC_OK: u32 = 0x8000;

/// EDNS parameters sent with a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edns {
    /// UDP payload size.
    udp_size: u16,
    /// DNSSEC OK flag.
    dnssec_ok: bool,
}

impl Edns {
    /// Default UDP payload size for EDNS.
    pub const DEFAULT_UDP_SIZE: u16 = 1232;

    /// Creates a new EDNS with default settings.
    pub const fn new() -> Self {
        Self {
            udp_size: Self::DEFAULT_UDP_SIZE,
            dnssec_ok: false,
        }
    }

    /// Creates EDNS with DNSSEC OK flag set.
    pub const fn with_dnssec() -> Self {
        Self {
            udp_size: Self::DEFAULT_UDP_SIZE,
            dnssec_ok: true,
        }
    }

    /// Returns the advertised UDP payload size.
    #[inline]
    pub const fn udp_size(&self) -> u16 {
        self.udp_size
    }

    /// Sets the UDP payload size.
    pub fn set_udp_size(&mut self, size: u16) {
        self.udp_size = size;
    }

    /// Returns true if the DNSSEC OK flag is set.
    #[inline]
    pub const fn dnssec_ok(&self) -> bool {
        self.dnssec_ok
    }

    /// Returns the full wire format length (as a pseudo-RR).
    pub const fn wire_len(&self) -> usize {
        // . (1) + TYPE (2) + CLASS (2) + TTL (4) + RDLENGTH (2)
        11
    }

    /// Writes the OPT pseudo-RR to wire format.
    pub fn write_to(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_u8(0)?;
        writer.write_u16(RecordType::OPT.to_u16())?;
        // CLASS carries the payload size
        writer.write_u16(self.udp_size)?;
        writer.write_u32(if self.dnssec_ok { DNSSEC_OK } else { 0 })?;
        writer.write_u16(0)
    }
}

impl Default for Edns {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Edns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EDNS: version 0, udp {}", self.udp_size)?;
        if self.dnssec_ok {
            f.write_str(", flags: do")?;
        }
        Ok(())
    }
}
