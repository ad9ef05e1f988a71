//! Address record types (A, AAAA).

use crate::error::{Error, Result};
use crate::wire::WireWriter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// A record - IPv4 address (RFC 1035).
///
/// The RDATA is exactly 4 bytes in network byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct A {
    address: Ipv4Addr,
}

impl A {
    /// Creates a new A record.
    #[inline]
    pub const fn new(address: Ipv4Addr) -> Self {
        Self { address }
    }

    /// Returns the IPv4 address.
    #[inline]
    pub const fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Parses an A record from its RDATA.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let octets: [u8; 4] = data
            .try_into()
            .map_err(|_| Error::rdata_length("A", 4, data.len()))?;
        Ok(Self::new(Ipv4Addr::from(octets)))
    }

    /// Returns the wire format length (always 4).
    #[inline]
    pub const fn wire_len(&self) -> usize {
        4
    }

    /// Writes the A record to wire format.
    pub fn write_to(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_bytes(&self.address.octets())
    }
}

impl From<Ipv4Addr> for A {
    fn from(address: Ipv4Addr) -> Self {
        Self::new(address)
    }
}

impl fmt::Display for A {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

/// AAAA record - IPv6 address (RFC 3596).
///
/// The RDATA is exactly 16 bytes in network byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AAAA {
    address: Ipv6Addr,
}

impl AAAA {
    /// Creates a new AAAA record.
    #[inline]
    pub const fn new(address: Ipv6Addr) -> Self {
        Self { address }
    }

    /// Returns the IPv6 address.
    #[inline]
    pub const fn address(&self) -> Ipv6Addr {
        self.address
    }

    /// Parses an AAAA record from its RDATA.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let octets: [u8; 16] = data
            .try_into()
            .map_err(|_| Error::rdata_length("AAAA", 16, data.len()))?;
        Ok(Self::new(Ipv6Addr::from(octets)))
    }

    /// Returns the wire format length (always 16).
    #[inline]
    pub const fn wire_len(&self) -> usize {
        16
    }

    /// Writes the AAAA record to wire format.
    pub fn write_to(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_bytes(&self.address.octets())
    }
}

impl From<Ipv6Addr> for AAAA {
    fn from(address: Ipv6Addr) -> Self {
        Self::new(address)
    }
}

impl fmt::Display for AAAA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a_record() {
        let a = A::parse(&[192, 0, 2, 1]).unwrap();
        assert_eq!(a.address(), Ipv4Addr::new(192, 0, 2, 1));
        assert_eq!(a.to_string(), "192.0.2.1");
    }

    #[test]
    fn test_a_wrong_length() {
        assert!(matches!(
            A::parse(&[192, 0, 2]),
            Err(Error::RDataLengthMismatch {
                expected: 4,
                actual: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_aaaa_record() {
        let mut octets = [0u8; 16];
        octets[0] = 0x20;
        octets[1] = 0x01;
        octets[2] = 0x0d;
        octets[3] = 0xb8;
        octets[15] = 1;
        let aaaa = AAAA::parse(&octets).unwrap();
        assert_eq!(aaaa.to_string(), "2001:db8::1");
        assert!(AAAA::parse(&octets[..15]).is_err());
    }
}
