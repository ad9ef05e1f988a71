//! TLS certificate association record (TLSA).

use crate::error::{Error, Result};
use crate::wire::WireWriter;
use data_encoding::HEXLOWER;
use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// TLSA record - TLS Certificate Association (RFC 6698).
///
/// ```text
/// +--------+--------+--------+-----------------------------+
/// | usage  |selector| mtype  |  certificate association    |
/// | 1 byte | 1 byte | 1 byte |  data (rest of RDATA)       |
/// +--------+--------+--------+-----------------------------+
/// ```
///
/// The raw RDATA is kept alongside the decoded fields because the DANE
/// cache compares and stores records byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TLSA {
    raw: Vec<u8>,
}

/// TLSA certificate usage field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum TlsaUsage {
    /// PKIX-TA: CA constraint.
    PkixTa = 0,
    /// PKIX-EE: service certificate constraint.
    PkixEe = 1,
    /// DANE-TA: trust anchor assertion.
    DaneTa = 2,
    /// DANE-EE: domain-issued certificate.
    DaneEe = 3,
    /// Private use (255) or unassigned.
    #[num_enum(catch_all)]
    Other(u8),
}

/// TLSA selector field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum TlsaSelector {
    /// Full certificate.
    FullCertificate = 0,
    /// Subject public key info.
    SubjectPublicKeyInfo = 1,
    /// Private use or unassigned.
    #[num_enum(catch_all)]
    Other(u8),
}

/// TLSA matching type field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum TlsaMatchingType {
    /// Exact match on the selected content.
    Full = 0,
    /// SHA-256 hash of the selected content.
    Sha256 = 1,
    /// SHA-512 hash of the selected content.
    Sha512 = 2,
    /// Private use or unassigned.
    #[num_enum(catch_all)]
    Other(u8),
}

impl TlsaMatchingType {
    /// Returns the digest length this matching type implies.
    pub const fn digest_len(self) -> Option<usize> {
        match self {
            Self::Sha256 => Some(32),
            Self::Sha512 => Some(64),
            _ => None,
        }
    }
}

impl TLSA {
    /// Minimum RDATA length: three parameter octets and one data octet.
    pub const MIN_LEN: usize = 4;

    /// Creates a new TLSA record.
    pub fn new(usage: u8, selector: u8, matching_type: u8, data: &[u8]) -> Self {
        let mut raw = Vec::with_capacity(3 + data.len());
        raw.extend_from_slice(&[usage, selector, matching_type]);
        raw.extend_from_slice(data);
        Self { raw }
    }

    /// Returns the certificate usage.
    #[inline]
    pub fn usage(&self) -> TlsaUsage {
        TlsaUsage::from(self.raw[0])
    }

    /// Returns the selector.
    #[inline]
    pub fn selector(&self) -> TlsaSelector {
        TlsaSelector::from(self.raw[1])
    }

    /// Returns the matching type.
    #[inline]
    pub fn matching_type(&self) -> TlsaMatchingType {
        TlsaMatchingType::from(self.raw[2])
    }

    /// Returns the certificate association data.
    pub fn data(&self) -> &[u8] {
        &self.raw[3..]
    }

    /// Returns the complete RDATA.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Returns the association data as lowercase hex.
    pub fn data_hex(&self) -> String {
        HEXLOWER.encode(self.data())
    }

    /// Parses a TLSA record from its RDATA.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_LEN {
            return Err(Error::invalid_rdata(
                "TLSA",
                format!("{} bytes is shorter than the minimum of {}", data.len(), Self::MIN_LEN),
            ));
        }

        Ok(Self { raw: data.to_vec() })
    }

    /// Returns the wire format length.
    pub fn wire_len(&self) -> usize {
        self.raw.len()
    }

    /// Writes the TLSA record to wire format.
    pub fn write_to(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_bytes(&self.raw)
    }
}

impl fmt::Display for TLSA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.raw[0],
            self.raw[1],
            self.raw[2],
            self.data_hex()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tlsa_parse() {
        let mut rdata = vec![3, 1, 1];
        rdata.extend_from_slice(&[0xAB; 32]);
        let tlsa = TLSA::parse(&rdata).unwrap();

        assert_eq!(tlsa.usage(), TlsaUsage::DaneEe);
        assert_eq!(tlsa.selector(), TlsaSelector::SubjectPublicKeyInfo);
        assert_eq!(tlsa.matching_type(), TlsaMatchingType::Sha256);
        assert_eq!(tlsa.data().len(), 32);
        assert_eq!(tlsa.as_bytes(), &rdata[..]);
        assert!(tlsa.to_string().starts_with("3 1 1 abab"));
    }

    #[test]
    fn test_tlsa_too_short() {
        assert!(matches!(
            TLSA::parse(&[3, 1, 1]),
            Err(Error::InvalidRData { .. })
        ));
    }

    #[test]
    fn test_tlsa_field_values() {
        assert_eq!(TlsaUsage::from(255), TlsaUsage::Other(255));
        assert_eq!(TlsaMatchingType::Sha512.digest_len(), Some(64));
        assert_eq!(TlsaMatchingType::Full.digest_len(), None);
        assert_eq!(u8::from(TlsaSelector::FullCertificate), 0);
    }
}
