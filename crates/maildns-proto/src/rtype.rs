//! Record types.
//!
//! Named here are the types the resolver asks for (MX, A, AAAA, TLSA),
//! the ones it follows or decodes in a reply (CNAME, NS, SOA, PTR, TXT,
//! SRV) and OPT for EDNS. Any other code is carried as [`Type::Unknown`].

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A record type the resolver knows by name.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    IntoPrimitive,
    TryFromPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(u16)]
pub enum RecordType {
    /// IPv4 address (RFC 1035)
    A = 1,
    /// Name server (RFC 1035)
    NS = 2,
    /// Alias (RFC 1035)
    CNAME = 5,
    /// Start of authority (RFC 1035)
    SOA = 6,
    /// Pointer (RFC 1035)
    PTR = 12,
    /// Mail exchange (RFC 1035, RFC 7505)
    MX = 15,
    /// Text (RFC 1035)
    TXT = 16,
    /// IPv6 address (RFC 3596)
    AAAA = 28,
    /// Service location (RFC 2782)
    SRV = 33,
    /// EDNS pseudo-record (RFC 6891)
    OPT = 41,
    /// TLS certificate association (RFC 6698)
    TLSA = 52,
}

impl RecordType {
    /// Returns the wire value.
    #[inline]
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Looks up a wire value.
    #[inline]
    pub fn from_u16(value: u16) -> Option<Self> {
        Self::try_from(value).ok()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // the variant names are the presentation mnemonics
        fmt::Debug::fmt(self, f)
    }
}

/// Type field as found on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// One of [`RecordType`].
    Known(RecordType),
    /// Printed as `TYPE<n>` (RFC 3597).
    Unknown(u16),
}

impl Type {
    /// Classifies a wire value.
    #[inline]
    pub fn from_u16(value: u16) -> Self {
        RecordType::from_u16(value).map_or(Self::Unknown(value), Self::Known)
    }

    /// Returns the wire value.
    #[inline]
    pub const fn to_u16(self) -> u16 {
        match self {
            Self::Known(rtype) => rtype.to_u16(),
            Self::Unknown(value) => value,
        }
    }

    /// Returns the named type, if any.
    #[inline]
    pub const fn as_known(self) -> Option<RecordType> {
        match self {
            Self::Known(rtype) => Some(rtype),
            Self::Unknown(_) => None,
        }
    }

    /// True if this is `rtype`.
    #[inline]
    pub fn is(self, rtype: RecordType) -> bool {
        self == Self::Known(rtype)
    }
}

impl From<RecordType> for Type {
    fn from(rtype: RecordType) -> Self {
        Self::Known(rtype)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(rtype) => write!(f, "{rtype}"),
            Self::Unknown(value) => write!(f, "TYPE{value}"),
        }
    }
}
