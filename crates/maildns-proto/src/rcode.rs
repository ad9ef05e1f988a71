//! DNS response codes (RFC 1035 Section 4.1.1).
//!
//! Only the 4-bit header RCODE is decoded; a stub resolver that never sends
//! TSIG or negotiates EDNS versions has no use for the extended space.

use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};

/// DNS response code from the message header.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum ResponseCode {
    /// No error condition.
    NoError = 0,

    /// The name server was unable to interpret the query.
    FormErr = 1,

    /// The name server was unable to process the query.
    ServFail = 2,

    /// The domain name referenced in the query does not exist.
    NXDomain = 3,

    /// The name server does not support the requested kind of query.
    NotImp = 4,

    /// The name server refuses to perform the operation.
    Refused = 5,

    /// Name exists when it should not (RFC 2136).
    YXDomain = 6,

    /// RR set exists when it should not (RFC 2136).
    YXRRSet = 7,

    /// RR set that should exist does not (RFC 2136).
    NXRRSet = 8,

    /// Server not authoritative for zone (RFC 2136).
    NotAuth = 9,

    /// Name not contained in zone (RFC 2136).
    NotZone = 10,

    /// Any other value.
    #[num_enum(catch_all)]
    Unknown(u8),
}

impl ResponseCode {
    /// Creates a response code from the low four bits of `value`.
    #[inline]
    pub fn from_header(value: u8) -> Self {
        Self::from(value & 0x0F)
    }

    /// Returns the 4-bit value for the header RCODE field.
    #[inline]
    pub fn header_rcode(self) -> u8 {
        u8::from(self) & 0x0F
    }

    /// Returns true if this response indicates success.
    #[inline]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::NoError)
    }

    /// Returns true if this response indicates the name does not exist.
    #[inline]
    pub const fn is_nxdomain(self) -> bool {
        matches!(self, Self::NXDomain)
    }

    /// Returns true if this response indicates a server error.
    #[inline]
    pub const fn is_server_error(self) -> bool {
        matches!(self, Self::ServFail)
    }

    /// Returns the human-readable name of the response code.
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoError => "NOERROR",
            Self::FormErr => "FORMERR",
            Self::ServFail => "SERVFAIL",
            Self::NXDomain => "NXDOMAIN",
            Self::NotImp => "NOTIMP",
            Self::Refused => "REFUSED",
            Self::YXDomain => "YXDOMAIN",
            Self::YXRRSet => "YXRRSET",
            Self::NXRRSet => "NXRRSET",
            Self::NotAuth => "NOTAUTH",
            Self::NotZone => "NOTZONE",
            Self::Unknown(_) => "RCODE",
        }
    }
}

impl std::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(value) => write!(f, "RCODE{value}"),
            other => f.write_str(other.name()),
        }
    }
}

impl Default for ResponseCode {
    fn default() -> Self {
        Self::NoError
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rcode_values() {
        assert_eq!(u8::from(ResponseCode::NoError), 0);
        assert_eq!(u8::from(ResponseCode::ServFail), 2);
        assert_eq!(ResponseCode::from(3), ResponseCode::NXDomain);
        assert_eq!(ResponseCode::from(14), ResponseCode::Unknown(14));
        assert_eq!(ResponseCode::from_header(0xF3), ResponseCode::NXDomain);
    }

    #[test]
    fn test_rcode_predicates() {
        assert!(ResponseCode::NoError.is_success());
        assert!(!ResponseCode::NXDomain.is_success());
        assert!(ResponseCode::NXDomain.is_nxdomain());
        assert!(ResponseCode::ServFail.is_server_error());
    }

    #[test]
    fn test_rcode_display() {
        assert_eq!(ResponseCode::Refused.to_string(), "REFUSED");
        assert_eq!(ResponseCode::Unknown(12).to_string(), "RCODE12");
    }
}
