//! Name-based record types (NS, CNAME, PTR, MX, SRV).

use super::{payload_error, rdata_reader};
use crate::error::Result;
use crate::name::Name;
use crate::wire::WireWriter;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! single_name_rdata {
    ($(#[$doc:meta])* $ty:ident, $label:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $ty {
            target: Name,
        }

        impl $ty {
            /// Creates a new record pointing at `target`.
            #[inline]
            pub fn new(target: Name) -> Self {
                Self { target }
            }

            /// Returns the target name.
            #[inline]
            pub fn target(&self) -> &Name {
                &self.target
            }

            /// Parses the record from RDATA at `offset` in `message`.
            pub fn parse(message: &[u8], offset: usize, rdlength: usize) -> Result<Self> {
                let mut reader = rdata_reader(message, offset, rdlength)?;
                let target = reader.read_name().map_err(payload_error($label))?;
                Ok(Self { target })
            }

            /// Returns the wire format length.
            #[inline]
            pub fn wire_len(&self) -> usize {
                self.target.wire_len()
            }

            /// Writes the record to wire format (uncompressed).
            pub fn write_to(&self, writer: &mut WireWriter) -> Result<()> {
                writer.write_name(&self.target)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.target)
            }
        }
    };
}

single_name_rdata!(
    /// NS record - authoritative name server (RFC 1035).
    NS,
    "NS"
);

single_name_rdata!(
    /// CNAME record - canonical name of an alias (RFC 1035).
    CNAME,
    "CNAME"
);

single_name_rdata!(
    /// PTR record - domain name pointer (RFC 1035).
    PTR,
    "PTR"
);

/// MX record - Mail exchange (RFC 1035, RFC 7505).
///
/// An exchange equal to the root name with preference 0 is a "null MX":
/// the domain accepts no mail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MX {
    preference: u16,
    exchange: Name,
}

impl MX {
    /// Creates a new MX record.
    #[inline]
    pub fn new(preference: u16, exchange: Name) -> Self {
        Self {
            preference,
            exchange,
        }
    }

    /// Returns the preference value (lower is preferred).
    #[inline]
    pub const fn preference(&self) -> u16 {
        self.preference
    }

    /// Returns the mail exchange domain name.
    #[inline]
    pub fn exchange(&self) -> &Name {
        &self.exchange
    }

    /// Returns true for the RFC 7505 `MX 0 .` record.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.preference == 0 && self.exchange.is_root()
    }

    /// Parses an MX record from RDATA at `offset` in `message`.
    pub fn parse(message: &[u8], offset: usize, rdlength: usize) -> Result<Self> {
        let mut reader = rdata_reader(message, offset, rdlength)?;
        let preference = reader.read_u16().map_err(payload_error("MX"))?;
        let exchange = reader.read_name().map_err(payload_error("MX"))?;
        Ok(Self {
            preference,
            exchange,
        })
    }

    /// Returns the wire format length.
    #[inline]
    pub fn wire_len(&self) -> usize {
        2 + self.exchange.wire_len()
    }

    /// Writes the MX record to wire format.
    pub fn write_to(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_u16(self.preference)?;
        writer.write_name(&self.exchange)
    }
}

impl fmt::Display for MX {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.preference, self.exchange)
    }
}

/// SRV record - service location (RFC 2782).
///
/// The target is read like an MX exchange, so a compressed target from a
/// non-conforming server still decodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SRV {
    priority: u16,
    weight: u16,
    port: u16,
    target: Name,
}

impl SRV {
    /// Creates a new SRV record.
    pub fn new(priority: u16, weight: u16, port: u16, target: Name) -> Self {
        Self {
            priority,
            weight,
            port,
            target,
        }
    }

    /// Returns the priority (lower is preferred).
    #[inline]
    pub const fn priority(&self) -> u16 {
        self.priority
    }

    /// Returns the weight among equal priorities.
    #[inline]
    pub const fn weight(&self) -> u16 {
        self.weight
    }

    /// Returns the port.
    #[inline]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the target host; the root name means "no service".
    #[inline]
    pub fn target(&self) -> &Name {
        &self.target
    }

    /// Parses an SRV record from RDATA at `offset` in `message`.
    pub fn parse(message: &[u8], offset: usize, rdlength: usize) -> Result<Self> {
        let mut reader = rdata_reader(message, offset, rdlength)?;
        let mut field = || reader.read_u16().map_err(payload_error("SRV"));
        let (priority, weight, port) = (field()?, field()?, field()?);
        let target = reader.read_name().map_err(payload_error("SRV"))?;
        Ok(Self::new(priority, weight, port, target))
    }

    /// Returns the wire format length.
    #[inline]
    pub fn wire_len(&self) -> usize {
        6 + self.target.wire_len()
    }

    /// Writes the SRV record to wire format.
    pub fn write_to(&self, writer: &mut WireWriter) -> Result<()> {
        for field in [self.priority, self.weight, self.port] {
            writer.write_u16(field)?;
        }
        writer.write_name(&self.target)
    }
}

impl fmt::Display for SRV {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.priority, self.weight, self.port, self.target
        )
    }
}
