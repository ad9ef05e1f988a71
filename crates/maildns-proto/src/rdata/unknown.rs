//! RDATA the resolver steps over without decoding.

use crate::error::Result;
use crate::wire::WireWriter;
use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Undecoded RDATA and the type code it arrived under.
///
/// Displays in the RFC 3597 generic form, `\# <length> <hex>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unknown {
    rtype: u16,
    rdata: Box<[u8]>,
}

impl Unknown {
    /// Wraps `rdata` received for type code `rtype`.
    pub fn new(rtype: u16, rdata: impl Into<Box<[u8]>>) -> Self {
        Self {
            rtype,
            rdata: rdata.into(),
        }
    }

    /// Returns the type code.
    #[inline]
    pub const fn type_code(&self) -> u16 {
        self.rtype
    }

    /// Returns the undecoded bytes.
    pub fn rdata(&self) -> &[u8] {
        &self.rdata
    }

    /// Returns the RDATA length.
    #[inline]
    pub fn wire_len(&self) -> usize {
        self.rdata.len()
    }

    /// Copies the bytes back out unchanged.
    pub fn write_to(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_bytes(&self.rdata)
    }
}

impl fmt::Display for Unknown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\\# {}", self.rdata.len())?;
        if !self.rdata.is_empty() {
            write!(f, " {}", HEXLOWER.encode(&self.rdata))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_presentation() {
        // an RRSIG riding along with a signed MX answer
        let rdata = Unknown::new(46, vec![0xDE, 0xAD]);
        assert_eq!(rdata.type_code(), 46);
        assert_eq!(rdata.to_string(), "\\# 2 dead");

        // RFC 3597 drops the hex field for empty RDATA
        assert_eq!(Unknown::new(65280, Vec::new()).to_string(), "\\# 0");
    }

    #[test]
    fn test_written_back_unchanged() {
        let rdata = Unknown::new(99, vec![1, 2, 3]);
        let mut writer = WireWriter::new(8);
        rdata.write_to(&mut writer).unwrap();
        assert_eq!(writer.as_bytes(), rdata.rdata());
        assert_eq!(rdata.wire_len(), 3);
    }
}
