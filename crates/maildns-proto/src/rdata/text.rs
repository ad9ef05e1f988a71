//! Text record (TXT).

use crate::error::{Error, Result};
use crate::wire::WireWriter;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// TXT record - Text (RFC 1035).
///
/// A record holds one or more length-prefixed character strings. Every
/// length octet must fit inside the record; the leading one in particular
/// must be strictly smaller than the RDATA length.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TXT {
    strings: SmallVec<[Vec<u8>; 2]>,
}

impl TXT {
    /// Creates a new TXT record with the given strings.
    pub fn new(strings: impl IntoIterator<Item = impl Into<Vec<u8>>>) -> Self {
        Self {
            strings: strings.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the character strings.
    pub fn strings(&self) -> &[Vec<u8>] {
        &self.strings
    }

    /// Returns the leading character string.
    pub fn first(&self) -> Option<&[u8]> {
        self.strings.first().map(Vec::as_slice)
    }

    /// Returns all strings concatenated.
    pub fn data(&self) -> Vec<u8> {
        self.strings.concat()
    }

    /// Parses a TXT record from its RDATA.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut strings = SmallVec::new();
        let mut rest = data;

        while let Some((&len, tail)) = rest.split_first() {
            let len = usize::from(len);
            let Some(chunk) = tail.get(..len) else {
                return Err(Error::invalid_rdata(
                    "TXT",
                    format!("string length {len} overruns record of {} bytes", data.len()),
                ));
            };
            strings.push(chunk.to_vec());
            rest = &tail[len..];
        }

        if strings.is_empty() {
            return Err(Error::invalid_rdata("TXT", "empty record"));
        }

        Ok(Self { strings })
    }

    /// Returns the wire format length.
    pub fn wire_len(&self) -> usize {
        self.strings
            .iter()
            .map(|s| s.chunks(255).map(|c| 1 + c.len()).sum::<usize>().max(1))
            .sum()
    }

    /// Writes the TXT record to wire format, splitting long strings.
    pub fn write_to(&self, writer: &mut WireWriter) -> Result<()> {
        for s in &self.strings {
            if s.is_empty() {
                writer.write_u8(0)?;
                continue;
            }
            for chunk in s.chunks(255) {
                // chunks(255) bounds the length
                #[allow(clippy::cast_possible_truncation)]
                writer.write_u8(chunk.len() as u8)?;
                writer.write_bytes(chunk)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for TXT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, s) in self.strings.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "\"{}\"", String::from_utf8_lossy(s).escape_default())?;
        }
        Ok(())
    }
}
