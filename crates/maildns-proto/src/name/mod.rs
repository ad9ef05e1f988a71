//! Domain names.
//!
//! Names are held in uncompressed wire form, always terminated by the root
//! label. Equality and hashing are ASCII case-insensitive, as DNS requires.
//!
//! ```rust
//! use maildns_proto::name::Name;
//! use std::str::FromStr;
//!
//! let name = Name::from_str("MX1.Example.COM").unwrap();
//! assert_eq!(name.to_string(), "MX1.Example.COM.");
//! assert_eq!(name.to_host(), "MX1.Example.COM");
//! assert_eq!(name, Name::from_str("mx1.example.com.").unwrap());
//! ```

mod label;
mod parse;

pub use label::{Label, LabelIter};
pub use parse::NameParser;

use crate::error::{Error, Result};
use crate::{MAX_LABEL_LENGTH, MAX_NAME_LENGTH};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A DNS domain name.
#[derive(Clone)]
pub struct Name {
    /// Uncompressed wire bytes, ending in the root label.
    wire: SmallVec<[u8; 64]>,
    /// Number of labels, including the root.
    label_count: u8,
}

impl Name {
    /// Creates the root name.
    #[inline]
    pub fn root() -> Self {
        let mut wire = SmallVec::new();
        wire.push(0);
        Self {
            wire,
            label_count: 1,
        }
    }

    /// Creates a name from uncompressed wire bytes.
    pub fn from_wire(bytes: &[u8]) -> Result<Self> {
        let mut pos = 0;
        let mut label_count = 0u8;

        loop {
            let len = usize::from(
                *bytes
                    .get(pos)
                    .ok_or_else(|| Error::unexpected_eof(pos))?,
            );
            label_count = label_count.saturating_add(1);

            if len == 0 {
                pos += 1;
                break;
            }
            if len > MAX_LABEL_LENGTH {
                return Err(Error::label_too_long(len));
            }
            pos += 1 + len;
            if pos > MAX_NAME_LENGTH {
                return Err(Error::name_too_long(pos));
            }
        }

        if pos != bytes.len() {
            return Err(Error::invalid_data(pos, "trailing bytes after root label"));
        }

        Ok(Self {
            wire: SmallVec::from_slice(bytes),
            label_count,
        })
    }

    /// Returns the wire format representation.
    #[inline]
    pub fn as_wire(&self) -> &[u8] {
        &self.wire
    }

    /// Returns the wire format length, including the root label.
    #[inline]
    pub fn wire_len(&self) -> usize {
        self.wire.len()
    }

    /// Returns the number of labels, including the root.
    #[inline]
    pub const fn label_count(&self) -> usize {
        self.label_count as usize
    }

    /// Returns true if this is the root name.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.wire.len() == 1
    }

    /// Returns an iterator over the non-root labels.
    #[inline]
    pub fn labels(&self) -> LabelIter<'_> {
        LabelIter::new(&self.wire)
    }

    /// Returns true if the leftmost label is `*`.
    pub fn is_wildcard(&self) -> bool {
        self.labels().next().is_some_and(|l| l.is_wildcard())
    }

    /// Returns the presentation form without the trailing dot.
    ///
    /// The root name renders as the empty string, which is how a null MX
    /// target shows up.
    pub fn to_host(&self) -> String {
        let mut out = String::with_capacity(self.wire.len());
        for (i, label) in self.labels().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(&label.to_string());
        }
        out
    }

    /// Returns a lowercased copy of the name.
    #[must_use]
    pub fn lowercased(&self) -> Self {
        let mut copy = self.clone();
        copy.wire.make_ascii_lowercase();
        copy
    }

    fn to_string_representation(&self) -> CompactString {
        if self.is_root() {
            return CompactString::new(".");
        }

        let mut result = CompactString::new("");
        for label in self.labels() {
            result.push_str(&label.to_string());
            result.push('.');
        }
        result
    }
}

impl FromStr for Name {
    type Err = Error;

    /// Parses a dotted name. The trailing dot is optional.
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || s == "." {
            return Ok(Self::root());
        }

        let s = s.strip_suffix('.').unwrap_or(s);
        let mut wire = SmallVec::<[u8; 64]>::new();
        let mut label_count = 0u8;

        for (index, part) in s.split('.').enumerate() {
            if part.is_empty() {
                return Err(Error::EmptyLabel { position: index });
            }
            if part.len() > MAX_LABEL_LENGTH {
                return Err(Error::label_too_long(part.len()));
            }
            if let Some((position, character)) = part
                .chars()
                .enumerate()
                .find(|(_, c)| !c.is_ascii_alphanumeric() && !matches!(c, '-' | '_' | '*'))
            {
                return Err(Error::InvalidLabelChar {
                    character,
                    position,
                });
            }

            // label length already checked against 63
            #[allow(clippy::cast_possible_truncation)]
            wire.push(part.len() as u8);
            wire.extend_from_slice(part.as_bytes());
            label_count = label_count.saturating_add(1);
        }

        wire.push(0);
        label_count = label_count.saturating_add(1);

        if wire.len() > MAX_NAME_LENGTH {
            return Err(Error::name_too_long(wire.len()));
        }

        Ok(Self { wire, label_count })
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_representation())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name(\"{self}\")")
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.wire.eq_ignore_ascii_case(&other.wire)
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in &self.wire {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::root()
    }
}

impl Serialize for Name {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_name() {
        let root = Name::root();
        assert!(root.is_root());
        assert_eq!(root.label_count(), 1);
        assert_eq!(root.to_string(), ".");
        assert_eq!(root.to_host(), "");
        assert_eq!(Name::from_str(".").unwrap(), root);
    }

    #[test]
    fn test_name_parsing() {
        let name = Name::from_str("www.example.com.").unwrap();
        assert!(!name.is_root());
        assert_eq!(name.label_count(), 4);
        assert_eq!(name.to_string(), "www.example.com.");
        assert_eq!(name.wire_len(), 17);

        let name2 = Name::from_str("www.example.com").unwrap();
        assert_eq!(name, name2);
    }

    #[test]
    fn test_case_insensitive_comparison() {
        use std::collections::HashSet;

        let lower = Name::from_str("mx.example.com").unwrap();
        let mixed = Name::from_str("Mx.ExAmPlE.CoM").unwrap();
        assert_eq!(lower, mixed);

        let set: HashSet<Name> = [lower, mixed].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_invalid_names() {
        assert!(matches!(
            Name::from_str(&"a".repeat(64)),
            Err(Error::LabelTooLong { length: 64 })
        ));
        assert!(matches!(
            Name::from_str("a..b"),
            Err(Error::EmptyLabel { position: 1 })
        ));
        assert!(matches!(
            Name::from_str("bad host"),
            Err(Error::InvalidLabelChar { character: ' ', .. })
        ));

        let long = vec!["abcdefghij"; 30].join(".");
        assert!(matches!(
            Name::from_str(&long),
            Err(Error::NameTooLong { .. })
        ));
    }

    #[test]
    fn test_from_wire() {
        let name = Name::from_wire(&[2, b'm', b'x', 0]).unwrap();
        assert_eq!(name.to_host(), "mx");
        assert!(Name::from_wire(&[2, b'm', b'x']).is_err());
        assert!(Name::from_wire(&[1, b'a', 0, 0]).is_err());
    }

    #[test]
    fn test_wildcard_and_lowercase() {
        let name = Name::from_str("*.Example.org").unwrap();
        assert!(name.is_wildcard());
        assert_eq!(name.lowercased().to_host(), "*.example.org");
        assert!(!Name::root().is_wildcard());
    }

    #[test]
    fn test_serde_as_string() {
        let name = Name::from_str("mx.example.net").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"mx.example.net.\"");
        let back: Name = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }
}
