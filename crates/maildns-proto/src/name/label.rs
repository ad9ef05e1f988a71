//! Single label of a domain name.

use std::fmt;

/// A borrowed label (one dot-separated component, up to 63 bytes).
#[derive(Clone, Copy)]
pub struct Label<'a> {
    bytes: &'a [u8],
}

impl<'a> Label<'a> {
    /// Creates a label from a byte slice.
    #[inline]
    pub const fn from_bytes(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Returns the raw bytes of the label (without length prefix).
    #[inline]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Returns the length of the label in bytes.
    #[inline]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true for the zero-length root label.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Case-insensitive comparison with another label.
    #[inline]
    pub fn eq_ignore_ascii_case(&self, other: &Label<'_>) -> bool {
        self.bytes.eq_ignore_ascii_case(other.bytes)
    }

    /// Returns true if this is the `*` wildcard label.
    #[inline]
    pub fn is_wildcard(&self) -> bool {
        self.bytes == b"*"
    }
}

impl fmt::Display for Label<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in self.bytes {
            if byte == b'.' || byte == b'\\' {
                write!(f, "\\{}", byte as char)?;
            } else if byte.is_ascii_graphic() {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\{byte:03}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Label<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label(\"{self}\")")
    }
}

impl PartialEq for Label<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.eq_ignore_ascii_case(other)
    }
}

impl Eq for Label<'_> {}

/// Iterator over the non-root labels of an uncompressed wire name.
pub struct LabelIter<'a> {
    wire: &'a [u8],
    pos: usize,
}

impl<'a> LabelIter<'a> {
    /// Creates a new label iterator from wire format bytes.
    #[inline]
    pub const fn new(wire: &'a [u8]) -> Self {
        Self { wire, pos: 0 }
    }
}

impl<'a> Iterator for LabelIter<'a> {
    type Item = Label<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let len = usize::from(*self.wire.get(self.pos)?);
        if len == 0 {
            self.pos = self.wire.len();
            return None;
        }

        let start = self.pos + 1;
        let bytes = self.wire.get(start..start + len)?;
        self.pos = start + len;
        Some(Label::from_bytes(bytes))
    }
}

impl std::iter::FusedIterator for LabelIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_basics() {
        let label = Label::from_bytes(b"example");
        assert_eq!(label.len(), 7);
        assert!(!label.is_empty());
        assert_eq!(label.to_string(), "example");
    }

    #[test]
    fn test_label_escaping() {
        assert_eq!(Label::from_bytes(b"a.b").to_string(), "a\\.b");
        assert_eq!(Label::from_bytes(b"x\x01").to_string(), "x\\001");
    }

    #[test]
    fn test_case_insensitive_comparison() {
        let lower = Label::from_bytes(b"example");
        let mixed = Label::from_bytes(b"ExAmPlE");

        assert!(lower.eq_ignore_ascii_case(&mixed));
        assert_eq!(lower, mixed);
    }

    #[test]
    fn test_wildcard() {
        assert!(Label::from_bytes(b"*").is_wildcard());
        assert!(!Label::from_bytes(b"www").is_wildcard());
    }

    #[test]
    fn test_iter_stops_at_root() {
        let wire = [3, b'w', b'w', b'w', 3, b'c', b'o', b'm', 0];
        let labels: Vec<_> = LabelIter::new(&wire).map(|l| l.to_string()).collect();
        assert_eq!(labels, vec!["www", "com"]);
        assert_eq!(LabelIter::new(&[0]).count(), 0);
    }
}
