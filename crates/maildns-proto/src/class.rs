//! Record classes.
//!
//! Mail routing only ever asks in the Internet class. Whatever class a
//! server puts on a reply record is kept verbatim so it can be written
//! back or shown, but only `IN` has a name.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The class every query is sent in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive, Serialize, Deserialize,
)]
#[repr(u16)]
pub enum RecordClass {
    /// Internet (RFC 1035)
    IN = 1,
}

/// Class field as found on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Class {
    /// `IN`.
    Known(RecordClass),
    /// Any other class value, printed as `CLASS<n>` (RFC 3597).
    Unknown(u16),
}

impl Class {
    /// Classifies a wire value.
    pub fn from_u16(value: u16) -> Self {
        RecordClass::try_from(value).map_or(Self::Unknown(value), Self::Known)
    }

    /// Returns the wire value.
    pub fn to_u16(self) -> u16 {
        match self {
            Self::Known(class) => class.into(),
            Self::Unknown(value) => value,
        }
    }

    /// True for `IN`.
    #[inline]
    pub const fn is_internet(self) -> bool {
        matches!(self, Self::Known(RecordClass::IN))
    }
}

impl From<RecordClass> for Class {
    fn from(class: RecordClass) -> Self {
        Self::Known(class)
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(RecordClass::IN) => f.write_str("IN"),
            Self::Unknown(value) => write!(f, "CLASS{value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internet_class() {
        let class = Class::from_u16(1);
        assert!(class.is_internet());
        assert_eq!(class, RecordClass::IN.into());
        assert_eq!(class.to_string(), "IN");
        assert_eq!(class.to_u16(), 1);
    }

    #[test]
    fn test_other_classes_kept_verbatim() {
        // CHAOS has no name here
        let class = Class::from_u16(3);
        assert!(!class.is_internet());
        assert_eq!(class.to_string(), "CLASS3");
        assert_eq!(class.to_u16(), 3);
    }
}
