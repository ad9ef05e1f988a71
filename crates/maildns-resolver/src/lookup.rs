//! The query collaborator.
//!
//! Everything above this trait works on raw reply bytes; everything below
//! it (sockets, retries, timeouts) is the collaborator's business.

use maildns_proto::{RecordClass, RecordType};
use std::fmt;
use thiserror::Error;

/// Classified failure of a single query.
#[derive(Error, Debug)]
pub enum LookupError {
    /// The name does not exist (NXDOMAIN).
    #[error("host not found")]
    HostNotFound,

    /// Temporary failure (SERVFAIL or no answer in time).
    #[error("temporary failure, try again")]
    TryAgain,

    /// The name exists but has no records of the requested type.
    #[error("no data of the requested type")]
    NoData,

    /// Permanent failure (REFUSED, FORMERR, or an unusable reply).
    #[error("non-recoverable failure")]
    NoRecovery,

    /// Socket-level failure.
    #[error("network error: {0}")]
    Io(#[from] std::io::Error),
}

impl LookupError {
    /// Returns true if the query may succeed when retried later.
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TryAgain | Self::Io(_))
    }

    /// Returns true if the name or its data is known not to exist.
    #[inline]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::HostNotFound | Self::NoData)
    }

    /// Short label used in logs and metrics.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HostNotFound => "host_not_found",
            Self::TryAgain => "try_again",
            Self::NoData => "no_data",
            Self::NoRecovery => "no_recovery",
            Self::Io(_) => "io",
        }
    }
}

/// Per-query options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Ask the upstream resolver for DNSSEC status (EDNS DO, AD).
    pub dnssec: bool,
}

impl QueryOptions {
    /// Options for a query that wants the AD flag reported.
    pub const fn dnssec() -> Self {
        Self { dnssec: true }
    }
}

impl fmt::Display for QueryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dnssec {
            f.write_str("+dnssec")
        } else {
            f.write_str("-dnssec")
        }
    }
}

/// Performs one blocking DNS query and returns the raw reply.
///
/// Implementations return `Ok` only for a reply worth decoding: NOERROR
/// with at least one answer. Every other outcome is a [`LookupError`].
pub trait Lookup {
    fn query(
        &self,
        name: &str,
        class: RecordClass,
        rtype: RecordType,
        opts: QueryOptions,
    ) -> Result<Vec<u8>, LookupError>;
}

impl<L: Lookup + ?Sized> Lookup for &L {
    fn query(
        &self,
        name: &str,
        class: RecordClass,
        rtype: RecordType,
        opts: QueryOptions,
    ) -> Result<Vec<u8>, LookupError> {
        (**self).query(name, class, rtype, opts)
    }
}

impl<L: Lookup + ?Sized> Lookup for Box<L> {
    fn query(
        &self,
        name: &str,
        class: RecordClass,
        rtype: RecordType,
        opts: QueryOptions,
    ) -> Result<Vec<u8>, LookupError> {
        (**self).query(name, class, rtype, opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(LookupError::TryAgain.is_transient());
        assert!(LookupError::Io(std::io::ErrorKind::TimedOut.into()).is_transient());
        assert!(!LookupError::HostNotFound.is_transient());
        assert!(!LookupError::NoRecovery.is_transient());

        assert!(LookupError::HostNotFound.is_absent());
        assert!(LookupError::NoData.is_absent());
        assert!(!LookupError::TryAgain.is_absent());
    }

    #[test]
    fn test_query_options() {
        assert!(!QueryOptions::default().dnssec);
        assert!(QueryOptions::dnssec().dnssec);
        assert_eq!(QueryOptions::dnssec().to_string(), "+dnssec");
    }
}
