//! Cache storage errors.

use thiserror::Error;

/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from the keyed storage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The store refuses to create more entries.
    #[error("TLSA store is full ({limit} entries)")]
    Full {
        /// Configured entry limit.
        limit: usize,
    },

    /// The key is not of the form `_{port}.{host}`.
    #[error("invalid TLSA cache key '{key}'")]
    InvalidKey {
        /// The rejected key.
        key: String,
    },
}

impl Error {
    /// Creates a new `Full` error.
    #[inline]
    pub fn full(limit: usize) -> Self {
        Self::Full { limit }
    }

    /// Returns true if retrying later may succeed.
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Full { .. })
    }
}
