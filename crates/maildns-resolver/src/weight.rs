//! Deterministic tie-break weights for equal-preference MX hosts.

use serde::{Deserialize, Serialize};

/// Modulus of the rolling hash.
const WEIGHT_MODULUS: u32 = 2003;

/// Process-lifetime seed for [`WeightSeed::mx_weight`].
///
/// The seed is fixed for the life of the resolver so that the order of
/// equally preferred hosts is stable across lookups, yet differs between
/// processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightSeed(u16);

impl WeightSeed {
    /// Creates a seed from `value`; zero is bumped to one.
    pub const fn new(value: u16) -> Self {
        if value == 0 {
            Self(1)
        } else {
            Self(value)
        }
    }

    /// Draws a random seed.
    pub fn random() -> Self {
        Self::new(rand::random())
    }

    /// Returns the seed value.
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Weight of `host`, in `1..=256`.
    ///
    /// `hash = ((hash << 1) ^ byte) % 2003` over the lower-cased bytes,
    /// starting from the seed, then masked to one byte and incremented so
    /// it is never zero. Zero is reserved for the local host.
    pub fn mx_weight(self, host: &str) -> u16 {
        let hash = host.bytes().fold(u32::from(self.0), |hash, byte| {
            ((hash << 1) ^ u32::from(byte.to_ascii_lowercase())) % WEIGHT_MODULUS
        });
        // masked to a byte, so the cast cannot truncate
        (hash & 0xFF) as u16 + 1
    }
}

impl Default for WeightSeed {
    fn default() -> Self {
        Self::random()
    }
}
