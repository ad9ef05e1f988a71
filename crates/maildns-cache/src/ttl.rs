//! Expiry computation.
//!
//! A successful fetch lives for the smallest TTL among the stored
//! records, capped by the ceiling and by the TTL of the MX answer that
//! led to the lookup. A transient failure lives for the negative TTL so
//! the next delivery attempt retries.

use crate::{DEFAULT_TTL, NEGATIVE_TTL};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// TTL limits for TLSA entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlPolicy {
    /// Ceiling for records with a large TTL.
    pub max_ttl: Duration,
    /// Lifetime of a transient failure.
    pub negative_ttl: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            max_ttl: DEFAULT_TTL,
            negative_ttl: NEGATIVE_TTL,
        }
    }
}

impl TtlPolicy {
    /// Lifetime of a fetch whose smallest record TTL was `min_ttl`.
    ///
    /// `mx_ttl` of zero means no MX bound.
    pub fn positive(&self, min_ttl: Option<u32>, mx_ttl: u32) -> Duration {
        let mut ttl = min_ttl.map_or(self.max_ttl, |t| {
            Duration::from_secs(u64::from(t)).min(self.max_ttl)
        });
        if mx_ttl > 0 {
            ttl = ttl.min(Duration::from_secs(u64::from(mx_ttl)));
        }
        ttl
    }

    /// Lifetime of a transient failure.
    #[inline]
    pub const fn negative(&self) -> Duration {
        self.negative_ttl
    }
}

/// Returns `now + ttl`, saturating instead of overflowing.
pub fn expiry_for(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_ttl() {
        let policy = TtlPolicy::default();
        assert_eq!(policy.positive(Some(300), 0), Duration::from_secs(300));
        assert_eq!(policy.positive(Some(86_400), 0), DEFAULT_TTL);
        assert_eq!(policy.positive(None, 0), DEFAULT_TTL);
        assert_eq!(policy.positive(Some(300), 120), Duration::from_secs(120));
    }

    #[test]
    fn test_negative_ttl() {
        assert_eq!(TtlPolicy::default().negative(), NEGATIVE_TTL);
        let now = Instant::now();
        assert_eq!(expiry_for(now, NEGATIVE_TTL) - now, Duration::from_secs(60));
    }
}
