//! # maildns metrics
//!
//! Resolver counters exported through the `metrics` facade, plus tracing
//! subscriber setup. Without an installed recorder the counters are
//! no-ops; the in-process totals are always kept so the command line can
//! print a summary.

use metrics::counter;
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicU64, Ordering};

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, LogFormat};

/// Global metrics instance.
static METRICS: OnceCell<ResolverMetrics> = OnceCell::new();

/// Gets or initializes the global metrics instance.
pub fn metrics() -> &'static ResolverMetrics {
    METRICS.get_or_init(ResolverMetrics::new)
}

/// Mail resolver metrics.
#[derive(Debug, Default)]
pub struct ResolverMetrics {
    mx_resolutions: AtomicU64,
    canonicalizations: AtomicU64,
    tlsa_lookups: AtomicU64,
    dropped_records: AtomicU64,
}

impl ResolverMetrics {
    /// Creates a new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a finished MX resolution.
    pub fn record_mx_resolution(&self, status: &'static str) {
        self.mx_resolutions.fetch_add(1, Ordering::Relaxed);
        counter!("maildns_mx_resolutions_total", "status" => status).increment(1);
    }

    /// Records a finished canonicalization.
    pub fn record_canonicalization(&self, status: &'static str) {
        self.canonicalizations.fetch_add(1, Ordering::Relaxed);
        counter!("maildns_canonicalizations_total", "status" => status).increment(1);
    }

    /// Records a TLSA cache lookup.
    pub fn record_tlsa_lookup(&self, status: &'static str) {
        self.tlsa_lookups.fetch_add(1, Ordering::Relaxed);
        counter!("maildns_tlsa_lookups_total", "status" => status).increment(1);
    }

    /// Records answer records dropped as malformed.
    pub fn record_dropped_records(&self, count: usize) {
        if count == 0 {
            return;
        }
        let count = count as u64;
        self.dropped_records.fetch_add(count, Ordering::Relaxed);
        counter!("maildns_dropped_records_total").increment(count);
    }

    /// Returns the totals recorded so far.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            mx_resolutions: self.mx_resolutions.load(Ordering::Relaxed),
            canonicalizations: self.canonicalizations.load(Ordering::Relaxed),
            tlsa_lookups: self.tlsa_lookups.load(Ordering::Relaxed),
            dropped_records: self.dropped_records.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub mx_resolutions: u64,
    pub canonicalizations: u64,
    pub tlsa_lookups: u64,
    pub dropped_records: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_without_recorder() {
        let metrics = ResolverMetrics::new();
        metrics.record_mx_resolution("success");
        metrics.record_mx_resolution("tempfail");
        metrics.record_canonicalization("not_found");
        metrics.record_tlsa_lookup("cached");
        metrics.record_dropped_records(0);
        metrics.record_dropped_records(3);

        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                mx_resolutions: 2,
                canonicalizations: 1,
                tlsa_lookups: 1,
                dropped_records: 3,
            }
        );
    }

    #[test]
    fn test_global_instance() {
        let before = metrics().snapshot().tlsa_lookups;
        metrics().record_tlsa_lookup("fetched");
        assert!(metrics().snapshot().tlsa_lookups > before);
    }
}
