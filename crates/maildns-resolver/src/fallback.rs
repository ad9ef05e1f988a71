//! Fallback MX registry.
//!
//! The configured fallback host is expanded through its own MX records.
//! The expansion is kept for that lookup's TTL and redone lazily.

use crate::lookup::Lookup;
use crate::mx::{MxOptions, MAX_MX_HOSTS};
use crate::resolver::{ttl_duration, MailResolver};
use maildns_cache::{expiry_for, Clock, TlsaStore};
use std::time::Instant;
use tracing::{debug, warn};

/// Expanded fallback hosts and when to expand them again.
#[derive(Debug, Clone, Default)]
pub struct FallbackRegistry {
    hosts: Vec<String>,
    renewal: Option<Instant>,
}

impl FallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current expansion.
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Returns when the expansion goes stale.
    pub fn renewal(&self) -> Option<Instant> {
        self.renewal
    }

    /// Returns true when empty or stale at `now`.
    pub fn needs_refresh(&self, now: Instant) -> bool {
        self.hosts.is_empty() || self.renewal.map_or(true, |at| now > at)
    }

    /// Replaces the expansion, keeping at most [`MAX_MX_HOSTS`] names.
    pub fn update(&mut self, mut hosts: Vec<String>, renewal: Instant) {
        hosts.truncate(MAX_MX_HOSTS);
        self.hosts = hosts;
        self.renewal = Some(renewal);
    }

    /// Drops the expansion.
    pub fn clear(&mut self) {
        self.hosts.clear();
        self.renewal = None;
    }
}

impl<L: Lookup, S: TlsaStore, C: Clock> MailResolver<L, S, C> {
    /// Returns the fallback host's MX expansion, refreshing it when stale.
    ///
    /// Without a configured fallback host the list is empty. If the
    /// refresh fails the previous expansion is kept.
    pub fn get_fallback_mx(&mut self) -> Vec<String> {
        let Some(fallback) = self.settings.fallback_mx.clone() else {
            return Vec::new();
        };

        let now = self.clock.now();
        if !self.fallback.needs_refresh(now) {
            return self.fallback.hosts().to_vec();
        }

        let opts = MxOptions {
            local_exclusion: false,
            fallback: false,
            port: None,
            dnssec: false,
        };
        let resolution = self.resolve_mx_inner(&fallback, opts);
        if !resolution.status.is_success() || resolution.hosts.is_empty() {
            warn!(
                host = %fallback,
                status = %resolution.status,
                "cannot expand fallback MX host"
            );
            return self.fallback.hosts().to_vec();
        }

        let hosts: Vec<String> = resolution.hosts.into_iter().map(|h| h.host).collect();
        debug!(host = %fallback, count = hosts.len(), ttl = resolution.ttl, "refreshed fallback MX");
        self.fallback
            .update(hosts, expiry_for(now, ttl_duration(resolution.ttl)));
        self.fallback.hosts().to_vec()
    }

    /// Returns the registry without refreshing it.
    pub fn fallback_registry(&self) -> &FallbackRegistry {
        &self.fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_refresh_rules() {
        let now = Instant::now();
        let mut registry = FallbackRegistry::new();
        assert!(registry.needs_refresh(now));

        registry.update(vec!["relay.example.net.".to_string()], now + Duration::from_secs(60));
        assert!(!registry.needs_refresh(now));
        assert!(!registry.needs_refresh(now + Duration::from_secs(60)));
        assert!(registry.needs_refresh(now + Duration::from_secs(61)));

        registry.clear();
        assert!(registry.needs_refresh(now));
        assert_eq!(registry.renewal(), None);
    }

    #[test]
    fn test_update_is_bounded() {
        let now = Instant::now();
        let mut registry = FallbackRegistry::new();
        let hosts = (0..MAX_MX_HOSTS + 5).map(|i| format!("mx{i}.example.net.")).collect();

        registry.update(hosts, now);
        assert_eq!(registry.hosts().len(), MAX_MX_HOSTS);
        assert_eq!(registry.hosts()[0], "mx0.example.net.");
    }
}
