//! The mail resolver object.
//!
//! [`MailResolver`] owns every piece of process-lifetime state: the query
//! collaborator, the TLSA store, the clock, the insertion policy, the MX
//! weight seed, the fallback registry, and the host signature memo. The
//! operations themselves live in the `mx`, `canon`, `dane`, `fallback`,
//! and `signature` modules.

use crate::fallback::FallbackRegistry;
use crate::lookup::{Lookup, LookupError, QueryOptions};
use crate::search::{SearchList, SearchSettings};
use crate::signature::SignatureMemo;
use crate::stub::StubResolver;
use crate::weight::WeightSeed;
use maildns_cache::{
    ArrivalOrder, Clock, InsertPolicy, MemoryStore, SystemClock, TlsaStore, TtlPolicy,
};
use maildns_config::Config;
use maildns_proto::{RecordClass, RecordType};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Options derived from [`Config`] that the operations consult.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub search: SearchSettings,
    /// Search-augmented MX queries.
    pub use_search: bool,
    /// AAAA before A when canonicalizing.
    pub inet6: bool,
    local_names: HashSet<String>,
    pub fallback_mx: Option<String>,
    pub try_null_mx_list: bool,
    pub has_wildcard_mx: bool,
    pub dont_expand_cnames: bool,
    pub dane_enabled: bool,
    pub ttl: TtlPolicy,
}

impl ResolverSettings {
    pub fn from_config(config: &Config) -> Self {
        let mut settings = Self {
            search: SearchSettings::from_config(&config.resolver),
            use_search: config.resolver.use_search,
            inet6: config.resolver.inet6,
            local_names: HashSet::new(),
            fallback_mx: config
                .mx
                .fallback_mx
                .as_deref()
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string),
            try_null_mx_list: config.mx.try_null_mx_list,
            has_wildcard_mx: config.mx.has_wildcard_mx,
            dont_expand_cnames: config.mx.dont_expand_cnames,
            dane_enabled: config.dane.enabled,
            ttl: TtlPolicy {
                max_ttl: config.dane.default_ttl(),
                negative_ttl: config.dane.negative_ttl(),
            },
        };
        for name in &config.mx.local_names {
            settings.add_local_name(name);
        }
        settings
    }

    /// Adds a name under which this host receives mail.
    pub fn add_local_name(&mut self, name: &str) {
        let name = normalize_host(name);
        if !name.is_empty() {
            self.local_names.insert(name);
        }
    }

    /// Returns true if `host` names this host.
    pub fn is_local(&self, host: &str) -> bool {
        self.local_names.contains(&normalize_host(host))
    }

    /// Returns the local names, normalized.
    pub fn local_names(&self) -> impl Iterator<Item = &str> {
        self.local_names.iter().map(String::as_str)
    }

    /// Address types tried when canonicalizing, in order.
    pub(crate) fn address_types(&self) -> &'static [RecordType] {
        if self.inet6 {
            &[RecordType::AAAA, RecordType::A]
        } else {
            &[RecordType::A]
        }
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Lower-cases `host` and strips a trailing dot.
pub(crate) fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Returns true for a bracketed address literal such as `[192.0.2.1]`.
pub(crate) fn is_bracketed(host: &str) -> bool {
    host.starts_with('[')
}

/// Mail routing resolver.
pub struct MailResolver<L, S = MemoryStore, C = SystemClock> {
    pub(crate) lookup: L,
    pub(crate) store: S,
    pub(crate) clock: C,
    pub(crate) policy: Box<dyn InsertPolicy>,
    pub(crate) seed: WeightSeed,
    pub(crate) settings: ResolverSettings,
    pub(crate) fallback: FallbackRegistry,
    pub(crate) signatures: SignatureMemo,
}

impl MailResolver<StubResolver, MemoryStore, SystemClock> {
    /// Builds a resolver that queries the configured nameservers.
    pub fn from_config(config: &Config) -> Self {
        let store = match config.dane.max_entries {
            Some(limit) => MemoryStore::with_limit(limit),
            None => MemoryStore::new(),
        };
        Self::new(
            StubResolver::from_config(&config.resolver),
            store,
            SystemClock,
            ResolverSettings::from_config(config),
        )
    }
}

impl<L: Lookup, S: TlsaStore, C: Clock> MailResolver<L, S, C> {
    /// Creates a resolver with a random weight seed and the
    /// [`ArrivalOrder`] insertion policy.
    pub fn new(lookup: L, store: S, clock: C, settings: ResolverSettings) -> Self {
        Self {
            lookup,
            store,
            clock,
            policy: Box::new(ArrivalOrder),
            seed: WeightSeed::random(),
            settings,
            fallback: FallbackRegistry::new(),
            signatures: SignatureMemo::default(),
        }
    }

    /// Replaces the TLSA insertion policy.
    #[must_use]
    pub fn with_policy(mut self, policy: impl InsertPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Replaces the MX weight seed.
    #[must_use]
    pub fn with_seed(mut self, seed: WeightSeed) -> Self {
        self.seed = seed;
        self
    }

    /// Wraps the resolver for use from several threads.
    ///
    /// The lock covers a whole operation, so a TLSA lookup and the
    /// insertions that follow it are never interleaved with another.
    pub fn into_shared(self) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(self))
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn seed(&self) -> WeightSeed {
        self.seed
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ResolverSettings {
        &mut self.settings
    }

    /// Sends one IN-class query.
    pub(crate) fn query(
        &self,
        name: &str,
        rtype: RecordType,
        opts: QueryOptions,
    ) -> Result<Vec<u8>, LookupError> {
        trace!(name, %rtype, "query");
        self.lookup.query(name, RecordClass::IN, rtype, opts)
    }

    /// Sends a query through the `ndots` search list.
    ///
    /// The first candidate with data wins. Otherwise "no data" beats
    /// "try again", which beats "host not found", so a partial outage
    /// is not reported as a missing domain.
    pub(crate) fn query_search(
        &self,
        host: &str,
        rtype: RecordType,
        opts: QueryOptions,
    ) -> Result<Vec<u8>, LookupError> {
        let list = SearchList::for_query(host, &self.settings.search);
        let mut saw_nodata = false;
        let mut saw_tryagain = false;

        for name in list.names() {
            match self.query(&name, rtype, opts) {
                Ok(reply) => return Ok(reply),
                Err(LookupError::NoData) => saw_nodata = true,
                Err(LookupError::TryAgain) => saw_tryagain = true,
                Err(LookupError::HostNotFound) => {}
                Err(err) => return Err(err),
            }
        }

        if saw_nodata {
            Err(LookupError::NoData)
        } else if saw_tryagain {
            Err(LookupError::TryAgain)
        } else {
            Err(LookupError::HostNotFound)
        }
    }

    /// Looks up any address of `host`.
    ///
    /// `Ok(false)` means the host has no address; transient failures are
    /// errors.
    pub(crate) fn has_address(&self, host: &str) -> Result<bool, LookupError> {
        let mut transient = None;
        for &rtype in self.settings.address_types() {
            match self.query(host, rtype, QueryOptions::default()) {
                Ok(_) => return Ok(true),
                Err(err) if err.is_transient() => transient = Some(err),
                Err(_) => {}
            }
        }
        transient.map_or(Ok(false), Err)
    }
}

/// Converts a TTL in seconds to a duration.
#[inline]
pub(crate) fn ttl_duration(ttl: u32) -> Duration {
    Duration::from_secs(u64::from(ttl))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_names_normalized() {
        let mut settings = ResolverSettings::default();
        settings.add_local_name("Mail.Example.COM.");
        settings.add_local_name("  ");

        assert!(settings.is_local("mail.example.com"));
        assert!(settings.is_local("MAIL.example.com."));
        assert!(!settings.is_local("mx.example.com"));
        assert_eq!(settings.local_names().count(), 1);
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.mx.fallback_mx = Some("  ".to_string());
        config.mx.local_names = vec!["relay.example.net".to_string()];
        config.resolver.inet6 = true;
        config.dane.default_ttl_secs = 600;

        let settings = ResolverSettings::from_config(&config);
        assert_eq!(settings.fallback_mx, None);
        assert!(settings.is_local("relay.example.net."));
        assert_eq!(settings.address_types(), &[RecordType::AAAA, RecordType::A]);
        assert_eq!(settings.ttl.max_ttl, Duration::from_secs(600));
    }

    #[test]
    fn test_host_helpers() {
        assert_eq!(normalize_host(" MX.Example.org. "), "mx.example.org");
        assert!(is_bracketed("[192.0.2.1]"));
        assert!(!is_bracketed("mx.example.org"));
        assert_eq!(ttl_duration(90), Duration::from_secs(90));
    }
}
