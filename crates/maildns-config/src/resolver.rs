//! Resolver configuration.

use super::{ConfigError, Result};
use crate::resolv_conf::ResolvConf;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Upper bound on `ndots`, matching the resolver library.
pub const MAX_NDOTS: u8 = 15;

/// Upper bound on `attempts`.
pub const MAX_ATTEMPTS: u32 = 5;

/// Upper bound on the search list length.
pub const MAX_SEARCH_DOMAINS: usize = 6;

/// Resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Nameservers queried in order. Empty means the local resolver.
    pub nameservers: Vec<SocketAddr>,

    /// Search domains, most specific first.
    pub search: Vec<String>,

    /// Local domain appended to dot-free names.
    pub default_domain: Option<String>,

    /// Names with fewer dots than this are searched before being tried as is.
    pub ndots: u8,

    /// Per-try timeout (milliseconds).
    pub timeout_ms: u64,

    /// Tries per nameserver.
    pub attempts: u32,

    /// Prefer AAAA over A when canonicalizing.
    pub inet6: bool,

    /// Use the search list for MX queries.
    pub use_search: bool,

    /// Walk the search list (`RES_DNSRCH`).
    pub dnsrch: bool,

    /// Append the default domain to dot-free names (`RES_DEFNAMES`).
    pub defnames: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            nameservers: Vec::new(),
            search: Vec::new(),
            default_domain: None,
            ndots: 1,
            timeout_ms: 5000,
            attempts: 2,
            inet6: false,
            use_search: false,
            dnsrch: true,
            defnames: true,
        }
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<()> {
        if self.ndots > MAX_NDOTS {
            return Err(ConfigError::invalid(
                "resolver.ndots",
                format!("must be at most {MAX_NDOTS}"),
            ));
        }

        if self.timeout_ms == 0 {
            return Err(ConfigError::invalid("resolver.timeout_ms", "must be at least 1"));
        }

        if self.attempts == 0 || self.attempts > MAX_ATTEMPTS {
            return Err(ConfigError::invalid(
                "resolver.attempts",
                format!("must be between 1 and {MAX_ATTEMPTS}"),
            ));
        }

        if self.search.len() > MAX_SEARCH_DOMAINS {
            return Err(ConfigError::invalid(
                "resolver.search",
                format!("at most {MAX_SEARCH_DOMAINS} domains are allowed"),
            ));
        }

        for domain in self.search.iter().chain(self.default_domain.iter()) {
            if domain.trim_end_matches('.').is_empty() {
                return Err(ConfigError::invalid(
                    "resolver.search",
                    "domains must not be empty",
                ));
            }
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns the configured nameservers, or the local resolver if none.
    pub fn effective_nameservers(&self) -> Vec<SocketAddr> {
        if self.nameservers.is_empty() {
            vec![SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 53)]
        } else {
            self.nameservers.clone()
        }
    }

    /// Returns the search domains in the order they are tried.
    ///
    /// A configured search list wins; otherwise the default domain alone.
    pub fn search_domains(&self) -> Vec<String> {
        if !self.search.is_empty() {
            return self.search.clone();
        }
        self.default_domain.iter().cloned().collect()
    }

    /// Fills unset fields from `resolv.conf`.
    ///
    /// Values already present in the configuration file win. Options from
    /// `resolv.conf` replace the defaults only when they were left at
    /// their default values.
    pub fn merge_resolv_conf(&mut self, conf: &ResolvConf) {
        let defaults = Self::default();

        if self.nameservers.is_empty() {
            self.nameservers = conf.nameservers.clone();
        }
        if self.search.is_empty() {
            self.search = conf.search.clone();
        }
        if self.default_domain.is_none() {
            self.default_domain = conf.domain.clone();
        }
        if let Some(ndots) = conf.ndots {
            if self.ndots == defaults.ndots {
                self.ndots = ndots.min(MAX_NDOTS);
            }
        }
        if let Some(timeout) = conf.timeout {
            if self.timeout_ms == defaults.timeout_ms {
                self.timeout_ms = u64::from(timeout).saturating_mul(1000);
            }
        }
        if let Some(attempts) = conf.attempts {
            if self.attempts == defaults.attempts {
                self.attempts = attempts.clamp(1, MAX_ATTEMPTS);
            }
        }
        if conf.inet6 {
            self.inet6 = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = ResolverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(
            config.effective_nameservers(),
            vec!["127.0.0.1:53".parse().unwrap()]
        );
    }

    #[test]
    fn test_out_of_range_values() {
        let mut config = ResolverConfig::default();
        config.ndots = 16;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "resolver.ndots"
        ));

        let mut config = ResolverConfig::default();
        config.attempts = 0;
        assert!(config.validate().is_err());

        let mut config = ResolverConfig::default();
        config.search = vec![".".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_search_domains() {
        let mut config = ResolverConfig::default();
        assert!(config.search_domains().is_empty());

        config.default_domain = Some("example.com".to_string());
        assert_eq!(config.search_domains(), vec!["example.com".to_string()]);

        config.search = vec!["a.example".to_string(), "b.example".to_string()];
        assert_eq!(config.search_domains().len(), 2);
    }

    #[test]
    fn test_merge_resolv_conf() {
        let conf = ResolvConf::parse(
            "nameserver 192.0.2.1\ndomain example.org\nsearch example.org corp.example.org\noptions ndots:2 timeout:3 attempts:4\n",
        );

        let mut config = ResolverConfig::default();
        config.attempts = 1;
        config.merge_resolv_conf(&conf);

        assert_eq!(config.nameservers, vec!["192.0.2.1:53".parse().unwrap()]);
        assert_eq!(config.default_domain.as_deref(), Some("example.org"));
        assert_eq!(config.search.len(), 2);
        assert_eq!(config.ndots, 2);
        assert_eq!(config.timeout_ms, 3000);
        // explicitly configured, so resolv.conf does not override it
        assert_eq!(config.attempts, 1);
    }

    #[test]
    fn test_merge_search_only_sets_default_domain() {
        let conf = ResolvConf::parse("search corp.example.org example.org\n");

        let mut config = ResolverConfig::default();
        config.merge_resolv_conf(&conf);

        assert_eq!(config.default_domain.as_deref(), Some("corp.example.org"));
        assert_eq!(config.search, vec!["corp.example.org", "example.org"]);
    }
}
