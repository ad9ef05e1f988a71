//! Search lists.
//!
//! Two flavours: the suffix list driving canonicalization, and the
//! ordinary `ndots` search used for MX queries.

use maildns_config::ResolverConfig;

/// Longest search list honoured.
pub const MAX_DNSRCH: usize = 6;

/// Search behaviour taken from the resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    pub domains: Vec<String>,
    pub default_domain: Option<String>,
    pub ndots: usize,
    pub dnsrch: bool,
    pub defnames: bool,
}

impl SearchSettings {
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            domains: config
                .search_domains()
                .into_iter()
                .map(|d| d.trim_end_matches('.').to_string())
                .filter(|d| !d.is_empty())
                .take(MAX_DNSRCH)
                .collect(),
            default_domain: config
                .default_domain
                .as_deref()
                .map(|d| d.trim_end_matches('.').to_string())
                .filter(|d| !d.is_empty()),
            ndots: usize::from(config.ndots),
            dnsrch: config.dnsrch,
            defnames: config.defnames,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from_config(&ResolverConfig::default())
    }
}

/// Ordered candidates for one lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchList {
    host: String,
    suffixes: Vec<String>,
}

impl SearchList {
    /// Builds the canonicalization suffix list for `host`.
    ///
    /// A name with a dot is tried unmodified first, so a foreign two-label
    /// name is not captured by a longer local suffix. A name without a
    /// trailing dot then gets every search domain; a dot-free name without
    /// a search list gets the default domain. A trailing dot means the
    /// name is tried exactly and nothing else.
    pub fn for_canonical(host: &str, settings: &SearchSettings) -> Self {
        let absolute = host.ends_with('.');
        let host = host.trim_end_matches('.');
        let dots = host.matches('.').count();

        let mut suffixes = Vec::new();
        if dots > 0 || absolute {
            suffixes.push(String::new());
        }

        if !absolute {
            if settings.dnsrch && !settings.domains.is_empty() {
                suffixes.extend(settings.domains.iter().cloned());
            } else if dots == 0 && settings.defnames {
                if let Some(domain) = &settings.default_domain {
                    suffixes.push(domain.clone());
                }
            }
        }

        Self {
            host: host.to_string(),
            suffixes,
        }
    }

    /// Builds the ordinary search list used for MX queries.
    ///
    /// Names with at least `ndots` dots are tried as given before the
    /// search domains; shorter names are tried after them.
    pub fn for_query(host: &str, settings: &SearchSettings) -> Self {
        let host_trimmed = host.trim_end_matches('.');
        if host.ends_with('.') {
            return Self {
                host: host_trimmed.to_string(),
                suffixes: vec![String::new()],
            };
        }

        let dots = host_trimmed.matches('.').count();
        let mut domains = Vec::new();
        if settings.dnsrch {
            domains.extend(settings.domains.iter().cloned());
        }
        if domains.is_empty() && settings.defnames && dots == 0 {
            domains.extend(settings.default_domain.iter().cloned());
        }

        let mut suffixes = Vec::with_capacity(domains.len() + 1);
        if dots >= settings.ndots {
            suffixes.push(String::new());
            suffixes.extend(domains);
        } else {
            suffixes.extend(domains);
            suffixes.push(String::new());
        }

        Self {
            host: host_trimmed.to_string(),
            suffixes,
        }
    }

    /// Returns the host without a trailing dot.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the suffixes in order; the empty string is the host itself.
    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    /// Returns true if nothing is to be tried.
    pub fn is_empty(&self) -> bool {
        self.suffixes.is_empty()
    }

    /// Joins the host with `suffix`.
    pub fn qualify(&self, suffix: &str) -> String {
        qualify(&self.host, suffix)
    }

    /// Returns the fully qualified candidates in order.
    pub fn names(&self) -> impl Iterator<Item = String> + '_ {
        self.suffixes.iter().map(|s| self.qualify(s))
    }
}

/// Joins `host` and `suffix` with a dot, or returns `host` for an empty suffix.
pub fn qualify(host: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        host.to_string()
    } else {
        format!("{host}.{suffix}")
    }
}
