//! MX resolution.

use crate::canon::CanonStatus;
use crate::dane::TlsaOptions;
use crate::lookup::{Lookup, LookupError, QueryOptions};
use crate::resolver::{is_bracketed, MailResolver};
use maildns_cache::{Clock, TlsaStore};
use maildns_metrics::metrics;
use maildns_proto::{MxWalker, RecordType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;
use tracing::{debug, instrument, warn};

/// Most MX hosts kept for one domain.
pub const MAX_MX_HOSTS: usize = 35;

/// TTL reported when no record supplied one.
pub const DEFAULT_MX_TTL: u32 = 3600;

/// Outcome of an MX resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MxStatus {
    /// The host list is usable.
    Success,
    /// This host is the domain's best MX and has nowhere to relay to.
    ConfigError,
    /// The domain does not exist.
    NotFound,
    /// Temporary failure; requeue.
    TempFail,
    /// The domain publishes `MX 0 .` and accepts no mail (RFC 7505).
    NullMx,
}

impl MxStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ConfigError => "config_error",
            Self::NotFound => "not_found",
            Self::TempFail => "tempfail",
            Self::NullMx => "null_mx",
        }
    }

    #[inline]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for MxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One destination host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MxHost {
    pub preference: u16,
    /// Tie-break among equal preferences; zero for the local host.
    pub weight: u16,
    /// Host name with a trailing dot, or a bracketed address literal.
    pub host: String,
}

impl MxHost {
    fn single(host: String) -> Self {
        Self {
            preference: 0,
            weight: 0,
            host,
        }
    }
}

impl fmt::Display for MxHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.preference, self.host)
    }
}

/// Result of [`MailResolver::resolve_mx`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MxResolution {
    /// Destinations in the order they should be tried.
    pub hosts: Vec<MxHost>,
    pub status: MxStatus,
    /// Smallest TTL among the records used, in seconds.
    pub ttl: u32,
    /// The MX answer carried the AD flag.
    pub authenticated: bool,
}

impl MxResolution {
    fn failed(status: MxStatus) -> Self {
        Self {
            hosts: Vec::new(),
            status,
            ttl: 0,
            authenticated: false,
        }
    }

    fn single(host: String, ttl: u32) -> Self {
        Self {
            hosts: vec![MxHost::single(host)],
            status: MxStatus::Success,
            ttl,
            authenticated: false,
        }
    }

    /// Returns the host names in order.
    pub fn host_names(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(|h| h.host.as_str())
    }
}

/// Options for [`MailResolver::resolve_mx`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MxOptions {
    /// Drop this host and everything at or behind its preference.
    pub local_exclusion: bool,
    /// Use the fallback MX host when resolution fails or is empty.
    pub fallback: bool,
    /// Destination port; with DANE enabled, TLSA records are fetched for it.
    pub port: Option<u16>,
    /// Ask for DNSSEC status on the MX query.
    pub dnssec: bool,
}

impl Default for MxOptions {
    fn default() -> Self {
        Self {
            local_exclusion: true,
            fallback: true,
            port: None,
            dnssec: false,
        }
    }
}

/// How to fall back to the host itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Punt {
    /// Use the name as given.
    AsIs,
    /// Canonicalize; the domain exists but has no MX.
    NoData,
    /// Canonicalize; the domain is unknown to the DNS.
    NotFound,
}

/// Returns the address inside a bracketed literal, if it is one.
fn literal_address(inner: &str) -> Option<IpAddr> {
    let inner = inner
        .get(..5)
        .filter(|p| p.eq_ignore_ascii_case("ipv6:"))
        .map_or(inner, |_| &inner[5..]);
    inner.parse().ok()
}

impl<L: Lookup, S: TlsaStore, C: Clock> MailResolver<L, S, C> {
    /// Resolves the mail exchangers for `host`.
    #[instrument(skip(self), fields(status = tracing::field::Empty))]
    pub fn resolve_mx(&mut self, host: &str, opts: MxOptions) -> MxResolution {
        let resolution = self.resolve_mx_inner(host, opts);
        tracing::Span::current().record("status", resolution.status.as_str());
        metrics().record_mx_resolution(resolution.status.as_str());
        debug!(
            hosts = resolution.hosts.len(),
            ttl = resolution.ttl,
            authenticated = resolution.authenticated,
            "MX resolution finished"
        );
        resolution
    }

    pub(crate) fn resolve_mx_inner(&mut self, host: &str, opts: MxOptions) -> MxResolution {
        let want_fallback = opts.fallback
            && self
                .settings
                .fallback_mx
                .as_deref()
                .is_some_and(|fallback| !self.settings.is_local(fallback));

        let mut seen_local = false;
        let mut resolution = if is_bracketed(host) {
            self.punt(host, Punt::AsIs, DEFAULT_MX_TTL)
        } else {
            let dnssec = opts.dnssec || (self.settings.dane_enabled && opts.port.is_some());
            let query_opts = QueryOptions { dnssec };

            let reply = if self.settings.use_search {
                self.query_search(host, RecordType::MX, query_opts)
            } else {
                self.query(host, RecordType::MX, query_opts)
            };

            match reply {
                Ok(reply) => {
                    let (resolution, local) = self.mx_from_reply(host, &reply, opts, dnssec);
                    seen_local = local;
                    resolution
                }
                Err(LookupError::NoData) => self.punt(host, Punt::NoData, DEFAULT_MX_TTL),
                Err(LookupError::HostNotFound) => self.punt(host, Punt::NotFound, DEFAULT_MX_TTL),
                Err(LookupError::NoRecovery) => self.punt(host, Punt::AsIs, DEFAULT_MX_TTL),
                Err(err) => {
                    debug!(host, error = %err, "MX query failed temporarily");
                    if want_fallback {
                        let hosts = self.fallback_hosts();
                        if !hosts.is_empty() {
                            return MxResolution {
                                hosts,
                                status: MxStatus::Success,
                                ttl: DEFAULT_MX_TTL,
                                authenticated: false,
                            };
                        }
                    }
                    return MxResolution::failed(MxStatus::TempFail);
                }
            }
        };

        if resolution.status.is_success() {
            if let Some(port) = opts.port {
                self.prefetch_tlsa(&resolution, port);
            }
        }

        if resolution.hosts.is_empty() && resolution.status == MxStatus::NotFound
            && want_fallback
            && !seen_local
        {
            let hosts = self.fallback_hosts();
            if !hosts.is_empty() {
                debug!(host, count = hosts.len(), "handing unknown domain to fallback MX");
                resolution.hosts = hosts;
                resolution.status = MxStatus::Success;
            }
        }

        resolution
    }

    /// Decodes the MX answer and applies exclusion, ordering, and dedup.
    ///
    /// Also returns whether the local host appeared in the answer.
    fn mx_from_reply(
        &mut self,
        host: &str,
        reply: &[u8],
        opts: MxOptions,
        dnssec: bool,
    ) -> (MxResolution, bool) {
        let mut walker = match MxWalker::new(reply) {
            Ok(walker) => walker,
            Err(err) => {
                warn!(host, error = %err, "unreadable MX reply");
                return (self.punt(host, Punt::AsIs, DEFAULT_MX_TTL), false);
            }
        };
        let authenticated = dnssec && walker.header().is_authentic_data();

        let mut hosts = Vec::new();
        let mut ttl = u32::MAX;
        let mut seen_null = false;
        let mut local_pref: Option<u16> = None;

        for answer in walker.by_ref() {
            ttl = ttl.min(answer.ttl);

            if answer.is_null() {
                seen_null = true;
                continue;
            }
            let name = answer.exchange.to_host();
            if name.is_empty() {
                debug!(host, preference = answer.preference, "ignoring MX with empty target");
                continue;
            }

            let weight = if self.settings.is_local(&name) {
                debug!(host, %name, preference = answer.preference, "found local host in MX list");
                if opts.local_exclusion {
                    local_pref = Some(local_pref.map_or(answer.preference, |p| p.min(answer.preference)));
                    continue;
                }
                0
            } else {
                self.seed.mx_weight(&name)
            };

            hosts.push(MxHost {
                preference: answer.preference,
                weight,
                host: format!("{name}."),
            });
        }
        metrics().record_dropped_records(walker.dropped());

        let ttl = if ttl == u32::MAX { DEFAULT_MX_TTL } else { ttl };

        hosts.sort_by_key(|h| (h.preference, h.weight));

        if let Some(local_pref) = local_pref {
            let cut = hosts
                .iter()
                .position(|h| h.preference >= local_pref)
                .unwrap_or(hosts.len());
            hosts.truncate(cut);
        }

        let mut seen = HashSet::with_capacity(hosts.len());
        hosts.retain(|h| seen.insert(h.host.to_ascii_lowercase()));

        if hosts.len() > MAX_MX_HOSTS {
            debug!(host, count = hosts.len(), "MX list too long, keeping the best");
            hosts.truncate(MAX_MX_HOSTS);
        }

        if !hosts.is_empty() {
            let resolution = MxResolution {
                hosts,
                status: MxStatus::Success,
                ttl,
                authenticated,
            };
            return (resolution, local_pref.is_some());
        }

        if local_pref.is_some() {
            return (self.local_is_best(host, ttl), true);
        }

        if seen_null {
            debug!(host, "domain publishes a null MX");
            let mut resolution = MxResolution::failed(MxStatus::NullMx);
            resolution.ttl = ttl;
            resolution.authenticated = authenticated;
            return (resolution, false);
        }

        (self.punt(host, Punt::AsIs, ttl), false)
    }

    /// The local host is the best MX and nothing ranks above it.
    fn local_is_best(&mut self, host: &str, ttl: u32) -> MxResolution {
        if self.settings.try_null_mx_list {
            match self.has_address(host) {
                Ok(true) => {
                    debug!(host, "local host is best MX, using the domain's address");
                    return MxResolution::single(format!("{}.", host.trim_end_matches('.')), ttl);
                }
                Ok(false) => {}
                Err(err) => {
                    debug!(host, error = %err, "address lookup failed temporarily");
                    return MxResolution::failed(MxStatus::TempFail);
                }
            }
        }

        warn!(host, "MX list points back to the local host");
        MxResolution::failed(MxStatus::ConfigError)
    }

    /// Falls back to the host itself as the only destination.
    fn punt(&mut self, host: &str, how: Punt, ttl: u32) -> MxResolution {
        if is_bracketed(host) {
            let inner = host
                .trim_start_matches('[')
                .split(']')
                .next()
                .unwrap_or_default();
            if literal_address(inner).is_some() {
                return MxResolution::single(host.to_string(), ttl);
            }

            let canon = self.canonicalize_inner(inner, false);
            return match canon.status {
                CanonStatus::Success => MxResolution::single(format!("{}.", canon.host), canon.ttl),
                CanonStatus::TempFail => MxResolution::failed(MxStatus::TempFail),
                _ => MxResolution::single(format!("{}.", inner.trim_end_matches('.')), ttl),
            };
        }

        let bare = host.trim_end_matches('.');
        if how == Punt::AsIs {
            return MxResolution::single(format!("{bare}."), ttl);
        }

        let canon = self.canonicalize_inner(host, false);
        match (canon.status, how) {
            (CanonStatus::Success, _) => {
                let mut resolution = MxResolution::single(format!("{}.", canon.host), canon.ttl);
                resolution.authenticated = canon.authenticated;
                resolution
            }
            (CanonStatus::TempFail, _) => MxResolution::failed(MxStatus::TempFail),
            (_, Punt::NotFound) => MxResolution::failed(MxStatus::NotFound),
            _ => MxResolution::single(format!("{bare}."), ttl),
        }
    }

    /// Warms the TLSA cache for every retained host.
    fn prefetch_tlsa(&mut self, resolution: &MxResolution, port: u16) {
        if !self.settings.dane_enabled {
            return;
        }
        let opts = TlsaOptions {
            fetch: true,
            authenticated: resolution.authenticated,
            no_expire: false,
        };
        for host in resolution.hosts.iter().filter(|h| !is_bracketed(&h.host)) {
            self.get_tlsa(&host.host, None, opts, resolution.ttl, port);
        }
    }

    /// Fallback hosts as MX entries behind everything else.
    fn fallback_hosts(&mut self) -> Vec<MxHost> {
        self.get_fallback_mx()
            .into_iter()
            .map(|host| MxHost {
                preference: u16::MAX,
                weight: 0,
                host,
            })
            .collect()
    }
}
