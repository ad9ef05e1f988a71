//! Canonical name resolution.
//!
//! For every candidate from [`SearchList::for_canonical`] the address
//! types are queried first and MX last. An answer of the queried type is a
//! match; a CNAME restarts the search at its target. With wildcard MX
//! records in the local domains, an MX match at a search suffix proves
//! nothing, so it is only remembered and used when nothing better turns
//! up.

use crate::lookup::{Lookup, LookupError, QueryOptions};
use crate::resolver::MailResolver;
use crate::search::SearchList;
use maildns_cache::{Clock, TlsaStore};
use maildns_metrics::metrics;
use maildns_proto::{DnsReply, RecordType};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use tracing::{debug, instrument, trace, warn};

/// CNAME hops followed before giving up.
pub const MAX_CNAME_DEPTH: usize = 10;

/// Outcome of a canonicalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonStatus {
    Success,
    /// No candidate exists.
    NotFound,
    /// A lookup failed temporarily and nothing else matched.
    TempFail,
    /// The CNAME chain is too long or loops.
    NoRecovery,
}

impl CanonStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotFound => "not_found",
            Self::TempFail => "tempfail",
            Self::NoRecovery => "no_recovery",
        }
    }
}

impl fmt::Display for CanonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`MailResolver::canonicalize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonResult {
    /// The canonical name without a trailing dot, or the input on failure.
    pub host: String,
    pub status: CanonStatus,
    /// Smallest TTL along the chain.
    pub ttl: u32,
    /// Every reply along the chain carried the AD flag.
    pub authenticated: bool,
}

impl CanonResult {
    fn failed(host: &str, status: CanonStatus) -> Self {
        Self {
            host: host.trim_end_matches('.').to_string(),
            status,
            ttl: 0,
            authenticated: false,
        }
    }
}

/// What one reply says about a candidate.
///
/// A CNAME wins over records of the queried type, so the search restarts
/// at the target and the canonical name is the end of the chain.
enum Answer {
    /// Records of the queried type.
    Match { ttl: u32 },
    /// An alias to follow.
    Alias { target: String, ttl: u32 },
    /// Nothing usable.
    Empty,
}

fn inspect(reply: &DnsReply, rtype: RecordType) -> Answer {
    let alias = reply.answers().iter().find_map(|rr| {
        rr.rdata().as_cname().map(|target| Answer::Alias {
            target: target.to_host(),
            ttl: rr.ttl(),
        })
    });
    if let Some(alias) = alias {
        return alias;
    }

    reply
        .answers_of_type(rtype)
        .map(|rr| rr.ttl())
        .min()
        .map_or(Answer::Empty, |ttl| Answer::Match { ttl })
}

impl<L: Lookup, S: TlsaStore, C: Clock> MailResolver<L, S, C> {
    /// Finds the canonical name of `host`.
    ///
    /// With `try_mx` an MX record also counts as existence at every search
    /// suffix; the unmodified name is always checked for MX.
    #[instrument(skip(self), fields(status = tracing::field::Empty))]
    pub fn canonicalize(&mut self, host: &str, try_mx: bool) -> CanonResult {
        let result = self.canonicalize_inner(host, try_mx);
        tracing::Span::current().record("status", result.status.as_str());
        metrics().record_canonicalization(result.status.as_str());
        result
    }

    pub(crate) fn canonicalize_inner(&self, host: &str, try_mx: bool) -> CanonResult {
        let dnssec = self.settings.dane_enabled;
        let opts = QueryOptions { dnssec };
        let mut authenticated = dnssec;
        let mut chain_ttl = u32::MAX;
        let mut name = host.to_string();

        for depth in 0..=MAX_CNAME_DEPTH {
            let list = SearchList::for_canonical(&name, &self.settings.search);
            let mut wildcard: Option<(String, u32, bool)> = None;
            let mut transient = false;
            let mut alias: Option<(String, u32, bool)> = None;

            'suffixes: for suffix in list.suffixes() {
                let qname = list.qualify(suffix);
                let mut qtypes: SmallVec<[RecordType; 3]> =
                    SmallVec::from_slice(self.settings.address_types());
                if try_mx || suffix.is_empty() {
                    qtypes.push(RecordType::MX);
                }

                for rtype in qtypes {
                    trace!(%qname, %rtype, "canonicalization query");
                    let wire = match self.query(&qname, rtype, opts) {
                        Ok(wire) => wire,
                        Err(LookupError::NoData) => continue,
                        Err(LookupError::HostNotFound | LookupError::NoRecovery) => {
                            continue 'suffixes
                        }
                        Err(err) if suffix.is_empty() => {
                            debug!(%qname, error = %err, "lookup failed, trying next type");
                            transient = true;
                            continue;
                        }
                        Err(err) => {
                            debug!(%qname, error = %err, "lookup failed temporarily");
                            return CanonResult::failed(host, CanonStatus::TempFail);
                        }
                    };

                    let reply = match DnsReply::parse(&wire) {
                        Ok(reply) => reply,
                        Err(err) => {
                            warn!(%qname, error = %err, "unreadable reply");
                            continue 'suffixes;
                        }
                    };
                    metrics().record_dropped_records(reply.dropped());
                    let reply_authenticated = reply.is_authenticated();

                    match inspect(&reply, rtype) {
                        Answer::Match { ttl }
                            if rtype == RecordType::MX
                                && self.settings.has_wildcard_mx
                                && !suffix.is_empty() =>
                        {
                            trace!(%qname, "possible wildcard MX match");
                            if wildcard.is_none() {
                                wildcard = Some((qname.clone(), ttl, reply_authenticated));
                            }
                        }
                        Answer::Match { ttl } => {
                            return self.canonical(
                                qname,
                                chain_ttl.min(ttl),
                                authenticated && reply_authenticated,
                            );
                        }
                        Answer::Alias { ttl, .. } if self.settings.dont_expand_cnames => {
                            return self.canonical(
                                qname,
                                chain_ttl.min(ttl),
                                authenticated && reply_authenticated,
                            );
                        }
                        Answer::Alias { target, ttl } => {
                            alias = Some((target, ttl, reply_authenticated));
                            break 'suffixes;
                        }
                        Answer::Empty => {}
                    }
                }
            }

            if let Some((target, ttl, reply_authenticated)) = alias {
                if depth == MAX_CNAME_DEPTH {
                    warn!(host, "CNAME chain too long");
                    return CanonResult::failed(host, CanonStatus::NoRecovery);
                }
                debug!(from = %name, to = %target, "following CNAME");
                chain_ttl = chain_ttl.min(ttl);
                authenticated &= reply_authenticated;
                name = format!("{target}.");
                continue;
            }

            if let Some((qname, ttl, reply_authenticated)) = wildcard {
                debug!(%qname, "accepting wildcard MX match");
                return self.canonical(qname, chain_ttl.min(ttl), authenticated && reply_authenticated);
            }

            let status = if transient {
                CanonStatus::TempFail
            } else {
                CanonStatus::NotFound
            };
            return CanonResult::failed(host, status);
        }

        CanonResult::failed(host, CanonStatus::NoRecovery)
    }

    /// Finishes a successful match, appending the local domain to a name
    /// that is still dot-free.
    fn canonical(&self, mut host: String, ttl: u32, authenticated: bool) -> CanonResult {
        if !host.contains('.') {
            if let Some(domain) = &self.settings.search.default_domain {
                host = format!("{host}.{domain}");
            }
        }
        CanonResult {
            host,
            status: CanonStatus::Success,
            ttl,
            authenticated,
        }
    }
}
