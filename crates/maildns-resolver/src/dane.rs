//! TLSA fetch for opportunistic DANE.
//!
//! Records are looked up at `_{port}._tcp.{host}` and kept in the
//! [`TlsaStore`] under [`tlsa_key`]. An entry is served from the store until
//! it expires; a transient failure is cached for the negative TTL only, so
//! the next delivery attempt asks again.

use crate::lookup::{Lookup, LookupError, QueryOptions};
use crate::resolver::MailResolver;
use maildns_cache::{
    expiry_for, tlsa_key, Clock, FetchError, InsertOutcome, TlsaEntry, TlsaFlags, TlsaRecord,
    TlsaStore,
};
use maildns_metrics::metrics;
use maildns_proto::{DnsReply, RecordType};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// CNAME hops followed from the TLSA owner name.
pub const MAX_TLSA_CNAME_DEPTH: usize = 1;

/// Outcome of [`MailResolver::get_tlsa`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TlsaStatus {
    /// Served from an unexpired entry.
    Cached,
    /// Fetched from the DNS.
    Fetched,
    /// No usable TLSA records exist.
    NotFound,
    /// The fetch failed temporarily, or the entry could not be stored.
    TempFail,
    /// DANE is turned off.
    Disabled,
}

impl TlsaStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cached => "cached",
            Self::Fetched => "fetched",
            Self::NotFound => "not_found",
            Self::TempFail => "tempfail",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for TlsaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for [`MailResolver::get_tlsa`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TlsaOptions {
    /// Query the DNS when nothing usable is cached.
    pub fetch: bool,
    /// The MX answer was DNSSEC-authenticated; require DNSSEC on the TLSA
    /// query too.
    pub authenticated: bool,
    /// Pin the entry so it never expires on its own.
    pub no_expire: bool,
}

impl TlsaOptions {
    /// Options that fetch on a miss.
    pub const fn fetch() -> Self {
        Self {
            fetch: true,
            authenticated: false,
            no_expire: false,
        }
    }
}

/// Result of [`MailResolver::get_tlsa`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsaLookup {
    /// Records now in the entry.
    pub count: usize,
    pub status: TlsaStatus,
}

impl TlsaLookup {
    const fn empty(status: TlsaStatus) -> Self {
        Self { count: 0, status }
    }

    fn from_entry(entry: &TlsaEntry) -> Self {
        match entry.error() {
            Some(err) if err.is_transient() => Self::empty(TlsaStatus::TempFail),
            Some(_) => Self::empty(TlsaStatus::NotFound),
            None => Self {
                count: entry.len(),
                status: TlsaStatus::Cached,
            },
        }
    }
}

impl From<&LookupError> for FetchError {
    fn from(err: &LookupError) -> Self {
        match err {
            LookupError::HostNotFound => Self::HostNotFound,
            LookupError::NoData => Self::NoData,
            LookupError::TryAgain | LookupError::Io(_) => Self::TryAgain,
            LookupError::NoRecovery => Self::NoRecovery,
        }
    }
}

/// Records of one fetch with their TTLs.
type Fetched = Vec<(TlsaRecord, u32)>;

impl<L: Lookup, S: TlsaStore, C: Clock> MailResolver<L, S, C> {
    /// Returns the TLSA records for `host` on `port`, fetching them if the
    /// cache has nothing fresh.
    ///
    /// `sni` is remembered on the entry for the TLS handshake. A non-zero
    /// `mx_ttl` caps the lifetime of the entry.
    #[instrument(skip(self), fields(status = tracing::field::Empty))]
    pub fn get_tlsa(
        &mut self,
        host: &str,
        sni: Option<&str>,
        opts: TlsaOptions,
        mx_ttl: u32,
        port: u16,
    ) -> TlsaLookup {
        let lookup = self.get_tlsa_inner(host, sni, opts, mx_ttl, port);
        tracing::Span::current().record("status", lookup.status.as_str());
        metrics().record_tlsa_lookup(lookup.status.as_str());
        lookup
    }

    fn get_tlsa_inner(
        &mut self,
        host: &str,
        sni: Option<&str>,
        opts: TlsaOptions,
        mx_ttl: u32,
        port: u16,
    ) -> TlsaLookup {
        if !self.settings.dane_enabled {
            return TlsaLookup::empty(TlsaStatus::Disabled);
        }

        let key = tlsa_key(port, host);
        let now = self.clock.now();

        if !opts.fetch {
            return match self.store.get(&key) {
                Some(entry) if !entry.is_new() && !entry.is_expired(now) => {
                    TlsaLookup::from_entry(entry)
                }
                _ => TlsaLookup::empty(TlsaStatus::NotFound),
            };
        }

        match self.store.find_or_create(&key, now) {
            Ok(entry) if !entry.is_new() && !entry.is_expired(now) => {
                return TlsaLookup::from_entry(entry);
            }
            Ok(entry) => {
                if !entry.is_new() {
                    debug!(%key, "TLSA entry expired, refetching");
                }
                entry.clear();
            }
            Err(err) => {
                warn!(%key, error = %err, "cannot store TLSA entry");
                return TlsaLookup::empty(TlsaStatus::TempFail);
            }
        }

        let qname = format!("_{port}._tcp.{}", host.trim_end_matches('.'));
        let fetched = self.fetch_tlsa(&qname, opts.authenticated, 0);
        let policy = &*self.policy;
        let ttl_policy = self.settings.ttl;

        let entry = match self.store.find_or_create(&key, now) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(%key, error = %err, "TLSA entry vanished during fetch");
                return TlsaLookup::empty(TlsaStatus::TempFail);
            }
        };
        entry.set_flags(TlsaFlags::NEW, false);
        entry.set_flags(TlsaFlags::MX_AUTHENTICATED, opts.authenticated);
        if opts.no_expire {
            entry.set_flags(TlsaFlags::NO_EXPIRE, true);
        }
        entry.set_sni(sni.map(str::to_string));

        match fetched {
            Ok(records) => {
                let mut min_ttl: Option<u32> = None;
                for (record, ttl) in records {
                    match entry.insert(record, policy) {
                        InsertOutcome::Rejected | InsertOutcome::Duplicate => {}
                        _ => min_ttl = Some(min_ttl.map_or(ttl, |m| m.min(ttl))),
                    }
                }

                let flags = entry.flags();
                if flags.contains(TlsaFlags::UNSUPPORTED) {
                    info!(
                        %key,
                        supported = flags.contains(TlsaFlags::SUPPORTED),
                        "domain publishes TLSA records that cannot be used"
                    );
                }
                if flags.contains(TlsaFlags::OVERFLOWED) {
                    warn!(%key, "too many TLSA records, some were dropped");
                }

                if entry.is_empty() {
                    entry.set_error(Some(FetchError::NoData));
                    entry.set_expires(expiry_for(now, ttl_policy.positive(None, mx_ttl)));
                    return TlsaLookup::empty(TlsaStatus::NotFound);
                }

                entry.set_expires(expiry_for(now, ttl_policy.positive(min_ttl, mx_ttl)));
                debug!(%key, count = entry.len(), "stored TLSA records");
                TlsaLookup {
                    count: entry.len(),
                    status: TlsaStatus::Fetched,
                }
            }
            Err(err) => {
                let fetch_error = FetchError::from(&err);
                entry.set_error(Some(fetch_error));
                if fetch_error.is_transient() {
                    debug!(%key, error = %err, "TLSA lookup failed temporarily");
                    entry.set_expires(expiry_for(now, ttl_policy.negative()));
                    TlsaLookup::empty(TlsaStatus::TempFail)
                } else {
                    debug!(%key, error = %err, "no TLSA records");
                    entry.set_expires(expiry_for(now, ttl_policy.positive(None, mx_ttl)));
                    TlsaLookup::empty(TlsaStatus::NotFound)
                }
            }
        }
    }

    /// Queries TLSA at `qname`, following at most
    /// [`MAX_TLSA_CNAME_DEPTH`] CNAMEs when the answer has no TLSA records.
    ///
    /// A reply to a DNSSEC query that comes back without the AD flag is
    /// worthless for DANE and counts as no data.
    fn fetch_tlsa(&self, qname: &str, dnssec: bool, depth: usize) -> Result<Fetched, LookupError> {
        let wire = self.query(qname, RecordType::TLSA, QueryOptions { dnssec })?;
        let reply = DnsReply::parse(&wire).map_err(|err| {
            warn!(qname, error = %err, "unreadable TLSA reply");
            LookupError::NoRecovery
        })?;
        metrics().record_dropped_records(reply.dropped());

        if dnssec && !reply.is_authenticated() {
            debug!(qname, "TLSA reply not authenticated, ignoring");
            return Err(LookupError::NoData);
        }

        let records: Fetched = reply
            .answers_of_type(RecordType::TLSA)
            .filter_map(|rr| rr.rdata().as_tlsa().map(|tlsa| (TlsaRecord::from(tlsa), rr.ttl())))
            .collect();
        if !records.is_empty() {
            return Ok(records);
        }

        match reply.cname_target() {
            Some(target) if depth < MAX_TLSA_CNAME_DEPTH => {
                let target = target.to_host();
                debug!(qname, %target, "following TLSA CNAME");
                self.fetch_tlsa(&target, dnssec, depth + 1)
            }
            Some(_) => {
                debug!(qname, "TLSA CNAME chain too long");
                Err(LookupError::NoData)
            }
            None => Err(LookupError::NoData),
        }
    }

    /// Returns the cached entry for `host` on `port`, if any.
    pub fn tlsa_entry(&self, host: &str, port: u16) -> Option<&TlsaEntry> {
        self.store.get(&tlsa_key(port, host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_fetch_error_mapping() {
        assert_eq!(FetchError::from(&LookupError::NoData), FetchError::NoData);
        assert_eq!(FetchError::from(&LookupError::TryAgain), FetchError::TryAgain);
        assert_eq!(
            FetchError::from(&LookupError::Io(io::Error::from(io::ErrorKind::TimedOut))),
            FetchError::TryAgain
        );
        assert_eq!(FetchError::from(&LookupError::NoRecovery), FetchError::NoRecovery);
    }

    #[test]
    fn test_lookup_from_entry() {
        let mut entry = TlsaEntry::new();
        assert_eq!(TlsaLookup::from_entry(&entry).status, TlsaStatus::Cached);

        entry.set_error(Some(FetchError::TryAgain));
        assert_eq!(TlsaLookup::from_entry(&entry).status, TlsaStatus::TempFail);

        entry.set_error(Some(FetchError::HostNotFound));
        assert_eq!(TlsaLookup::from_entry(&entry), TlsaLookup::empty(TlsaStatus::NotFound));
    }
}
