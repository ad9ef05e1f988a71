//! Cache entry implementation.

use crate::policy::{InsertPolicy, Placement, Support, TlsaRecord};
use crate::MAX_TLSA_RR;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, trace};

bitflags! {
    /// State of a TLSA cache entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TlsaFlags: u8 {
        /// Created but never fetched.
        const NEW = 0x01;
        /// Holds at least one usable record.
        const SUPPORTED = 0x02;
        /// Saw at least one record that cannot be used.
        const UNSUPPORTED = 0x04;
        /// More records arrived than fit.
        const OVERFLOWED = 0x08;
        /// Never expires on its own.
        const NO_EXPIRE = 0x10;
        /// The MX answer leading here was DNSSEC-authenticated.
        const MX_AUTHENTICATED = 0x20;
    }
}

/// Classified outcome of the last fetch that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchError {
    /// The name does not exist.
    HostNotFound,
    /// The name exists but has no TLSA records.
    NoData,
    /// Temporary failure; retry later.
    TryAgain,
    /// Permanent server failure.
    NoRecovery,
}

impl FetchError {
    /// Returns true if the failure should be retried rather than cached.
    #[inline]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::TryAgain)
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::HostNotFound => "host not found",
            Self::NoData => "no data",
            Self::TryAgain => "try again",
            Self::NoRecovery => "no recovery",
        })
    }
}

/// What [`TlsaEntry::insert`] did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was added.
    Inserted,
    /// The record overwrote a weaker one.
    Replaced,
    /// An identical record was already present.
    Duplicate,
    /// The entry was full; another record was dropped to make room.
    Evicted,
    /// The record is malformed and was not stored.
    Rejected,
}

/// TLSA records for one `(port, host)`.
#[derive(Debug, Clone)]
pub struct TlsaEntry {
    records: Vec<TlsaRecord>,
    flags: TlsaFlags,
    error: Option<FetchError>,
    expires: Option<Instant>,
    sni: Option<String>,
}

impl TlsaEntry {
    /// Creates an empty entry marked [`TlsaFlags::NEW`].
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            flags: TlsaFlags::NEW,
            error: None,
            expires: None,
            sni: None,
        }
    }

    /// Returns the stored records in policy order.
    #[inline]
    pub fn records(&self) -> &[TlsaRecord] {
        &self.records
    }

    /// Returns the number of stored records.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no records are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the flags.
    #[inline]
    pub const fn flags(&self) -> TlsaFlags {
        self.flags
    }

    /// Sets or clears flags.
    #[inline]
    pub fn set_flags(&mut self, flags: TlsaFlags, on: bool) {
        self.flags.set(flags, on);
    }

    /// Returns true if the entry has never been filled.
    #[inline]
    pub fn is_new(&self) -> bool {
        self.flags.contains(TlsaFlags::NEW)
    }

    /// Returns the error of the last fetch, if it failed.
    #[inline]
    pub const fn error(&self) -> Option<FetchError> {
        self.error
    }

    /// Records the outcome of a fetch.
    #[inline]
    pub fn set_error(&mut self, error: Option<FetchError>) {
        self.error = error;
    }

    /// Returns the expiry instant.
    #[inline]
    pub const fn expires(&self) -> Option<Instant> {
        self.expires
    }

    /// Sets the expiry instant.
    #[inline]
    pub fn set_expires(&mut self, at: Instant) {
        self.expires = Some(at);
    }

    /// Returns true once `now` reaches the expiry, unless the entry is
    /// pinned with [`TlsaFlags::NO_EXPIRE`].
    pub fn is_expired(&self, now: Instant) -> bool {
        if self.flags.contains(TlsaFlags::NO_EXPIRE) {
            return false;
        }
        self.expires.map_or(true, |at| now >= at)
    }

    /// Returns the name used for SNI, if one was set.
    #[inline]
    pub fn sni(&self) -> Option<&str> {
        self.sni.as_deref()
    }

    /// Sets the name used for SNI.
    pub fn set_sni(&mut self, sni: Option<String>) {
        self.sni = sni;
    }

    /// Empties the entry in place. [`TlsaFlags::NO_EXPIRE`] survives.
    pub fn clear(&mut self) {
        self.records.clear();
        self.flags &= TlsaFlags::NO_EXPIRE;
        self.error = None;
        self.expires = None;
        self.sni = None;
    }

    /// Adds a record according to `policy`.
    ///
    /// Invalid records are rejected. When the entry already holds
    /// [`MAX_TLSA_RR`] records, [`TlsaFlags::OVERFLOWED`] is set and the
    /// policy picks a record to drop.
    pub fn insert(&mut self, record: TlsaRecord, policy: &dyn InsertPolicy) -> InsertOutcome {
        match record.support() {
            Support::Invalid => {
                debug!(record = %record, "rejecting invalid TLSA record");
                return InsertOutcome::Rejected;
            }
            Support::Supported => self.flags.insert(TlsaFlags::SUPPORTED),
            Support::Unsupported => self.flags.insert(TlsaFlags::UNSUPPORTED),
        }

        match policy.place(&self.records, &record) {
            Placement::Duplicate => {
                trace!(record = %record, "duplicate TLSA record");
                InsertOutcome::Duplicate
            }
            Placement::Replace(index) if index < self.records.len() => {
                self.records[index] = record;
                InsertOutcome::Replaced
            }
            Placement::Replace(index) | Placement::Insert(index) => {
                let mut outcome = InsertOutcome::Inserted;
                let mut index = index.min(self.records.len());

                if self.records.len() >= MAX_TLSA_RR {
                    self.flags.insert(TlsaFlags::OVERFLOWED);
                    let victim = policy.evict(&self.records).min(self.records.len() - 1);
                    debug!(victim, "TLSA entry full, evicting");
                    self.records.remove(victim);
                    if victim < index {
                        index -= 1;
                    }
                    outcome = InsertOutcome::Evicted;
                }

                self.records.insert(index, record);
                outcome
            }
        }
    }
}

impl Default for TlsaEntry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ArrivalOrder;
    use std::time::Duration;

    fn supported(n: u16) -> TlsaRecord {
        let mut raw = vec![3, 1, 1];
        raw.extend_from_slice(&[0u8; 30]);
        raw.extend_from_slice(&n.to_be_bytes());
        TlsaRecord::new(raw)
    }

    #[test]
    fn test_duplicate_is_noop() {
        let mut entry = TlsaEntry::new();
        assert_eq!(entry.insert(supported(1), &ArrivalOrder), InsertOutcome::Inserted);
        assert_eq!(entry.insert(supported(1), &ArrivalOrder), InsertOutcome::Duplicate);
        assert_eq!(entry.len(), 1);
        assert!(entry.flags().contains(TlsaFlags::SUPPORTED));
    }

    #[test]
    fn test_overflow_caps_records() {
        let mut entry = TlsaEntry::new();
        let total = u16::try_from(MAX_TLSA_RR).unwrap() + 1;
        for n in 0..total {
            entry.insert(supported(n), &ArrivalOrder);
        }

        assert_eq!(entry.len(), MAX_TLSA_RR);
        assert!(entry.flags().contains(TlsaFlags::OVERFLOWED));
        // all supported: the newest stored record made way
        assert_eq!(entry.records().last(), Some(&supported(total - 1)));
        assert!(!entry.records().contains(&supported(total - 2)));
    }

    #[test]
    fn test_invalid_rejected() {
        let mut entry = TlsaEntry::new();
        let outcome = entry.insert(TlsaRecord::new(vec![3, 1, 1, 0]), &ArrivalOrder);
        assert_eq!(outcome, InsertOutcome::Rejected);
        assert!(entry.is_empty());
        assert_eq!(entry.flags(), TlsaFlags::NEW);
    }

    #[test]
    fn test_unsupported_flag_and_replacement() {
        let mut entry = TlsaEntry::new();
        let mut pkix = vec![1, 1, 1];
        pkix.extend_from_slice(&[0x44; 32]);
        let mut dane = pkix.clone();
        dane[0] = 3;

        entry.insert(TlsaRecord::new(pkix), &ArrivalOrder);
        assert!(entry.flags().contains(TlsaFlags::UNSUPPORTED));
        assert_eq!(entry.insert(TlsaRecord::new(dane.clone()), &ArrivalOrder), InsertOutcome::Replaced);
        assert_eq!(entry.len(), 1);
        assert_eq!(entry.records()[0].as_bytes(), &dane[..]);
    }

    #[test]
    fn test_expiry_and_clear() {
        let now = Instant::now();
        let mut entry = TlsaEntry::new();
        assert!(entry.is_expired(now));

        entry.set_expires(now + Duration::from_secs(60));
        assert!(!entry.is_expired(now));
        assert!(entry.is_expired(now + Duration::from_secs(60)));

        entry.set_flags(TlsaFlags::NO_EXPIRE, true);
        assert!(!entry.is_expired(now + Duration::from_secs(3600)));

        entry.insert(supported(1), &ArrivalOrder);
        entry.set_error(Some(FetchError::TryAgain));
        entry.clear();
        assert!(entry.is_empty());
        assert_eq!(entry.flags(), TlsaFlags::NO_EXPIRE);
        assert_eq!(entry.error(), None);
        assert_eq!(entry.expires(), None);
    }
}
