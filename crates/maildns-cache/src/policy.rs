//! Record classification and insertion order.
//!
//! Classification follows RFC 7672: an MTA can use DANE-TA(2) and
//! DANE-EE(3) records; PKIX usages and unknown parameters are
//! "unsupported" but still show that the domain publishes DANE.

use data_encoding::HEXLOWER;
use maildns_proto::rdata::{TlsaMatchingType, TlsaSelector, TlsaUsage, TLSA};
use std::fmt;

/// How usable a TLSA record is for SMTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Support {
    /// DANE-TA or DANE-EE with a known selector and matching type.
    Supported,
    /// Well formed but not usable for SMTP.
    Unsupported,
    /// Too short, or a digest of the wrong length. Never stored.
    Invalid,
}

/// Classifies raw TLSA RDATA.
pub fn classify(rdata: &[u8]) -> Support {
    if rdata.len() < TLSA::MIN_LEN {
        return Support::Invalid;
    }

    let matching_type = TlsaMatchingType::from(rdata[2]);
    if let Some(len) = matching_type.digest_len() {
        if rdata.len() - 3 != len {
            return Support::Invalid;
        }
    }

    let usage_ok = matches!(TlsaUsage::from(rdata[0]), TlsaUsage::DaneTa | TlsaUsage::DaneEe);
    let selector_ok = !matches!(TlsaSelector::from(rdata[1]), TlsaSelector::Other(_));
    let mtype_ok = !matches!(matching_type, TlsaMatchingType::Other(_));

    if usage_ok && selector_ok && mtype_ok {
        Support::Supported
    } else {
        Support::Unsupported
    }
}

/// A cached TLSA record: the RDATA exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TlsaRecord {
    raw: Vec<u8>,
    support: Support,
}

impl TlsaRecord {
    /// Wraps raw RDATA and classifies it.
    pub fn new(raw: impl Into<Vec<u8>>) -> Self {
        let raw = raw.into();
        let support = classify(&raw);
        Self { raw, support }
    }

    /// Returns the raw RDATA.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Returns the classification.
    #[inline]
    pub const fn support(&self) -> Support {
        self.support
    }

    /// Returns true if the record is usable for SMTP.
    #[inline]
    pub fn is_supported(&self) -> bool {
        self.support == Support::Supported
    }

    /// Returns the usage octet.
    pub fn usage(&self) -> Option<u8> {
        self.raw.first().copied()
    }

    /// Returns the selector, matching type, and association data, the
    /// part that identifies the certificate independent of usage.
    pub fn association(&self) -> &[u8] {
        self.raw.get(1..).unwrap_or_default()
    }
}

impl From<&TLSA> for TlsaRecord {
    fn from(tlsa: &TLSA) -> Self {
        Self::new(tlsa.as_bytes())
    }
}

impl fmt::Display for TlsaRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.raw.get(..3) {
            Some(params) if self.raw.len() > 3 => write!(
                f,
                "{} {} {} {}",
                params[0],
                params[1],
                params[2],
                HEXLOWER.encode(&self.raw[3..])
            ),
            _ => write!(f, "\\# {} {}", self.raw.len(), HEXLOWER.encode(&self.raw)),
        }
    }
}

/// Where a candidate record goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// An identical record is already stored.
    Duplicate,
    /// Overwrite the record at this index.
    Replace(usize),
    /// Insert at this index, shifting later records.
    Insert(usize),
}

/// Ordering policy for records within one entry.
///
/// The order is not fixed by any RFC; the cache only requires that a
/// byte-identical record is reported as [`Placement::Duplicate`].
pub trait InsertPolicy: Send + Sync {
    /// Chooses the placement of `candidate` among `existing`.
    fn place(&self, existing: &[TlsaRecord], candidate: &TlsaRecord) -> Placement;

    /// Chooses the record to drop when the entry is full.
    ///
    /// Only called with a non-empty slice.
    fn evict(&self, existing: &[TlsaRecord]) -> usize;
}

/// Default policy: records stay in arrival order.
///
/// A supported record takes over the slot of an unsupported one that
/// names the same certificate (same selector, matching type, and data),
/// and eviction removes the newest unsupported record first.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrivalOrder;

impl InsertPolicy for ArrivalOrder {
    fn place(&self, existing: &[TlsaRecord], candidate: &TlsaRecord) -> Placement {
        if existing.iter().any(|r| r.raw == candidate.raw) {
            return Placement::Duplicate;
        }

        if candidate.is_supported() {
            let superseded = existing.iter().position(|r| {
                r.support == Support::Unsupported && r.association() == candidate.association()
            });
            if let Some(index) = superseded {
                return Placement::Replace(index);
            }
        }

        Placement::Insert(existing.len())
    }

    fn evict(&self, existing: &[TlsaRecord]) -> usize {
        existing
            .iter()
            .rposition(|r| !r.is_supported())
            .unwrap_or(existing.len().saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rdata(usage: u8, selector: u8, mtype: u8, fill: u8, len: usize) -> Vec<u8> {
        let mut raw = vec![usage, selector, mtype];
        raw.extend(std::iter::repeat(fill).take(len));
        raw
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&rdata(3, 1, 1, 0xAA, 32)), Support::Supported);
        assert_eq!(classify(&rdata(2, 0, 2, 0xAA, 64)), Support::Supported);
        assert_eq!(classify(&rdata(3, 0, 0, 0xAA, 300)), Support::Supported);
        assert_eq!(classify(&rdata(1, 1, 1, 0xAA, 32)), Support::Unsupported);
        assert_eq!(classify(&rdata(0, 1, 1, 0xAA, 32)), Support::Unsupported);
        assert_eq!(classify(&rdata(3, 7, 1, 0xAA, 32)), Support::Unsupported);
        assert_eq!(classify(&rdata(3, 1, 9, 0xAA, 5)), Support::Unsupported);
    }

    #[test]
    fn test_classify_invalid() {
        assert_eq!(classify(&[3, 1, 1]), Support::Invalid);
        assert_eq!(classify(&rdata(3, 1, 1, 0xAA, 31)), Support::Invalid);
        assert_eq!(classify(&rdata(3, 1, 2, 0xAA, 32)), Support::Invalid);
    }

    #[test]
    fn test_arrival_order_placement() {
        let a = TlsaRecord::new(rdata(3, 1, 1, 0x01, 32));
        let b = TlsaRecord::new(rdata(2, 0, 1, 0x02, 32));
        let existing = vec![a.clone(), b];

        assert_eq!(ArrivalOrder.place(&existing, &a), Placement::Duplicate);

        let c = TlsaRecord::new(rdata(3, 1, 1, 0x03, 32));
        assert_eq!(ArrivalOrder.place(&existing, &c), Placement::Insert(2));
    }

    #[test]
    fn test_supported_supersedes_unsupported() {
        let pkix = TlsaRecord::new(rdata(1, 1, 1, 0x07, 32));
        let other = TlsaRecord::new(rdata(3, 0, 1, 0x08, 32));
        let existing = vec![other, pkix];

        let dane = TlsaRecord::new(rdata(3, 1, 1, 0x07, 32));
        assert_eq!(ArrivalOrder.place(&existing, &dane), Placement::Replace(1));

        // an unsupported newcomer never replaces anything
        let pkix_again = TlsaRecord::new(rdata(0, 1, 1, 0x07, 32));
        assert_eq!(ArrivalOrder.place(&existing, &pkix_again), Placement::Insert(2));
    }

    #[test]
    fn test_eviction_prefers_unsupported() {
        let records = vec![
            TlsaRecord::new(rdata(1, 1, 1, 0x01, 32)),
            TlsaRecord::new(rdata(3, 1, 1, 0x02, 32)),
            TlsaRecord::new(rdata(0, 1, 1, 0x03, 32)),
            TlsaRecord::new(rdata(3, 1, 1, 0x04, 32)),
        ];
        assert_eq!(ArrivalOrder.evict(&records), 2);
        assert_eq!(ArrivalOrder.evict(&records[1..2]), 0);
    }

    #[test]
    fn test_display() {
        let record = TlsaRecord::new(vec![3, 1, 1, 0xAB, 0xCD]);
        assert_eq!(record.to_string(), "3 1 1 abcd");
    }
}
