//! Host signatures.
//!
//! A signature names every destination a host list expands to, in
//! delivery order: hosts of equal MX preference are joined with `,`,
//! preference steps with `:`. Two recipients whose signatures match can
//! share one connection.
//!
//! ```text
//! example.org  ->  mx1.example.org.,mx2.example.org.:backup.example.net.
//! ```

use crate::lookup::Lookup;
use crate::mx::MxOptions;
use crate::resolver::{is_bracketed, ttl_duration, MailResolver};
use maildns_cache::{expiry_for, Clock, TlsaStore, NEGATIVE_TTL};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Longest signature kept, in bytes.
pub const MAX_HOST_SIGNATURE: usize = 8192;

/// Signatures already computed, with their expiry.
#[derive(Debug, Clone, Default)]
pub struct SignatureMemo {
    entries: HashMap<String, (String, Instant)>,
}

impl SignatureMemo {
    /// Returns the signature for `host` if it is still fresh at `now`.
    pub fn get(&self, host: &str, now: Instant) -> Option<&str> {
        self.entries
            .get(host)
            .filter(|(_, expires)| now < *expires)
            .map(|(sig, _)| sig.as_str())
    }

    pub fn insert(&mut self, host: String, signature: String, expires: Instant) {
        self.entries.insert(host, (signature, expires));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Splits a host list on `:` and `,`, leaving bracketed literals whole.
fn split_hosts(list: &str) -> impl Iterator<Item = (&str, char)> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut sep = ':';

    for (i, c) in list.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ':' | ',' if depth == 0 => {
                parts.push((&list[start..i], sep));
                sep = c;
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push((&list[start..], sep));

    parts
        .into_iter()
        .map(|(part, sep)| (part.trim(), sep))
        .filter(|(part, _)| !part.is_empty())
}

/// Cuts `s` to at most `max` bytes on a character boundary.
fn truncate_at_boundary(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}

/// Splits a signature into hosts and their preference group.
///
/// Group numbers start at zero and grow at every `:`.
pub fn parse_host_signature(signature: &str) -> Vec<(String, u16)> {
    let mut group = 0u16;
    let mut first = true;
    let mut out = Vec::new();

    for (host, sep) in split_hosts(signature) {
        if !first && sep == ':' {
            group = group.saturating_add(1);
        }
        first = false;
        out.push((host.to_string(), group));
    }
    out
}

impl<L: Lookup, S: TlsaStore, C: Clock> MailResolver<L, S, C> {
    /// Returns the signature of a `:` or `,` separated host list.
    ///
    /// Each host is expanded through its MX records with local exclusion.
    /// A host that does not resolve stands for itself and keeps the
    /// signature fresh for the negative TTL only.
    #[instrument(skip(self))]
    pub fn host_signature(&mut self, host: &str) -> String {
        let key = host.trim().to_ascii_lowercase();
        let now = self.clock.now();
        if let Some(sig) = self.signatures.get(&key, now) {
            return sig.to_string();
        }

        let mut signature = String::new();
        let mut ttl = u32::MAX;
        let negative = u32::try_from(NEGATIVE_TTL.as_secs()).unwrap_or(u32::MAX);

        for (part, sep) in split_hosts(host) {
            if !signature.is_empty() {
                signature.push(sep);
            }

            if is_bracketed(part) {
                signature.push_str(part);
                continue;
            }

            let resolution = self.resolve_mx_inner(part, MxOptions::default());
            if !resolution.status.is_success() || resolution.hosts.is_empty() {
                debug!(host = part, status = %resolution.status, "signature uses host itself");
                signature.push_str(part);
                ttl = ttl.min(negative);
                continue;
            }

            let mut previous = None;
            for mx in &resolution.hosts {
                if let Some(pref) = previous {
                    signature.push(if pref == mx.preference { ',' } else { ':' });
                }
                signature.push_str(&mx.host);
                previous = Some(mx.preference);
            }
            ttl = ttl.min(resolution.ttl);
        }

        signature.make_ascii_lowercase();
        if signature.len() > MAX_HOST_SIGNATURE {
            warn!(len = signature.len(), "host signature too long, truncating");
            truncate_at_boundary(&mut signature, MAX_HOST_SIGNATURE);
        }

        if ttl == u32::MAX {
            ttl = negative;
        }
        self.signatures
            .insert(key, signature.clone(), expiry_for(now, ttl_duration(ttl)));
        signature
    }

    /// Returns the signature memo.
    pub fn signatures(&self) -> &SignatureMemo {
        &self.signatures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_split_respects_brackets() {
        let parts: Vec<_> = split_hosts("a.example, [IPv6:2001:db8::1] :b.example,,").collect();
        assert_eq!(
            parts,
            vec![
                ("a.example", ':'),
                ("[IPv6:2001:db8::1]", ','),
                ("b.example", ':'),
            ]
        );
    }

    #[test]
    fn test_parse_host_signature() {
        let parsed = parse_host_signature("mx1.example.org.,mx2.example.org.:backup.example.net.");
        assert_eq!(
            parsed,
            vec![
                ("mx1.example.org.".to_string(), 0),
                ("mx2.example.org.".to_string(), 0),
                ("backup.example.net.".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_parse_signature_with_literal() {
        let parsed = parse_host_signature("[IPv6:2001:db8::25]:[192.0.2.25]");
        assert_eq!(
            parsed,
            vec![
                ("[IPv6:2001:db8::25]".to_string(), 0),
                ("[192.0.2.25]".to_string(), 1),
            ]
        );
        assert!(parse_host_signature("").is_empty());
    }

    #[test]
    fn test_truncate_at_boundary() {
        let mut s = "abcdé".to_string();
        truncate_at_boundary(&mut s, 5);
        assert_eq!(s, "abcd");

        let mut s = "abc".to_string();
        truncate_at_boundary(&mut s, 5);
        assert_eq!(s, "abc");
    }

    #[test]
    fn test_memo_expiry() {
        let now = Instant::now();
        let mut memo = SignatureMemo::default();
        memo.insert("example.org".into(), "mx.example.org.".into(), now + Duration::from_secs(10));

        assert_eq!(memo.get("example.org", now), Some("mx.example.org."));
        assert_eq!(memo.get("example.org", now + Duration::from_secs(10)), None);
        assert_eq!(memo.len(), 1);
    }
}
