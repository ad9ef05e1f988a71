//! Keyed storage for TLSA entries.

use crate::entry::TlsaEntry;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::time::Instant;

/// Keyed storage the cache persists its entries in.
///
/// Keys are produced by [`tlsa_key`](crate::tlsa_key).
pub trait TlsaStore {
    /// Looks up an entry.
    fn get(&self, key: &str) -> Option<&TlsaEntry>;

    /// Returns the entry for `key`, creating an empty one if needed.
    ///
    /// `now` comes from the caller's clock and decides which entries
    /// count as expired when room has to be made.
    ///
    /// # Errors
    ///
    /// Fails when a new entry cannot be allocated.
    fn find_or_create(&mut self, key: &str, now: Instant) -> Result<&mut TlsaEntry>;

    /// Removes an entry.
    fn remove(&mut self, key: &str) -> Option<TlsaEntry>;

    /// Returns the number of entries.
    fn len(&self) -> usize;

    /// Returns true if the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process store.
///
/// Entries live until removed. With a limit set, creating an entry past
/// the limit first drops expired ones and fails if that frees nothing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, TlsaEntry>,
    max_entries: Option<usize>,
}

impl MemoryStore {
    /// Creates an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding at most `max_entries` entries.
    pub fn with_limit(max_entries: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(max_entries.min(1024)),
            max_entries: Some(max_entries),
        }
    }

    /// Drops entries that have expired by `now`.
    pub fn evict_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now) || entry.is_new());
        before - self.entries.len()
    }

    /// Returns the keys currently stored.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    fn make_room(&mut self, limit: usize, now: Instant) -> Result<()> {
        if self.entries.len() < limit {
            return Ok(());
        }
        self.evict_expired(now);
        if self.entries.len() < limit {
            Ok(())
        } else {
            Err(Error::full(limit))
        }
    }
}

impl TlsaStore for MemoryStore {
    fn get(&self, key: &str) -> Option<&TlsaEntry> {
        self.entries.get(key)
    }

    fn find_or_create(&mut self, key: &str, now: Instant) -> Result<&mut TlsaEntry> {
        if !self.entries.contains_key(key) {
            if let Some(limit) = self.max_entries {
                self.make_room(limit, now)?;
            }
            self.entries.insert(key.to_owned(), TlsaEntry::new());
        }

        self.entries
            .get_mut(key)
            .ok_or_else(|| Error::InvalidKey { key: key.to_owned() })
    }

    fn remove(&mut self, key: &str) -> Option<TlsaEntry> {
        self.entries.remove(key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::TlsaFlags;
    use std::time::Duration;

    #[test]
    fn test_find_or_create_reuses_entry() {
        let now = Instant::now();
        let mut store = MemoryStore::new();
        store
            .find_or_create("_25.mx.example.com", now)
            .unwrap()
            .set_flags(TlsaFlags::MX_AUTHENTICATED, true);

        let entry = store.find_or_create("_25.mx.example.com", now).unwrap();
        assert!(entry.flags().contains(TlsaFlags::MX_AUTHENTICATED));
        assert_eq!(store.len(), 1);
        assert!(store.get("_25.other.example").is_none());
    }

    #[test]
    fn test_limit() {
        let now = Instant::now();
        let mut store = MemoryStore::with_limit(1);
        let entry = store.find_or_create("_25.a.example", now).unwrap();
        entry.set_flags(TlsaFlags::NEW, false);
        entry.set_expires(now + Duration::from_secs(600));

        assert_eq!(
            store.find_or_create("_25.b.example", now).unwrap_err(),
            Error::full(1)
        );
        // existing keys are still reachable when full
        assert!(store.find_or_create("_25.a.example", now).is_ok());
    }

    #[test]
    fn test_limit_reclaims_expired_by_caller_time() {
        let start = Instant::now();
        let mut store = MemoryStore::with_limit(1);
        let entry = store.find_or_create("_25.a.example", start).unwrap();
        entry.set_flags(TlsaFlags::NEW, false);
        entry.set_expires(start + Duration::from_secs(3600));

        assert!(store.find_or_create("_25.b.example", start).is_err());

        let later = start + Duration::from_secs(3601);
        assert!(store.find_or_create("_25.b.example", later).is_ok());
        assert_eq!(store.keys().collect::<Vec<_>>(), vec!["_25.b.example"]);
    }
}
