//! # maildns TLSA cache
//!
//! Per `(port, host)` storage of TLSA records for opportunistic DANE.
//!
//! ## Architecture
//!
//! - **[`TlsaEntry`]**: up to [`MAX_TLSA_RR`] raw records plus flags, the
//!   last fetch error, and an expiry instant
//! - **[`InsertPolicy`]**: decides where a record goes and which one is
//!   evicted when the entry is full
//! - **[`TlsaStore`]**: the keyed storage the entries live in
//! - **[`Clock`]**: injected time source, so expiry is testable
//!
//! ```rust
//! use maildns_cache::{tlsa_key, ArrivalOrder, MemoryStore, TlsaRecord, TlsaStore};
//! use std::time::Instant;
//!
//! let mut store = MemoryStore::new();
//! let entry = store
//!     .find_or_create(&tlsa_key(25, "MX.Example.COM."), Instant::now())
//!     .unwrap();
//!
//! let mut rdata = vec![3, 1, 1];
//! rdata.extend_from_slice(&[0x5a; 32]);
//! entry.insert(TlsaRecord::new(rdata.clone()), &ArrivalOrder);
//! entry.insert(TlsaRecord::new(rdata), &ArrivalOrder);
//!
//! assert_eq!(store.get("_25.mx.example.com").map(|e| e.len()), Some(1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod entry;
pub mod error;
pub mod key;
pub mod policy;
pub mod store;
pub mod ttl;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{FetchError, InsertOutcome, TlsaEntry, TlsaFlags};
pub use error::{Error, Result};
pub use key::tlsa_key;
pub use policy::{classify, ArrivalOrder, InsertPolicy, Placement, Support, TlsaRecord};
pub use store::{MemoryStore, TlsaStore};
pub use ttl::{expiry_for, TtlPolicy};

use std::time::Duration;

/// Maximum number of TLSA records kept per entry.
pub const MAX_TLSA_RR: usize = 64;

/// Ceiling applied to the TTL of fetched records.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Lifetime of an entry recording a transient failure.
pub const NEGATIVE_TTL: Duration = Duration::from_secs(60);
