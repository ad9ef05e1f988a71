//! # maildns resolver
//!
//! Mail routing lookups on top of a blocking stub resolver.
//!
//! ## Features
//!
//! - MX resolution with local-host exclusion, weighted tie-break, null MX
//!   (RFC 7505), and a fallback relay
//! - Canonical name resolution over the search list, with CNAME chasing
//!   and wildcard MX disambiguation
//! - TLSA lookup and caching for opportunistic DANE (RFC 7672)
//! - Host signatures for connection sharing
//!
//! All state that lives as long as the process (TLSA cache, weight seed,
//! fallback expansion, signature memo) is owned by [`MailResolver`]. The
//! DNS itself is reached through the [`Lookup`] trait, so tests can script
//! replies.
//!
//! ```rust,no_run
//! use maildns_config::Config;
//! use maildns_resolver::{MailResolver, MxOptions, MxStatus};
//!
//! let mut resolver = MailResolver::from_config(&Config::default());
//! let resolution = resolver.resolve_mx("example.org", MxOptions::default());
//! if resolution.status == MxStatus::Success {
//!     for host in resolution.host_names() {
//!         println!("{host}");
//!     }
//! }
//! ```

#![warn(clippy::all)]

pub mod canon;
pub mod dane;
pub mod fallback;
pub mod lookup;
pub mod mx;
pub mod resolver;
pub mod search;
pub mod signature;
pub mod stub;
pub mod transport;
pub mod weight;

pub use canon::{CanonResult, CanonStatus, MAX_CNAME_DEPTH};
pub use dane::{TlsaLookup, TlsaOptions, TlsaStatus, MAX_TLSA_CNAME_DEPTH};
pub use fallback::FallbackRegistry;
pub use lookup::{Lookup, LookupError, QueryOptions};
pub use mx::{MxHost, MxOptions, MxResolution, MxStatus, DEFAULT_MX_TTL, MAX_MX_HOSTS};
pub use resolver::{MailResolver, ResolverSettings};
pub use search::{SearchList, SearchSettings};
pub use signature::{parse_host_signature, SignatureMemo, MAX_HOST_SIGNATURE};
pub use stub::StubResolver;
pub use transport::{Transport, UdpTransport};
pub use weight::WeightSeed;

/// Result type for a single query.
pub type Result<T> = std::result::Result<T, LookupError>;
