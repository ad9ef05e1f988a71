//! # maildns wire protocol
//!
//! RFC 1035 message decoding for mail routing lookups, plus the small
//! amount of encoding needed to send queries.
//!
//! ## Features
//!
//! - **Bounds-checked cursor** over untrusted packets ([`wire::WireReader`])
//! - **Name decompression** with backward-only pointers and a jump limit
//! - **Per-record failure isolation**: one malformed record is dropped, not
//!   the whole reply
//! - **Inline MX walk** ([`mx::MxWalker`]) that skips building a reply
//! - **TLSA payloads** kept byte for byte for the DANE cache
//!
//! ## Example
//!
//! ```rust
//! use maildns_proto::{DnsReply, MessageBuilder, Name, RecordType};
//! use std::str::FromStr;
//!
//! let query = MessageBuilder::query(0x2a, &Name::from_str("example.com").unwrap(), RecordType::MX, false)
//!     .build()
//!     .unwrap();
//! assert_eq!(query.len(), 12 + 13 + 4);
//!
//! // a reply without answers still carries the question
//! let mut reply = query.clone();
//! reply[2] |= 0x80;
//! let reply = DnsReply::parse(&reply).unwrap();
//! assert!(reply.answers().is_empty());
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod class;
pub mod edns;
pub mod error;
pub mod header;
pub mod message;
pub mod mx;
pub mod name;
pub mod question;
pub mod rcode;
pub mod rdata;
pub mod record;
pub mod rtype;
pub mod wire;

// Re-exports for convenience
pub use class::{Class, RecordClass};
pub use edns::Edns;
pub use error::{Error, Result};
pub use header::{Header, HeaderFlags};
pub use message::{DnsReply, MessageBuilder};
pub use mx::{MxAnswer, MxWalker};
pub use name::Name;
pub use question::Question;
pub use rcode::ResponseCode;
pub use rdata::RData;
pub use record::ResourceRecord;
pub use rtype::{RecordType, Type};

/// Maximum length of a DNS label (63 bytes per RFC 1035)
pub const MAX_LABEL_LENGTH: usize = 63;

/// Maximum length of a domain name (255 bytes per RFC 1035)
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum size of a UDP DNS message without EDNS0 (512 bytes per RFC 1035)
pub const MAX_UDP_MESSAGE_SIZE: usize = 512;

/// DNS port (53)
pub const DNS_PORT: u16 = 53;
