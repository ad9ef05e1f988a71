//! Stub resolver: the production [`Lookup`].

use crate::lookup::{Lookup, LookupError, QueryOptions};
use crate::transport::{Transport, UdpTransport};
use maildns_config::ResolverConfig;
use maildns_proto::{Header, MessageBuilder, Name, RecordClass, RecordType, ResponseCode};
use std::str::FromStr;
use tracing::{debug, trace, warn};

/// Sends recursive queries to the configured nameservers.
#[derive(Debug, Clone)]
pub struct StubResolver<T: Transport = UdpTransport> {
    transport: T,
}

impl StubResolver<UdpTransport> {
    /// Creates a resolver over UDP from the resolver configuration.
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(UdpTransport::new(
            config.effective_nameservers(),
            config.timeout(),
            config.attempts,
        ))
    }
}

impl<T: Transport> StubResolver<T> {
    /// Creates a resolver over `transport`.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

/// Maps a reply header to the outcome the callers act on.
pub fn classify_reply(header: &Header) -> Result<(), LookupError> {
    match header.rcode {
        ResponseCode::NoError if header.an_count == 0 => Err(LookupError::NoData),
        ResponseCode::NoError => Ok(()),
        ResponseCode::NXDomain => Err(LookupError::HostNotFound),
        ResponseCode::ServFail => Err(LookupError::TryAgain),
        _ => Err(LookupError::NoRecovery),
    }
}

impl<T: Transport> Lookup for StubResolver<T> {
    fn query(
        &self,
        name: &str,
        class: RecordClass,
        rtype: RecordType,
        opts: QueryOptions,
    ) -> Result<Vec<u8>, LookupError> {
        let qname = Name::from_str(name).map_err(|error| {
            debug!(name, %error, "refusing to query malformed name");
            LookupError::NoRecovery
        })?;

        let id = rand::random::<u16>();
        let query = MessageBuilder::query(id, &qname, rtype, opts.dnssec)
            .class(class)
            .build()
            .map_err(|error| {
                warn!(name, %error, "failed to encode query");
                LookupError::NoRecovery
            })?;

        trace!(name, %rtype, %opts, id, "sending query");
        let mut reply = self.transport.exchange_udp(&query)?;
        let mut header = Header::parse(&reply).map_err(|_| LookupError::NoRecovery)?;

        if header.is_truncated() {
            debug!(name, %rtype, "reply truncated, retrying over TCP");
            reply = self.transport.exchange_tcp(&query)?;
            header = Header::parse(&reply).map_err(|_| LookupError::NoRecovery)?;
        }

        if header.id != id || !header.is_response() {
            warn!(name, expected = id, actual = header.id, "reply does not match query");
            return Err(LookupError::NoRecovery);
        }

        classify_reply(&header)?;
        Ok(reply)
    }
}
