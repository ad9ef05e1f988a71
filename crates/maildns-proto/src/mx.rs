//! Inline MX answer walk.
//!
//! The MX resolver only needs `(preference, exchange, ttl)` triples, so it
//! walks the answer section directly instead of building a [`DnsReply`].
//! Record delimiting and payload checks are the same as `DnsReply::parse`:
//! a malformed MX record is skipped, and a record that cannot be
//! delimited ends the walk.
//!
//! [`DnsReply`]: crate::message::DnsReply

use crate::error::{Error, Result};
use crate::header::{Header, HEADER_SIZE};
use crate::name::Name;
use crate::rdata::MX;
use crate::record::RecordHeader;
use crate::rtype::RecordType;
use crate::wire::WireReader;
use tracing::warn;

/// One MX answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxAnswer {
    /// Preference (lower is preferred).
    pub preference: u16,
    /// Exchange host; the root name for a null MX.
    pub exchange: Name,
    /// Record TTL in seconds.
    pub ttl: u32,
}

impl MxAnswer {
    /// Returns true for the RFC 7505 `MX 0 .` record.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.preference == 0 && self.exchange.is_root()
    }
}

/// Iterator over the MX records of a raw reply.
#[derive(Debug, Clone)]
pub struct MxWalker<'a> {
    header: Header,
    reader: WireReader<'a>,
    remaining: u16,
    dropped: usize,
}

impl<'a> MxWalker<'a> {
    /// Positions a walker at the answer section of `message`.
    ///
    /// # Errors
    ///
    /// Fails if the header is short or a question cannot be skipped.
    pub fn new(message: &'a [u8]) -> Result<Self> {
        if message.len() < HEADER_SIZE {
            return Err(Error::buffer_too_short(HEADER_SIZE, message.len()));
        }

        let mut reader = WireReader::new(message);
        let header = Header::read(&mut reader)?;
        if header.qd_count == 0 {
            return Err(Error::MissingQuestion);
        }
        for _ in 0..header.qd_count {
            reader.skip_name()?;
            reader.advance(4)?;
        }

        Ok(Self {
            remaining: header.an_count,
            header,
            reader,
            dropped: 0,
        })
    }

    /// Returns the reply header.
    #[inline]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns how many records have been rejected so far.
    #[inline]
    pub const fn dropped(&self) -> usize {
        self.dropped
    }

    fn next_record(&mut self) -> Result<Option<MxAnswer>> {
        let fixed = RecordHeader::read(&mut self.reader)?;
        let offset = self.reader.position();
        let rdlength = usize::from(fixed.rdlength);
        self.reader.advance(rdlength)?;

        if !fixed.rtype.is(RecordType::MX) {
            return Ok(None);
        }

        let mx = MX::parse(self.reader.data(), offset, rdlength)?;
        Ok(Some(MxAnswer {
            preference: mx.preference(),
            exchange: mx.exchange().clone(),
            ttl: fixed.ttl,
        }))
    }
}

impl Iterator for MxWalker<'_> {
    type Item = MxAnswer;

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 {
            self.remaining -= 1;

            match self.next_record() {
                Ok(Some(answer)) => return Some(answer),
                Ok(None) => {}
                Err(err) if err.is_payload_error() => {
                    warn!(error = %err, "skipping malformed MX record");
                    self.dropped += 1;
                }
                Err(err) => {
                    warn!(error = %err, "answer section unreadable, stopping MX walk");
                    self.dropped += 1;
                    self.remaining = 0;
                }
            }
        }
        None
    }
}

impl std::iter::FusedIterator for MxWalker<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{DnsReply, MessageBuilder};
    use crate::record::ResourceRecord;
    use std::net::Ipv4Addr;
    use std::str::FromStr;

    fn name(s: &str) -> Name {
        Name::from_str(s).unwrap()
    }

    fn mx_reply() -> Vec<u8> {
        let domain = name("example.com");
        MessageBuilder::response(3, &domain, RecordType::MX)
            .answer(ResourceRecord::mx(domain.clone(), 300, 10, name("mx1.example.com")))
            .answer(ResourceRecord::a(domain.clone(), 300, Ipv4Addr::new(192, 0, 2, 9)))
            .answer(ResourceRecord::mx(domain.clone(), 120, 10, name("mx2.example.com")))
            .answer(ResourceRecord::mx(domain, 300, 20, name("mx3.example.com")))
            .build()
            .unwrap()
    }

    /// Collects MX triples from the decoded reply for comparison.
    fn via_reply(wire: &[u8]) -> Vec<MxAnswer> {
        let reply = DnsReply::parse(wire).unwrap();
        reply
            .answers_of_type(RecordType::MX)
            .filter_map(|r| {
                r.rdata().as_mx().map(|mx| MxAnswer {
                    preference: mx.preference(),
                    exchange: mx.exchange().clone(),
                    ttl: r.ttl(),
                })
            })
            .collect()
    }

    #[test]
    fn test_walk_skips_other_types() {
        let wire = mx_reply();
        let answers: Vec<_> = MxWalker::new(&wire).unwrap().collect();

        assert_eq!(answers.len(), 3);
        assert_eq!(answers[0].exchange, name("mx1.example.com"));
        assert_eq!(answers[1].ttl, 120);
        assert_eq!(answers[2].preference, 20);
    }

    #[test]
    fn test_walker_agrees_with_reply() {
        let wire = mx_reply();
        assert_eq!(MxWalker::new(&wire).unwrap().collect::<Vec<_>>(), via_reply(&wire));

        // corrupt the first exchange: label length past the RDATA
        let mut bad = wire.clone();
        let first_rdata = 12 + 13 + 4 + 13 + 10;
        bad[first_rdata + 2] = 60;
        let mut walker = MxWalker::new(&bad).unwrap();
        let walked: Vec<_> = walker.by_ref().collect();
        assert_eq!(walked, via_reply(&bad));
        assert_eq!(walked.len(), 2);
        assert_eq!(walker.dropped(), 1);

        // truncate inside the last record
        let cut = &wire[..wire.len() - 3];
        assert_eq!(MxWalker::new(cut).unwrap().collect::<Vec<_>>(), via_reply(cut));
    }

    #[test]
    fn test_null_mx() {
        let domain = name("example.net");
        let wire = MessageBuilder::response(1, &domain, RecordType::MX)
            .answer(ResourceRecord::mx(domain, 300, 0, Name::root()))
            .build()
            .unwrap();

        let answers: Vec<_> = MxWalker::new(&wire).unwrap().collect();
        assert_eq!(answers.len(), 1);
        assert!(answers[0].is_null());
        assert_eq!(answers[0].exchange.to_host(), "");
    }

    #[test]
    fn test_header_exposed() {
        let wire = mx_reply();
        let walker = MxWalker::new(&wire).unwrap();
        assert_eq!(walker.header().an_count, 4);
        assert!(!walker.header().is_authentic_data());
    }
}
