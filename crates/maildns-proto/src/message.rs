//! DNS replies and query construction.
//!
//! [`DnsReply`] is the decoded form of a response: the header, the
//! original question, and the answer section. The authority and
//! additional sections are never decoded. [`MessageBuilder`] writes the
//! queries sent upstream and, in tests, the canned responses served back.

use crate::edns::Edns;
use crate::error::{Error, Result};
use crate::header::{Header, HeaderFlags, HEADER_SIZE};
use crate::name::Name;
use crate::question::Question;
use crate::rcode::ResponseCode;
use crate::record::ResourceRecord;
use crate::rtype::RecordType;
use crate::class::RecordClass;
use crate::wire::{WireReader, WireWriter};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Maximum size of a message written by [`MessageBuilder`].
pub const MAX_MESSAGE_SIZE: usize = 65535;

/// A decoded DNS response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsReply {
    /// The message header.
    header: Header,
    /// The original query.
    question: Question,
    /// Answer records that decoded cleanly, in wire order.
    answers: Vec<ResourceRecord>,
    /// Answer records rejected as malformed.
    dropped: usize,
}

impl DnsReply {
    /// Parses a reply.
    ///
    /// A malformed answer record is dropped and logged. If the record
    /// could still be delimited the walk continues with the next one;
    /// otherwise the walk stops and the records decoded so far are kept.
    ///
    /// # Errors
    ///
    /// Fails if the header is short or the first question cannot be read.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::buffer_too_short(HEADER_SIZE, data.len()));
        }

        let mut reader = WireReader::new(data);
        let header = Header::read(&mut reader)?;

        if header.qd_count == 0 {
            return Err(Error::MissingQuestion);
        }
        let question = Question::read(&mut reader)?;
        for _ in 1..header.qd_count {
            Question::read(&mut reader)?;
        }

        let mut answers = Vec::with_capacity(usize::from(header.an_count).min(64));
        let mut dropped = 0;

        for index in 0..header.an_count {
            match ResourceRecord::read(&mut reader) {
                Ok(record) => answers.push(record),
                Err(err) if err.is_payload_error() => {
                    warn!(index, error = %err, qname = %question.qname, "dropping malformed answer record");
                    dropped += 1;
                }
                Err(err) => {
                    warn!(index, error = %err, qname = %question.qname, "answer section unreadable, stopping");
                    dropped += 1;
                    break;
                }
            }
        }

        Ok(Self {
            header,
            question,
            answers,
            dropped,
        })
    }

    /// Returns the message header.
    #[inline]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the message ID.
    #[inline]
    pub fn id(&self) -> u16 {
        self.header.id
    }

    /// Returns the response code.
    #[inline]
    pub fn rcode(&self) -> ResponseCode {
        self.header.rcode
    }

    /// Returns true if the upstream resolver set the AD flag.
    #[inline]
    pub fn is_authenticated(&self) -> bool {
        self.header.is_authentic_data()
    }

    /// Returns true if the TC flag is set.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.header.is_truncated()
    }

    /// Returns the original query.
    #[inline]
    pub fn question(&self) -> &Question {
        &self.question
    }

    /// Returns the decoded answer records.
    #[inline]
    pub fn answers(&self) -> &[ResourceRecord] {
        &self.answers
    }

    /// Returns the number of answer records dropped as malformed.
    #[inline]
    pub const fn dropped(&self) -> usize {
        self.dropped
    }

    /// Returns answers of a specific type.
    pub fn answers_of_type(&self, rtype: RecordType) -> impl Iterator<Item = &ResourceRecord> {
        self.answers.iter().filter(move |r| r.is(rtype))
    }

    /// Returns the target of the first CNAME in the answer section.
    pub fn cname_target(&self) -> Option<&Name> {
        self.answers.iter().find_map(|r| r.rdata().as_cname())
    }
}

impl fmt::Display for DnsReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ";; {}", self.header)?;
        writeln!(f, ";; QUESTION: {}", self.question)?;
        for record in &self.answers {
            writeln!(f, "{record}")?;
        }
        if self.dropped > 0 {
            writeln!(f, ";; {} malformed record(s) dropped", self.dropped)?;
        }
        Ok(())
    }
}

/// Builds query and response messages with uncompressed names.
///
/// ```rust
/// use maildns_proto::message::{DnsReply, MessageBuilder};
/// use maildns_proto::{Name, RecordType, ResourceRecord};
/// use std::str::FromStr;
///
/// let domain = Name::from_str("example.org").unwrap();
/// let exchange = Name::from_str("mx.example.org").unwrap();
/// let wire = MessageBuilder::response(7, &domain, RecordType::MX)
///     .answer(ResourceRecord::mx(domain.clone(), 300, 10, exchange))
///     .build()
///     .unwrap();
///
/// let reply = DnsReply::parse(&wire).unwrap();
/// assert_eq!(reply.answers().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    header: Header,
    question: Question,
    answers: Vec<ResourceRecord>,
    edns: Option<Edns>,
}

impl MessageBuilder {
    /// Starts a recursive query.
    ///
    /// With `dnssec` the query carries an OPT record with the DO bit and
    /// sets AD, asking the upstream resolver to report validation status.
    pub fn query(id: u16, name: &Name, rtype: RecordType, dnssec: bool) -> Self {
        let mut header = Header::query(id);
        let edns = if dnssec {
            header.set_flag(HeaderFlags::AD, true);
            header.ar_count = 1;
            Some(Edns::with_dnssec())
        } else {
            None
        };

        Self {
            header,
            question: Question::new(name.clone(), rtype, RecordClass::IN),
            answers: Vec::new(),
            edns,
        }
    }

    /// Starts a response to a query for `name`/`rtype`.
    pub fn response(id: u16, name: &Name, rtype: RecordType) -> Self {
        let mut builder = Self::query(id, name, rtype, false);
        builder
            .header
            .set_flag(HeaderFlags::QR | HeaderFlags::RA, true);
        builder
    }

    /// Sets the question class.
    #[must_use]
    pub fn class(mut self, class: RecordClass) -> Self {
        self.question.qclass = class.into();
        self
    }

    /// Sets the response code.
    #[must_use]
    pub fn rcode(mut self, rcode: ResponseCode) -> Self {
        self.header.rcode = rcode;
        self
    }

    /// Sets or clears a header flag.
    #[must_use]
    pub fn flag(mut self, flag: HeaderFlags, on: bool) -> Self {
        self.header.set_flag(flag, on);
        self
    }

    /// Appends an answer record.
    #[must_use]
    pub fn answer(mut self, record: ResourceRecord) -> Self {
        self.answers.push(record);
        self
    }

    /// Returns the header as it will be written.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Writes the message.
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut header = self.header.clone();
        header.an_count = u16::try_from(self.answers.len())
            .map_err(|_| Error::buffer_overflow(self.answers.len(), usize::from(u16::MAX)))?;

        let mut writer = WireWriter::with_max_size(512, MAX_MESSAGE_SIZE);
        header.write_to(&mut writer)?;
        self.question.write_to(&mut writer)?;
        for record in &self.answers {
            record.write_to(&mut writer)?;
        }
        if let Some(edns) = &self.edns {
            edns.write_to(&mut writer)?;
        }

        Ok(writer.into_vec())
    }
}
