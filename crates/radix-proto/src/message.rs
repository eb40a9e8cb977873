//! Whole DNS messages: header, question, and the three record sections.

use crate::edns::Edns;
use crate::error::{Error, Result};
use crate::header::{Header, HEADER_SIZE};
use crate::question::Question;
use crate::rcode::ResponseCode;
use crate::record::{RecordParser, ResourceRecord};
use crate::rtype::RecordType;
use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A complete DNS message.
///
/// The OPT pseudo-record is lifted out of the additional section into
/// [`Edns`] on parse and re-emitted on write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    header: Header,
    questions: Vec<Question>,
    answers: Vec<ResourceRecord>,
    authority: Vec<ResourceRecord>,
    additional: Vec<ResourceRecord>,
    edns: Option<Edns>,
}

impl Message {
    /// Creates an empty message with the given header.
    pub fn new(header: Header) -> Self {
        Self {
            header,
            questions: Vec::new(),
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
            edns: None,
        }
    }

    /// Creates a query for `question` with EDNS(0) attached and the DO
    /// bit set iff `dnssec_ok`.
    pub fn query(question: Question, dnssec_ok: bool) -> Self {
        let mut header = Header::query();
        header.qd_count = 1;
        Self {
            header,
            questions: vec![question],
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
            edns: Some(if dnssec_ok {
                Edns::with_dnssec()
            } else {
                Edns::new()
            }),
        }
    }

    /// Creates an empty response to `query`.
    pub fn response_from(query: &Message) -> Self {
        Self {
            header: Header::response_from(&query.header),
            questions: query.questions.clone(),
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
            edns: query.edns.clone(),
        }
    }

    /// Returns the header.
    #[inline]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns a mutable reference to the header.
    #[inline]
    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
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

    /// Sets the response code.
    #[inline]
    pub fn set_rcode(&mut self, rcode: ResponseCode) {
        self.header.rcode = rcode;
        if let Some(edns) = &mut self.edns {
            edns.set_extended_rcode(rcode.extended_rcode());
        }
    }

    /// Returns true if the TC bit is set.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.header.is_truncated()
    }

    /// Returns the first question, if any.
    #[inline]
    pub fn question(&self) -> Option<&Question> {
        self.questions.first()
    }

    /// Returns the question section.
    #[inline]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Returns the answer section.
    #[inline]
    pub fn answers(&self) -> &[ResourceRecord] {
        &self.answers
    }

    /// Returns the authority section.
    #[inline]
    pub fn authority(&self) -> &[ResourceRecord] {
        &self.authority
    }

    /// Returns the additional section (OPT excluded).
    #[inline]
    pub fn additional(&self) -> &[ResourceRecord] {
        &self.additional
    }

    /// Returns the EDNS state, if present.
    #[inline]
    pub fn edns(&self) -> Option<&Edns> {
        self.edns.as_ref()
    }

    /// Adds an answer record.
    pub fn add_answer(&mut self, record: ResourceRecord) {
        self.answers.push(record);
        self.header.an_count = self.answers.len() as u16;
    }

    /// Adds an authority record.
    pub fn add_authority(&mut self, record: ResourceRecord) {
        self.authority.push(record);
        self.header.ns_count = self.authority.len() as u16;
    }

    /// Adds an additional record.
    pub fn add_additional(&mut self, record: ResourceRecord) {
        self.additional.push(record);
        self.update_ar_count();
    }

    /// Replaces the answer section wholesale.
    pub fn set_answers(&mut self, records: Vec<ResourceRecord>) {
        self.answers = records;
        self.header.an_count = self.answers.len() as u16;
    }

    /// Replaces the authority section wholesale.
    pub fn set_authority(&mut self, records: Vec<ResourceRecord>) {
        self.authority = records;
        self.header.ns_count = self.authority.len() as u16;
    }

    /// Replaces the additional section wholesale.
    pub fn set_additional(&mut self, records: Vec<ResourceRecord>) {
        self.additional = records;
        self.update_ar_count();
    }

    fn update_ar_count(&mut self) {
        let edns = usize::from(self.edns.is_some());
        self.header.ar_count = (self.additional.len() + edns) as u16;
    }

    /// Returns true for NXDOMAIN.
    pub fn is_nxdomain(&self) -> bool {
        self.rcode().is_nxdomain()
    }

    /// Returns true if NOERROR with an empty answer section.
    pub fn is_nodata(&self) -> bool {
        self.rcode().is_success() && self.answers.is_empty()
    }

    /// Returns true if this looks like a referral: no answers, NS
    /// records in authority.
    pub fn is_referral(&self) -> bool {
        self.answers.is_empty()
            && self
                .authority
                .iter()
                .any(|r| r.record_type() == Some(RecordType::NS))
    }

    /// Parses a message from wire format.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = Header::parse(data)?;

        let mut offset = HEADER_SIZE;
        let mut questions = Vec::with_capacity(header.qd_count as usize);
        for _ in 0..header.qd_count {
            let (q, consumed) = Question::parse(data, offset)?;
            questions.push(q);
            offset += consumed;
        }

        let mut answers = Vec::with_capacity(header.an_count as usize);
        let mut parser = RecordParser::new(data, offset, header.an_count);
        while let Some(r) = parser.next()? {
            answers.push(r);
        }
        offset = parser.offset();

        let mut authority = Vec::with_capacity(header.ns_count as usize);
        let mut parser = RecordParser::new(data, offset, header.ns_count);
        while let Some(r) = parser.next()? {
            authority.push(r);
        }
        offset = parser.offset();

        let mut additional = Vec::new();
        let mut edns = None;
        let mut parser = RecordParser::new(data, offset, header.ar_count);
        while let Some(r) = parser.next()? {
            if r.record_type() == Some(RecordType::OPT) {
                if edns.is_some() {
                    return Err(Error::MultipleOptRecords);
                }
                let mut rdata = BytesMut::new();
                r.rdata().write_to(&mut rdata);
                edns = Some(Edns::parse(r.rclass().to_u16(), r.ttl(), &rdata)?);
            } else {
                additional.push(r);
            }
        }

        // Fold the extended rcode bits back into the header code.
        let mut header = header;
        if let Some(e) = &edns {
            if let Some(full) =
                ResponseCode::from_parts(header.rcode.header_rcode(), e.extended_rcode())
            {
                header.rcode = full;
            }
        }

        Ok(Self {
            header,
            questions,
            answers,
            authority,
            additional,
            edns,
        })
    }

    /// Returns the wire-format length.
    pub fn wire_len(&self) -> usize {
        let mut len = HEADER_SIZE;
        len += self.questions.iter().map(Question::wire_len).sum::<usize>();
        len += self.answers.iter().map(ResourceRecord::wire_len).sum::<usize>();
        len += self.authority.iter().map(ResourceRecord::wire_len).sum::<usize>();
        len += self.additional.iter().map(ResourceRecord::wire_len).sum::<usize>();
        if let Some(edns) = &self.edns {
            len += edns.wire_len();
        }
        len
    }

    /// Appends the wire form to `buf`, refreshing the section counts.
    pub fn write_to(&self, buf: &mut BytesMut) {
        let mut header = self.header.clone();
        header.qd_count = self.questions.len() as u16;
        header.an_count = self.answers.len() as u16;
        header.ns_count = self.authority.len() as u16;
        header.ar_count =
            (self.additional.len() + usize::from(self.edns.is_some())) as u16;
        header.write_to(buf);

        for q in &self.questions {
            q.write_to(buf);
        }
        for r in &self.answers {
            r.write_to(buf);
        }
        for r in &self.authority {
            r.write_to(buf);
        }
        for r in &self.additional {
            r.write_to(buf);
        }
        if let Some(edns) = &self.edns {
            edns.write_to(buf);
        }
    }

    /// Serializes to wire format.
    pub fn to_wire(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.wire_len());
        self.write_to(&mut buf);
        buf.freeze()
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new(Header::default())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ";; ->>HEADER<<- {}", self.header)?;
        if let Some(edns) = &self.edns {
            writeln!(
                f,
                ";; OPT: udp={} do={}",
                edns.udp_size(),
                edns.dnssec_ok()
            )?;
        }
        writeln!(f, ";; QUESTION SECTION:")?;
        for q in &self.questions {
            writeln!(f, ";{q}")?;
        }
        for (title, section) in [
            ("ANSWER", &self.answers),
            ("AUTHORITY", &self.authority),
            ("ADDITIONAL", &self.additional),
        ] {
            if !section.is_empty() {
                writeln!(f, ";; {title} SECTION:")?;
                for r in section.iter() {
                    writeln!(f, "{r}")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::Name;
    use std::net::Ipv4Addr;
    use std::str::FromStr;

    #[test]
    fn query_has_edns() {
        let q = Question::a(Name::from_str("example.com").unwrap());
        let msg = Message::query(q, true);
        assert!(msg.edns().unwrap().dnssec_ok());
        assert_eq!(msg.edns().unwrap().udp_size(), 4096);
    }

    #[test]
    fn message_round_trip() {
        let q = Question::a(Name::from_str("example.com").unwrap());
        let mut msg = Message::query(q, true);
        msg.header_mut().id = 0x1234;

        let wire = msg.to_wire();
        let parsed = Message::parse(&wire).unwrap();
        assert_eq!(parsed.id(), 0x1234);
        assert_eq!(parsed.questions().len(), 1);
        assert!(parsed.edns().unwrap().dnssec_ok());
    }

    #[test]
    fn response_classification() {
        let q = Question::a(Name::from_str("example.com").unwrap());
        let query = Message::query(q, false);
        let mut response = Message::response_from(&query);

        assert!(response.is_nodata());
        assert!(!response.is_referral());

        response.add_authority(ResourceRecord::ns(
            Name::from_str("example.com").unwrap(),
            300,
            Name::from_str("ns1.example.com").unwrap(),
        ));
        assert!(response.is_referral());

        response.add_answer(ResourceRecord::a(
            Name::from_str("example.com").unwrap(),
            300,
            Ipv4Addr::new(192, 0, 2, 1),
        ));
        assert!(!response.is_nodata());
        assert!(!response.is_referral());

        response.set_rcode(ResponseCode::NXDomain);
        assert!(response.is_nxdomain());
    }

    #[test]
    fn parse_skips_opt_into_edns() {
        let q = Question::a(Name::from_str("example.com").unwrap());
        let msg = Message::query(q, true);
        let wire = msg.to_wire();

        let parsed = Message::parse(&wire).unwrap();
        assert!(parsed.additional().is_empty());
        assert!(parsed.edns().is_some());
    }
}
