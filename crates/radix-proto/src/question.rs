//! The question section.

use crate::class::{Class, RecordClass};
use crate::error::Result;
use crate::name::{Name, NameParser};
use crate::rtype::{RecordType, Type};
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A DNS question: what is being asked of the DNS.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Question {
    /// The name being queried.
    pub qname: Name,
    /// The requested record type.
    pub qtype: Type,
    /// The query class (IN for everything this resolver does).
    pub qclass: Class,
}

impl Question {
    /// Creates an IN-class question.
    #[inline]
    pub fn new(qname: Name, qtype: RecordType) -> Self {
        Self {
            qname,
            qtype: Type::Known(qtype),
            qclass: Class::Known(RecordClass::IN),
        }
    }

    /// Creates a question for an A record.
    #[inline]
    pub fn a(name: Name) -> Self {
        Self::new(name, RecordType::A)
    }

    /// Creates a question for an AAAA record.
    #[inline]
    pub fn aaaa(name: Name) -> Self {
        Self::new(name, RecordType::AAAA)
    }

    /// Creates a question for a DNSKEY record.
    #[inline]
    pub fn dnskey(name: Name) -> Self {
        Self::new(name, RecordType::DNSKEY)
    }

    /// Returns the record type if known.
    #[inline]
    pub fn record_type(&self) -> Option<RecordType> {
        self.qtype.as_known()
    }

    /// Parses a question from `data` at `offset`; returns it along with
    /// the number of bytes consumed.
    pub fn parse(data: &[u8], offset: usize) -> Result<(Self, usize)> {
        let parser = NameParser::new(data);
        let (qname, name_len) = parser.parse_name(offset)?;

        let fixed = offset + name_len;
        if fixed + 4 > data.len() {
            return Err(crate::error::Error::buffer_too_short(fixed + 4, data.len()));
        }
        let qtype = Type::from_u16(u16::from_be_bytes([data[fixed], data[fixed + 1]]));
        let qclass = Class::from_u16(u16::from_be_bytes([data[fixed + 2], data[fixed + 3]]));

        Ok((
            Self {
                qname,
                qtype,
                qclass,
            },
            name_len + 4,
        ))
    }

    /// Returns the wire-format length.
    pub fn wire_len(&self) -> usize {
        self.qname.wire_len() + 4
    }

    /// Appends the wire form to `buf`.
    pub fn write_to(&self, buf: &mut BytesMut) {
        self.qname.write_wire(buf);
        buf.extend_from_slice(&self.qtype.to_u16().to_be_bytes());
        buf.extend_from_slice(&self.qclass.to_u16().to_be_bytes());
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.qname, self.qclass, self.qtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn question_round_trip() {
        let q = Question::a(Name::from_str("example.com").unwrap());
        let mut buf = BytesMut::new();
        q.write_to(&mut buf);

        let (parsed, consumed) = Question::parse(&buf, 0).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(parsed, q);
        assert_eq!(parsed.record_type(), Some(RecordType::A));
    }
}
