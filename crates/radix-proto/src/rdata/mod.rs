//! Record data (RDATA) for the record types the resolver interprets.
//!
//! Anything outside this set survives parsing as an [`Unknown`] blob so
//! messages round-trip without loss.

pub mod address;
pub mod authority;
pub mod dnssec;
pub mod name;
pub mod text;
pub mod unknown;

pub use address::{A, AAAA};
pub use authority::SOA;
pub use dnssec::{DNSKEY, DS, NSEC3, RRSIG};
pub use name::{CNAME, DNAME, MX, NS, PTR};
pub use text::TXT;
pub use unknown::Unknown;

use crate::error::{Error, Result};
use crate::name::Name;
use crate::rtype::RecordType;
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Parsed record data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum RData {
    /// IPv4 address.
    A(A),
    /// IPv6 address.
    AAAA(AAAA),
    /// Nameserver.
    NS(NS),
    /// Canonical name.
    CNAME(CNAME),
    /// Pointer.
    PTR(PTR),
    /// Subtree delegation name.
    DNAME(DNAME),
    /// Mail exchange.
    MX(MX),
    /// Start of authority.
    SOA(SOA),
    /// Text strings.
    TXT(TXT),
    /// Zone public key.
    DNSKEY(DNSKEY),
    /// Delegation signer.
    DS(DS),
    /// RRset signature.
    RRSIG(RRSIG),
    /// Hashed denial of existence.
    NSEC3(NSEC3),
    /// Anything else, preserved verbatim.
    Unknown(Unknown),
}

impl RData {
    /// Parses RDATA at `offset` within the full message (needed for
    /// compression pointers in embedded names).
    pub fn parse(rtype: RecordType, message: &[u8], offset: usize, rdlength: u16) -> Result<Self> {
        let slice = message
            .get(offset..offset + rdlength as usize)
            .ok_or_else(|| Error::buffer_too_short(offset + rdlength as usize, message.len()))?;

        Ok(match rtype {
            RecordType::A => RData::A(A::parse(slice)?),
            RecordType::AAAA => RData::AAAA(AAAA::parse(slice)?),
            RecordType::NS => RData::NS(NS::parse(message, offset)?),
            RecordType::CNAME => RData::CNAME(CNAME::parse(message, offset)?),
            RecordType::PTR => RData::PTR(PTR::parse(message, offset)?),
            RecordType::DNAME => RData::DNAME(DNAME::parse(message, offset)?),
            RecordType::MX => RData::MX(MX::parse(message, offset)?),
            RecordType::SOA => RData::SOA(SOA::parse(message, offset)?),
            RecordType::TXT => RData::TXT(TXT::parse(slice)?),
            RecordType::DNSKEY => RData::DNSKEY(DNSKEY::parse(slice)?),
            RecordType::DS => RData::DS(DS::parse(slice)?),
            RecordType::RRSIG => RData::RRSIG(RRSIG::parse(message, offset, rdlength)?),
            RecordType::NSEC3 => RData::NSEC3(NSEC3::parse(slice)?),
            other => RData::Unknown(Unknown::new(other.to_u16(), slice)),
        })
    }

    /// Returns the wire length.
    pub fn wire_len(&self) -> usize {
        match self {
            RData::A(r) => r.wire_len(),
            RData::AAAA(r) => r.wire_len(),
            RData::NS(r) => r.wire_len(),
            RData::CNAME(r) => r.wire_len(),
            RData::PTR(r) => r.wire_len(),
            RData::DNAME(r) => r.wire_len(),
            RData::MX(r) => r.wire_len(),
            RData::SOA(r) => r.wire_len(),
            RData::TXT(r) => r.wire_len(),
            RData::DNSKEY(r) => r.wire_len(),
            RData::DS(r) => r.wire_len(),
            RData::RRSIG(r) => r.wire_len(),
            RData::NSEC3(r) => r.wire_len(),
            RData::Unknown(r) => r.wire_len(),
        }
    }

    /// Appends the wire form to `buf`.
    pub fn write_to(&self, buf: &mut BytesMut) {
        match self {
            RData::A(r) => r.write_to(buf),
            RData::AAAA(r) => r.write_to(buf),
            RData::NS(r) => r.write_to(buf),
            RData::CNAME(r) => r.write_to(buf),
            RData::PTR(r) => r.write_to(buf),
            RData::DNAME(r) => r.write_to(buf),
            RData::MX(r) => r.write_to(buf),
            RData::SOA(r) => r.write_to(buf),
            RData::TXT(r) => r.write_to(buf),
            RData::DNSKEY(r) => r.write_to(buf),
            RData::DS(r) => r.write_to(buf),
            RData::RRSIG(r) => r.write_to(buf),
            RData::NSEC3(r) => r.write_to(buf),
            RData::Unknown(r) => r.write_to(buf),
        }
    }

    /// Returns the IPv4 address if this is an A record.
    pub fn as_a(&self) -> Option<Ipv4Addr> {
        match self {
            RData::A(a) => Some(a.address()),
            _ => None,
        }
    }

    /// Returns the IPv6 address if this is an AAAA record.
    pub fn as_aaaa(&self) -> Option<Ipv6Addr> {
        match self {
            RData::AAAA(aaaa) => Some(aaaa.address()),
            _ => None,
        }
    }

    /// Returns the target name if this is a CNAME record.
    pub fn as_cname(&self) -> Option<&Name> {
        match self {
            RData::CNAME(cname) => Some(cname.target()),
            _ => None,
        }
    }
}

impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RData::A(r) => write!(f, "{r}"),
            RData::AAAA(r) => write!(f, "{r}"),
            RData::NS(r) => write!(f, "{r}"),
            RData::CNAME(r) => write!(f, "{r}"),
            RData::PTR(r) => write!(f, "{r}"),
            RData::DNAME(r) => write!(f, "{r}"),
            RData::MX(r) => write!(f, "{r}"),
            RData::SOA(r) => write!(f, "{r}"),
            RData::TXT(r) => write!(f, "{r}"),
            RData::DNSKEY(r) => write!(f, "{r}"),
            RData::DS(r) => write!(f, "{r}"),
            RData::RRSIG(r) => write!(f, "{r}"),
            RData::NSEC3(r) => write!(f, "{r}"),
            RData::Unknown(r) => write!(f, "{r}"),
        }
    }
}
