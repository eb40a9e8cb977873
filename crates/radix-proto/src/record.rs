//! Resource records and section parsing.

use crate::class::{Class, RecordClass};
use crate::error::{Error, Result};
use crate::name::{Name, NameParser};
use crate::rdata::RData;
use crate::rtype::{RecordType, Type};
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single resource record: owner name, type, class, TTL, and data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRecord {
    name: Name,
    rtype: Type,
    rclass: Class,
    ttl: u32,
    rdata: RData,
}

impl ResourceRecord {
    /// Creates a record with a known type, class IN.
    pub fn new(name: Name, rtype: RecordType, ttl: u32, rdata: RData) -> Self {
        Self {
            name,
            rtype: Type::Known(rtype),
            rclass: Class::Known(RecordClass::IN),
            ttl,
            rdata,
        }
    }

    /// Creates an A record.
    pub fn a(name: Name, ttl: u32, addr: std::net::Ipv4Addr) -> Self {
        Self::new(
            name,
            RecordType::A,
            ttl,
            RData::A(crate::rdata::A::new(addr)),
        )
    }

    /// Creates an AAAA record.
    pub fn aaaa(name: Name, ttl: u32, addr: std::net::Ipv6Addr) -> Self {
        Self::new(
            name,
            RecordType::AAAA,
            ttl,
            RData::AAAA(crate::rdata::AAAA::new(addr)),
        )
    }

    /// Creates an NS record.
    pub fn ns(name: Name, ttl: u32, nsdname: Name) -> Self {
        Self::new(
            name,
            RecordType::NS,
            ttl,
            RData::NS(crate::rdata::NS::new(nsdname)),
        )
    }

    /// Creates a CNAME record.
    pub fn cname(name: Name, ttl: u32, target: Name) -> Self {
        Self::new(
            name,
            RecordType::CNAME,
            ttl,
            RData::CNAME(crate::rdata::CNAME::new(target)),
        )
    }

    /// Returns the owner name.
    #[inline]
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Returns the raw type code wrapper.
    #[inline]
    pub fn rtype(&self) -> Type {
        self.rtype
    }

    /// Returns the record type if known.
    #[inline]
    pub fn record_type(&self) -> Option<RecordType> {
        self.rtype.as_known()
    }

    /// Returns the class code wrapper.
    #[inline]
    pub fn rclass(&self) -> Class {
        self.rclass
    }

    /// Returns the TTL in seconds.
    #[inline]
    pub const fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Returns a copy with a different TTL.
    #[must_use]
    pub fn with_ttl(&self, ttl: u32) -> Self {
        let mut copy = self.clone();
        copy.ttl = ttl;
        copy
    }

    /// Returns the record data.
    #[inline]
    pub fn rdata(&self) -> &RData {
        &self.rdata
    }

    /// Parses one record from `data` at `offset`; returns it together
    /// with the number of bytes consumed.
    pub fn parse(data: &[u8], offset: usize) -> Result<(Self, usize)> {
        let parser = NameParser::new(data);
        let (name, name_len) = parser.parse_name(offset)?;

        let fixed = offset + name_len;
        if fixed + 10 > data.len() {
            return Err(Error::buffer_too_short(fixed + 10, data.len()));
        }

        let rtype_value = u16::from_be_bytes([data[fixed], data[fixed + 1]]);
        let rclass_value = u16::from_be_bytes([data[fixed + 2], data[fixed + 3]]);
        let ttl = u32::from_be_bytes(data[fixed + 4..fixed + 8].try_into().unwrap());
        let rdlength = u16::from_be_bytes([data[fixed + 8], data[fixed + 9]]);

        let rdata_start = fixed + 10;
        if rdata_start + rdlength as usize > data.len() {
            return Err(Error::buffer_too_short(
                rdata_start + rdlength as usize,
                data.len(),
            ));
        }

        let rtype = Type::from_u16(rtype_value);
        let rdata = match rtype {
            Type::Known(known) => RData::parse(known, data, rdata_start, rdlength)?,
            Type::Unknown(code) => RData::Unknown(crate::rdata::Unknown::new(
                code,
                &data[rdata_start..rdata_start + rdlength as usize],
            )),
        };

        Ok((
            Self {
                name,
                rtype,
                rclass: Class::from_u16(rclass_value),
                ttl,
                rdata,
            },
            name_len + 10 + rdlength as usize,
        ))
    }

    /// Returns the wire-format length.
    pub fn wire_len(&self) -> usize {
        self.name.wire_len() + 10 + self.rdata.wire_len()
    }

    /// Appends the wire form to `buf`.
    pub fn write_to(&self, buf: &mut BytesMut) {
        self.name.write_wire(buf);
        buf.extend_from_slice(&self.rtype.to_u16().to_be_bytes());
        buf.extend_from_slice(&self.rclass.to_u16().to_be_bytes());
        buf.extend_from_slice(&self.ttl.to_be_bytes());
        buf.extend_from_slice(&(self.rdata.wire_len() as u16).to_be_bytes());
        self.rdata.write_to(buf);
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.name, self.ttl, self.rclass, self.rtype, self.rdata
        )
    }
}

/// Sequential parser over one record section.
#[derive(Debug)]
pub struct RecordParser<'a> {
    data: &'a [u8],
    offset: usize,
    remaining: u16,
}

impl<'a> RecordParser<'a> {
    /// Creates a parser for `count` records starting at `offset`.
    #[inline]
    pub const fn new(data: &'a [u8], offset: usize, count: u16) -> Self {
        Self {
            data,
            offset,
            remaining: count,
        }
    }

    /// Returns the offset just past the last parsed record.
    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Parses the next record, or `None` when the section is exhausted.
    pub fn next(&mut self) -> Result<Option<ResourceRecord>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let (record, consumed) = ResourceRecord::parse(self.data, self.offset)?;
        self.offset += consumed;
        self.remaining -= 1;
        Ok(Some(record))
    }
}
