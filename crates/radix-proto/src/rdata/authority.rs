//! SOA - start of authority.

use crate::error::{Error, Result};
use crate::name::{Name, NameParser};
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use std::fmt;

/// SOA record - zone apex bookkeeping (RFC 1035 section 3.3.13).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SOA {
    mname: Name,
    rname: Name,
    serial: u32,
    refresh: u32,
    retry: u32,
    expire: u32,
    minimum: u32,
}

impl SOA {
    /// Creates a new SOA record.
    pub fn new(
        mname: Name,
        rname: Name,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    ) -> Self {
        Self {
            mname,
            rname,
            serial,
            refresh,
            retry,
            expire,
            minimum,
        }
    }

    /// Returns the primary nameserver name.
    pub fn mname(&self) -> &Name {
        &self.mname
    }

    /// Returns the responsible mailbox name.
    pub fn rname(&self) -> &Name {
        &self.rname
    }

    /// Returns the zone serial.
    pub const fn serial(&self) -> u32 {
        self.serial
    }

    /// Returns the refresh interval.
    pub const fn refresh(&self) -> u32 {
        self.refresh
    }

    /// Returns the retry interval.
    pub const fn retry(&self) -> u32 {
        self.retry
    }

    /// Returns the expire interval.
    pub const fn expire(&self) -> u32 {
        self.expire
    }

    /// Returns the negative-caching minimum TTL.
    pub const fn minimum(&self) -> u32 {
        self.minimum
    }

    /// Parses from the message at the RDATA offset.
    pub fn parse(message: &[u8], offset: usize) -> Result<Self> {
        let parser = NameParser::new(message);
        let (mname, mname_len) = parser.parse_name(offset)?;
        let (rname, rname_len) = parser.parse_name(offset + mname_len)?;

        let fixed = offset + mname_len + rname_len;
        if fixed + 20 > message.len() {
            return Err(Error::buffer_too_short(fixed + 20, message.len()));
        }
        let word = |i: usize| u32::from_be_bytes(message[fixed + i..fixed + i + 4].try_into().unwrap());

        Ok(Self {
            mname,
            rname,
            serial: word(0),
            refresh: word(4),
            retry: word(8),
            expire: word(12),
            minimum: word(16),
        })
    }

    /// Returns the wire length.
    pub fn wire_len(&self) -> usize {
        self.mname.wire_len() + self.rname.wire_len() + 20
    }

    /// Appends the wire form to `buf`.
    pub fn write_to(&self, buf: &mut BytesMut) {
        self.mname.write_wire(buf);
        self.rname.write_wire(buf);
        buf.extend_from_slice(&self.serial.to_be_bytes());
        buf.extend_from_slice(&self.refresh.to_be_bytes());
        buf.extend_from_slice(&self.retry.to_be_bytes());
        buf.extend_from_slice(&self.expire.to_be_bytes());
        buf.extend_from_slice(&self.minimum.to_be_bytes());
    }
}

impl fmt::Display for SOA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {}",
            self.mname, self.rname, self.serial, self.refresh, self.retry, self.expire,
            self.minimum
        )
    }
}
