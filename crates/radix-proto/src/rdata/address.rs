//! Address records (A, AAAA).

use crate::error::{Error, Result};
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// A record - an IPv4 host address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct A {
    address: Ipv4Addr,
}

impl A {
    /// Creates a new A record.
    pub fn new(address: Ipv4Addr) -> Self {
        Self { address }
    }

    /// Returns the address.
    #[inline]
    pub const fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Parses from RDATA bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let octets: [u8; 4] = data
            .try_into()
            .map_err(|_| Error::invalid_rdata("A", format!("expected 4 bytes, got {}", data.len())))?;
        Ok(Self {
            address: Ipv4Addr::from(octets),
        })
    }

    /// Returns the wire length.
    pub fn wire_len(&self) -> usize {
        4
    }

    /// Appends the wire form to `buf`.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.address.octets());
    }
}

impl fmt::Display for A {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

/// AAAA record - an IPv6 host address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AAAA {
    address: Ipv6Addr,
}

impl AAAA {
    /// Creates a new AAAA record.
    pub fn new(address: Ipv6Addr) -> Self {
        Self { address }
    }

    /// Returns the address.
    #[inline]
    pub const fn address(&self) -> Ipv6Addr {
        self.address
    }

    /// Parses from RDATA bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let octets: [u8; 16] = data.try_into().map_err(|_| {
            Error::invalid_rdata("AAAA", format!("expected 16 bytes, got {}", data.len()))
        })?;
        Ok(Self {
            address: Ipv6Addr::from(octets),
        })
    }

    /// Returns the wire length.
    pub fn wire_len(&self) -> usize {
        16
    }

    /// Appends the wire form to `buf`.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.address.octets());
    }
}

impl fmt::Display for AAAA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}
