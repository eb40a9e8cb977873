//! EDNS(0) support (RFC 6891).
//!
//! The OPT pseudo-record overloads the class field with the sender's UDP
//! payload size and the TTL field with the extended rcode, version, and
//! the DO flag. Options in the RDATA are preserved as opaque bytes; this
//! resolver sets none of its own.

use crate::error::{Error, Result};
use bytes::BytesMut;
use serde::{Deserialize, Serialize};

/// EDNS(0) state extracted from (or destined for) an OPT pseudo-record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edns {
    version: u8,
    udp_size: u16,
    extended_rcode: u8,
    dnssec_ok: bool,
    options: Vec<u8>,
}

impl Edns {
    /// Default advertised UDP payload size.
    pub const DEFAULT_UDP_SIZE: u16 = 4096;

    /// Creates EDNS state with the default payload size and DO clear.
    pub fn new() -> Self {
        Self {
            version: 0,
            udp_size: Self::DEFAULT_UDP_SIZE,
            extended_rcode: 0,
            dnssec_ok: false,
            options: Vec::new(),
        }
    }

    /// Creates EDNS state with the DO (DNSSEC OK) flag set.
    pub fn with_dnssec() -> Self {
        Self {
            dnssec_ok: true,
            ..Self::new()
        }
    }

    /// Returns the EDNS version (always 0 on anything we emit).
    #[inline]
    pub const fn version(&self) -> u8 {
        self.version
    }

    /// Returns the advertised UDP payload size.
    #[inline]
    pub const fn udp_size(&self) -> u16 {
        self.udp_size
    }

    /// Returns the upper 8 bits of the response code.
    #[inline]
    pub const fn extended_rcode(&self) -> u8 {
        self.extended_rcode
    }

    /// Sets the extended rcode bits.
    pub fn set_extended_rcode(&mut self, rcode: u8) {
        self.extended_rcode = rcode;
    }

    /// Returns true if the DO flag is set.
    #[inline]
    pub const fn dnssec_ok(&self) -> bool {
        self.dnssec_ok
    }

    /// Sets the DO flag.
    pub fn set_dnssec_ok(&mut self, ok: bool) {
        self.dnssec_ok = ok;
    }

    /// Builds EDNS state from an OPT record's class, TTL, and RDATA.
    pub fn parse(class: u16, ttl: u32, rdata: &[u8]) -> Result<Self> {
        let version = ((ttl >> 16) & 0xFF) as u8;
        if version != 0 {
            return Err(Error::UnsupportedEdnsVersion { version });
        }
        Ok(Self {
            version,
            udp_size: class,
            extended_rcode: (ttl >> 24) as u8,
            dnssec_ok: (ttl & 0x8000) != 0,
            options: rdata.to_vec(),
        })
    }

    /// Returns the wire length of the full OPT pseudo-record.
    pub fn wire_len(&self) -> usize {
        // root name + type + class + ttl + rdlength + options
        1 + 2 + 2 + 4 + 2 + self.options.len()
    }

    /// Appends the OPT pseudo-record to `buf`.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&[0]); // owner is the root
        buf.extend_from_slice(&41u16.to_be_bytes()); // TYPE = OPT
        buf.extend_from_slice(&self.udp_size.to_be_bytes());

        let flags: u32 = if self.dnssec_ok { 0x8000 } else { 0 };
        let ttl = (u32::from(self.extended_rcode) << 24) | (u32::from(self.version) << 16) | flags;
        buf.extend_from_slice(&ttl.to_be_bytes());

        buf.extend_from_slice(&(self.options.len() as u16).to_be_bytes());
        buf.extend_from_slice(&self.options);
    }
}

impl Default for Edns {
    fn default() -> Self {
        Self::new()
    }
}
