//! The fixed 12-byte DNS message header.

use crate::error::{Error, Result};
use crate::opcode::OpCode;
use crate::rcode::ResponseCode;
use bitflags::bitflags;
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of the DNS header in bytes.
pub const HEADER_SIZE: usize = 12;

bitflags! {
    /// Header flag bits, excluding the opcode and rcode fields.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct HeaderFlags: u16 {
        /// Query (0) / response (1).
        const QR = 0x8000;
        /// Authoritative answer.
        const AA = 0x0400;
        /// Truncated message.
        const TC = 0x0200;
        /// Recursion desired.
        const RD = 0x0100;
        /// Recursion available.
        const RA = 0x0080;
        /// Authentic data (DNSSEC).
        const AD = 0x0020;
        /// Checking disabled (DNSSEC).
        const CD = 0x0010;
    }
}

impl Default for HeaderFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// A parsed DNS header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Message identifier.
    pub id: u16,
    /// Flag bits.
    pub flags: HeaderFlags,
    /// Operation code.
    pub opcode: OpCode,
    /// Response code (possibly EDNS-extended after message parsing).
    pub rcode: ResponseCode,
    /// Question count.
    pub qd_count: u16,
    /// Answer count.
    pub an_count: u16,
    /// Authority count.
    pub ns_count: u16,
    /// Additional count.
    pub ar_count: u16,
}

impl Header {
    /// Creates a query header with a random ID.
    ///
    /// The RD bit is left clear: an iterative resolver asks authorities,
    /// not recursors.
    pub fn query() -> Self {
        Self {
            id: rand::random(),
            flags: HeaderFlags::empty(),
            opcode: OpCode::Query,
            rcode: ResponseCode::NoError,
            qd_count: 0,
            an_count: 0,
            ns_count: 0,
            ar_count: 0,
        }
    }

    /// Creates a response header answering `query`.
    pub fn response_from(query: &Header) -> Self {
        Self {
            id: query.id,
            flags: HeaderFlags::QR | (query.flags & HeaderFlags::RD),
            opcode: query.opcode,
            rcode: ResponseCode::NoError,
            qd_count: query.qd_count,
            an_count: 0,
            ns_count: 0,
            ar_count: 0,
        }
    }

    /// Returns true if this is a response.
    #[inline]
    pub fn is_response(&self) -> bool {
        self.flags.contains(HeaderFlags::QR)
    }

    /// Returns true if the AA bit is set.
    #[inline]
    pub fn is_authoritative(&self) -> bool {
        self.flags.contains(HeaderFlags::AA)
    }

    /// Returns true if the TC bit is set.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.flags.contains(HeaderFlags::TC)
    }

    /// Sets or clears the TC bit.
    #[inline]
    pub fn set_truncated(&mut self, tc: bool) {
        self.flags.set(HeaderFlags::TC, tc);
    }

    /// Returns true if the AD bit is set.
    #[inline]
    pub fn is_authentic_data(&self) -> bool {
        self.flags.contains(HeaderFlags::AD)
    }

    /// Parses a header from the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::buffer_too_short(HEADER_SIZE, data.len()));
        }

        let id = u16::from_be_bytes([data[0], data[1]]);
        let raw_flags = u16::from_be_bytes([data[2], data[3]]);

        let opcode_value = ((raw_flags >> 11) & 0x0F) as u8;
        let opcode = OpCode::from_u8(opcode_value).ok_or(Error::InvalidOpCode {
            value: opcode_value,
        })?;

        let rcode_value = (raw_flags & 0x0F) as u8;
        let rcode = ResponseCode::from_header(rcode_value).ok_or(Error::InvalidResponseCode {
            value: u16::from(rcode_value),
        })?;

        let flags = HeaderFlags::from_bits_truncate(raw_flags);

        Ok(Self {
            id,
            flags,
            opcode,
            rcode,
            qd_count: u16::from_be_bytes([data[4], data[5]]),
            an_count: u16::from_be_bytes([data[6], data[7]]),
            ns_count: u16::from_be_bytes([data[8], data[9]]),
            ar_count: u16::from_be_bytes([data[10], data[11]]),
        })
    }

    /// Appends the wire form to `buf`.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.id.to_be_bytes());

        let raw_flags = self.flags.bits()
            | (u16::from(self.opcode.to_u8()) << 11)
            | u16::from(self.rcode.header_rcode());
        buf.extend_from_slice(&raw_flags.to_be_bytes());

        buf.extend_from_slice(&self.qd_count.to_be_bytes());
        buf.extend_from_slice(&self.an_count.to_be_bytes());
        buf.extend_from_slice(&self.ns_count.to_be_bytes());
        buf.extend_from_slice(&self.ar_count.to_be_bytes());
    }
}

impl Default for Header {
    fn default() -> Self {
        Self {
            id: 0,
            flags: HeaderFlags::empty(),
            opcode: OpCode::Query,
            rcode: ResponseCode::NoError,
            qd_count: 0,
            an_count: 0,
            ns_count: 0,
            ar_count: 0,
        }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "opcode: {}, status: {}, id: {}; QUERY: {}, ANSWER: {}, AUTHORITY: {}, ADDITIONAL: {}",
            self.opcode, self.rcode, self.id, self.qd_count, self.an_count, self.ns_count,
            self.ar_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        let mut header = Header::query();
        header.id = 0xBEEF;
        header.qd_count = 1;
        header.set_truncated(true);

        let mut buf = BytesMut::new();
        header.write_to(&mut buf);
        assert_eq!(buf.len(), HEADER_SIZE);

        let parsed = Header::parse(&buf).unwrap();
        assert_eq!(parsed, header);
        assert!(parsed.is_truncated());
        assert!(!parsed.is_response());
    }

    #[test]
    fn response_mirrors_query() {
        let mut query = Header::query();
        query.qd_count = 1;
        let response = Header::response_from(&query);
        assert_eq!(response.id, query.id);
        assert!(response.is_response());
        assert_eq!(response.qd_count, 1);
    }
}
