//! DNS response codes.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

/// A DNS response code.
///
/// With EDNS(0) the code is 12 bits wide: the low 4 bits live in the
/// header, the upper 8 in the OPT pseudo-record TTL field.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    IntoPrimitive,
    TryFromPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(u16)]
pub enum ResponseCode {
    /// No error condition - RFC 1035
    NoError = 0,
    /// The server could not interpret the query - RFC 1035
    FormErr = 1,
    /// The server failed to process the query - RFC 1035
    ServFail = 2,
    /// The queried name does not exist - RFC 1035
    NXDomain = 3,
    /// Query kind not supported - RFC 1035
    NotImp = 4,
    /// Refused for policy reasons - RFC 1035
    Refused = 5,
    /// Name exists when it should not - RFC 2136
    YXDomain = 6,
    /// RRset exists when it should not - RFC 2136
    YXRRSet = 7,
    /// RRset that should exist does not - RFC 2136
    NXRRSet = 8,
    /// Not authoritative / not authorized - RFC 2136, RFC 8945
    NotAuth = 9,
    /// Name not contained in zone - RFC 2136
    NotZone = 10,
    /// Bad OPT version - RFC 6891
    BadVers = 16,
}

impl ResponseCode {
    /// Returns the full 12-bit numeric value.
    #[inline]
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Returns the 4-bit header portion.
    #[inline]
    pub const fn header_rcode(self) -> u8 {
        (self as u16 & 0x0F) as u8
    }

    /// Returns the upper 8 bits carried in the OPT record.
    #[inline]
    pub const fn extended_rcode(self) -> u8 {
        ((self as u16) >> 4) as u8
    }

    /// Reassembles a full code from the header and OPT portions.
    #[inline]
    pub fn from_parts(header_rcode: u8, extended_rcode: u8) -> Option<Self> {
        let value = u16::from(extended_rcode) << 4 | u16::from(header_rcode & 0x0F);
        Self::try_from(value).ok()
    }

    /// Creates a code from just the 4-bit header field.
    #[inline]
    pub fn from_header(value: u8) -> Option<Self> {
        Self::try_from(u16::from(value & 0x0F)).ok()
    }

    /// Returns true for NOERROR.
    #[inline]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::NoError)
    }

    /// Returns true for NXDOMAIN.
    #[inline]
    pub const fn is_nxdomain(self) -> bool {
        matches!(self, Self::NXDomain)
    }

    /// Returns the presentation name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoError => "NOERROR",
            Self::FormErr => "FORMERR",
            Self::ServFail => "SERVFAIL",
            Self::NXDomain => "NXDOMAIN",
            Self::NotImp => "NOTIMP",
            Self::Refused => "REFUSED",
            Self::YXDomain => "YXDOMAIN",
            Self::YXRRSet => "YXRRSET",
            Self::NXRRSet => "NXRRSET",
            Self::NotAuth => "NOTAUTH",
            Self::NotZone => "NOTZONE",
            Self::BadVers => "BADVERS",
        }
    }
}

impl std::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Default for ResponseCode {
    fn default() -> Self {
        Self::NoError
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_and_reassemble() {
        assert_eq!(ResponseCode::NXDomain.header_rcode(), 3);
        assert_eq!(ResponseCode::NXDomain.extended_rcode(), 0);
        assert_eq!(ResponseCode::BadVers.header_rcode(), 0);
        assert_eq!(ResponseCode::BadVers.extended_rcode(), 1);

        assert_eq!(
            ResponseCode::from_parts(3, 0),
            Some(ResponseCode::NXDomain)
        );
        assert_eq!(ResponseCode::from_parts(0, 1), Some(ResponseCode::BadVers));
    }
}
