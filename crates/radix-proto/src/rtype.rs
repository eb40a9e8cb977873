//! DNS record types.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A DNS record type the resolver knows how to interpret.
///
/// Anything else travels through the system as [`Type::Unknown`] with its
/// RDATA preserved verbatim.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    IntoPrimitive,
    TryFromPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(u16)]
pub enum RecordType {
    /// IPv4 address - RFC 1035
    A = 1,

    /// Authoritative name server - RFC 1035
    NS = 2,

    /// Canonical name (alias) - RFC 1035
    CNAME = 5,

    /// Start of authority - RFC 1035
    SOA = 6,

    /// Domain name pointer - RFC 1035
    PTR = 12,

    /// Mail exchange - RFC 1035
    MX = 15,

    /// Text strings - RFC 1035
    TXT = 16,

    /// IPv6 address - RFC 3596
    AAAA = 28,

    /// Server selection - RFC 2782
    SRV = 33,

    /// Delegation name - RFC 6672
    DNAME = 39,

    /// EDNS(0) option pseudo-record - RFC 6891
    OPT = 41,

    /// Delegation signer - RFC 4034
    DS = 43,

    /// DNSSEC signature - RFC 4034
    RRSIG = 46,

    /// Next secure - RFC 4034
    NSEC = 47,

    /// DNS public key - RFC 4034
    DNSKEY = 48,

    /// Next secure v3 - RFC 5155
    NSEC3 = 50,

    /// NSEC3 parameters - RFC 5155
    NSEC3PARAM = 51,

    /// Any record type - RFC 1035, RFC 8482
    ANY = 255,
}

impl RecordType {
    /// Returns the numeric type code.
    #[inline]
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Returns the presentation name of the type.
    pub const fn name(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::NS => "NS",
            Self::CNAME => "CNAME",
            Self::SOA => "SOA",
            Self::PTR => "PTR",
            Self::MX => "MX",
            Self::TXT => "TXT",
            Self::AAAA => "AAAA",
            Self::SRV => "SRV",
            Self::DNAME => "DNAME",
            Self::OPT => "OPT",
            Self::DS => "DS",
            Self::RRSIG => "RRSIG",
            Self::NSEC => "NSEC",
            Self::DNSKEY => "DNSKEY",
            Self::NSEC3 => "NSEC3",
            Self::NSEC3PARAM => "NSEC3PARAM",
            Self::ANY => "ANY",
        }
    }

    /// Returns true for the DNSSEC record types.
    #[inline]
    pub const fn is_dnssec(self) -> bool {
        matches!(
            self,
            Self::DS | Self::RRSIG | Self::NSEC | Self::DNSKEY | Self::NSEC3 | Self::NSEC3PARAM
        )
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A record type code, known or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// A type this crate understands.
    Known(RecordType),
    /// Any other type code.
    Unknown(u16),
}

impl Type {
    /// Wraps a raw type code.
    pub fn from_u16(value: u16) -> Self {
        RecordType::try_from(value)
            .map(Self::Known)
            .unwrap_or(Self::Unknown(value))
    }

    /// Returns the raw type code.
    #[inline]
    pub const fn to_u16(self) -> u16 {
        match self {
            Self::Known(t) => t.to_u16(),
            Self::Unknown(v) => v,
        }
    }

    /// Returns the known type, if any.
    #[inline]
    pub const fn as_known(self) -> Option<RecordType> {
        match self {
            Self::Known(t) => Some(t),
            Self::Unknown(_) => None,
        }
    }
}

impl From<RecordType> for Type {
    fn from(t: RecordType) -> Self {
        Self::Known(t)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(t) => write!(f, "{t}"),
            Self::Unknown(v) => write!(f, "TYPE{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_round_trip() {
        assert_eq!(Type::from_u16(1), Type::Known(RecordType::A));
        assert_eq!(Type::from_u16(1).to_u16(), 1);

        let odd = Type::from_u16(4095);
        assert_eq!(odd, Type::Unknown(4095));
        assert_eq!(odd.to_u16(), 4095);
        assert_eq!(odd.as_known(), None);
        assert_eq!(odd.to_string(), "TYPE4095");
    }

    #[test]
    fn dnssec_classification() {
        assert!(RecordType::RRSIG.is_dnssec());
        assert!(RecordType::NSEC3.is_dnssec());
        assert!(!RecordType::A.is_dnssec());
    }
}
