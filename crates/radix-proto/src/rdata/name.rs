//! Records whose RDATA is (mostly) a domain name: NS, CNAME, PTR, DNAME, MX.
//!
//! These need the full message for parsing because their embedded names
//! may use compression pointers.

use crate::error::Result;
use crate::name::{Name, NameParser};
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! single_name_rdata {
    ($(#[$doc:meta])* $ty:ident, $accessor:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $ty {
            $accessor: Name,
        }

        impl $ty {
            /// Creates the record from its target name.
            pub fn new($accessor: Name) -> Self {
                Self { $accessor }
            }

            /// Returns the embedded name.
            #[inline]
            pub fn $accessor(&self) -> &Name {
                &self.$accessor
            }

            /// Parses from the message at the RDATA offset.
            pub fn parse(message: &[u8], offset: usize) -> Result<Self> {
                let parser = NameParser::new(message);
                let ($accessor, _) = parser.parse_name(offset)?;
                Ok(Self { $accessor })
            }

            /// Returns the wire length.
            pub fn wire_len(&self) -> usize {
                self.$accessor.wire_len()
            }

            /// Appends the wire form to `buf`.
            pub fn write_to(&self, buf: &mut BytesMut) {
                self.$accessor.write_wire(buf);
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.$accessor)
            }
        }
    };
}

single_name_rdata!(
    /// NS record - an authoritative nameserver for the owner zone.
    NS,
    nsdname
);

single_name_rdata!(
    /// CNAME record - the canonical name of an alias.
    CNAME,
    target
);

single_name_rdata!(
    /// PTR record - a pointer to another name.
    PTR,
    ptrdname
);

single_name_rdata!(
    /// DNAME record - delegation of an entire subtree (RFC 6672).
    DNAME,
    target
);

/// MX record - a mail exchange with preference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MX {
    preference: u16,
    exchange: Name,
}

impl MX {
    /// Creates a new MX record.
    pub fn new(preference: u16, exchange: Name) -> Self {
        Self {
            preference,
            exchange,
        }
    }

    /// Returns the preference value.
    #[inline]
    pub const fn preference(&self) -> u16 {
        self.preference
    }

    /// Returns the exchange name.
    #[inline]
    pub fn exchange(&self) -> &Name {
        &self.exchange
    }

    /// Parses from the message at the RDATA offset.
    pub fn parse(message: &[u8], offset: usize) -> Result<Self> {
        if offset + 2 > message.len() {
            return Err(crate::error::Error::buffer_too_short(
                offset + 2,
                message.len(),
            ));
        }
        let preference = u16::from_be_bytes([message[offset], message[offset + 1]]);
        let parser = NameParser::new(message);
        let (exchange, _) = parser.parse_name(offset + 2)?;
        Ok(Self {
            preference,
            exchange,
        })
    }

    /// Returns the wire length.
    pub fn wire_len(&self) -> usize {
        2 + self.exchange.wire_len()
    }

    /// Appends the wire form to `buf`.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.preference.to_be_bytes());
        self.exchange.write_wire(buf);
    }
}

impl fmt::Display for MX {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.preference, self.exchange)
    }
}
