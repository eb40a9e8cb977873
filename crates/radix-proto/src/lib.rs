//! # radix-proto
//!
//! DNS protocol types and wire codec for the radix resolver: domain
//! names with compression-aware parsing, messages, resource records,
//! RDATA for the record types iterative resolution and DNSSEC
//! validation touch, and EDNS(0).
//!
//! Record types outside that set are carried as opaque
//! [`rdata::Unknown`] data and re-serialized byte for byte.
//!
//! ```rust,ignore
//! use radix_proto::{Message, Name, Question};
//! use std::str::FromStr;
//!
//! let question = Question::a(Name::from_str("example.com.")?);
//! let query = Message::query(question, true); // DO bit set
//! let wire = query.to_wire();
//! let parsed = Message::parse(&wire)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod class;
pub mod edns;
pub mod error;
pub mod header;
pub mod message;
pub mod name;
pub mod opcode;
pub mod question;
pub mod rcode;
pub mod rdata;
pub mod record;
pub mod rtype;

pub use class::{Class, RecordClass};
pub use edns::Edns;
pub use error::{Error, Result};
pub use header::Header;
pub use message::Message;
pub use name::Name;
pub use opcode::OpCode;
pub use question::Question;
pub use rcode::ResponseCode;
pub use rdata::RData;
pub use record::ResourceRecord;
pub use rtype::{RecordType, Type};

/// Maximum length of a DNS label (RFC 1035).
pub const MAX_LABEL_LENGTH: usize = 63;

/// Maximum wire length of a domain name (RFC 1035).
pub const MAX_NAME_LENGTH: usize = 255;

/// EDNS(0) UDP payload size advertised by the resolver.
pub const DEFAULT_EDNS_UDP_SIZE: u16 = 4096;

/// The DNS port.
pub const DNS_PORT: u16 = 53;
