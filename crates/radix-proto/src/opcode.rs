//! DNS operation codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// DNS opcode (RFC 1035 section 4.1.1 and successors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OpCode {
    /// Standard query.
    Query = 0,
    /// Inverse query (obsolete).
    IQuery = 1,
    /// Server status request.
    Status = 2,
    /// Zone change notification - RFC 1996
    Notify = 4,
    /// Dynamic update - RFC 2136
    Update = 5,
}

impl OpCode {
    /// Creates from the 4-bit header field.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Query),
            1 => Some(Self::IQuery),
            2 => Some(Self::Status),
            4 => Some(Self::Notify),
            5 => Some(Self::Update),
            _ => None,
        }
    }

    /// Returns the numeric opcode.
    #[inline]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Query => "QUERY",
            Self::IQuery => "IQUERY",
            Self::Status => "STATUS",
            Self::Notify => "NOTIFY",
            Self::Update => "UPDATE",
        };
        write!(f, "{name}")
    }
}

impl Default for OpCode {
    fn default() -> Self {
        Self::Query
    }
}
