//! Pass-through for record types this crate does not interpret.

use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An uninterpreted RDATA blob, kept exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unknown {
    type_code: u16,
    data: Vec<u8>,
}

impl Unknown {
    /// Creates an unknown RDATA from its type code and raw bytes.
    pub fn new(type_code: u16, data: &[u8]) -> Self {
        Self {
            type_code,
            data: data.to_vec(),
        }
    }

    /// Returns the numeric record type.
    #[inline]
    pub const fn type_code(&self) -> u16 {
        self.type_code
    }

    /// Returns the raw RDATA bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the wire length.
    pub fn wire_len(&self) -> usize {
        self.data.len()
    }

    /// Appends the wire form to `buf`.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.data);
    }
}

impl fmt::Display for Unknown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\\# {} ", self.data.len())?;
        for byte in &self.data {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}
