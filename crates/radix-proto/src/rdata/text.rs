//! TXT - free-form text strings.

use crate::error::{Error, Result};
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use std::fmt;

/// TXT record - one or more length-prefixed character strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TXT {
    strings: Vec<Vec<u8>>,
}

impl TXT {
    /// Creates a TXT record from one string.
    pub fn from_string(s: impl Into<Vec<u8>>) -> Self {
        Self {
            strings: vec![s.into()],
        }
    }

    /// Returns the character strings.
    pub fn strings(&self) -> &[Vec<u8>] {
        &self.strings
    }

    /// Parses from RDATA bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut strings = Vec::new();
        let mut pos = 0;
        while pos < data.len() {
            let len = data[pos] as usize;
            pos += 1;
            if pos + len > data.len() {
                return Err(Error::invalid_rdata("TXT", "string truncated"));
            }
            strings.push(data[pos..pos + len].to_vec());
            pos += len;
        }
        Ok(Self { strings })
    }

    /// Returns the wire length.
    pub fn wire_len(&self) -> usize {
        self.strings.iter().map(|s| 1 + s.len()).sum()
    }

    /// Appends the wire form to `buf`.
    pub fn write_to(&self, buf: &mut BytesMut) {
        for s in &self.strings {
            buf.extend_from_slice(&[s.len() as u8]);
            buf.extend_from_slice(s);
        }
    }
}

impl fmt::Display for TXT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for s in &self.strings {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "\"{}\"", String::from_utf8_lossy(s))?;
            first = false;
        }
        Ok(())
    }
}
