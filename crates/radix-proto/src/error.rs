//! Protocol error types.

use thiserror::Error;

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while parsing or serializing DNS messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Buffer is too short to contain the expected data.
    #[error("buffer too short: expected at least {expected} bytes, got {actual}")]
    BufferTooShort {
        /// Expected minimum size.
        expected: usize,
        /// Actual buffer size.
        actual: usize,
    },

    /// Unexpected end of data while parsing.
    #[error("unexpected end of data at offset {offset}")]
    UnexpectedEof {
        /// Byte offset where the data ran out.
        offset: usize,
    },

    /// Invalid data encountered during parsing.
    #[error("invalid data at offset {offset}: {message}")]
    InvalidData {
        /// Byte offset of the invalid data.
        offset: usize,
        /// Description of the problem.
        message: String,
    },

    /// Label exceeds the 63 byte maximum.
    #[error("label too long: {length} bytes exceeds maximum of 63")]
    LabelTooLong {
        /// Actual label length.
        length: usize,
    },

    /// Name exceeds the 255 byte wire maximum.
    #[error("name too long: {length} bytes exceeds maximum of 255")]
    NameTooLong {
        /// Actual wire length.
        length: usize,
    },

    /// Invalid character in a presentation-format label.
    #[error("invalid character '{character}' in label at position {position}")]
    InvalidLabelChar {
        /// The offending character.
        character: char,
        /// Position within the label.
        position: usize,
    },

    /// Compression pointer that points forward or at itself.
    #[error("invalid compression pointer at offset {offset}: points to {target}")]
    InvalidCompressionPointer {
        /// Offset of the pointer.
        offset: usize,
        /// Target offset the pointer references.
        target: usize,
    },

    /// Too many compression pointer jumps while parsing one name.
    #[error("too many compression pointer jumps (>{max_jumps})")]
    TooManyCompressionJumps {
        /// Maximum allowed jumps.
        max_jumps: usize,
    },

    /// Invalid opcode value in the header.
    #[error("invalid opcode: {value}")]
    InvalidOpCode {
        /// The invalid opcode value.
        value: u8,
    },

    /// Invalid response code value.
    #[error("invalid response code: {value}")]
    InvalidResponseCode {
        /// The invalid rcode value.
        value: u16,
    },

    /// RDATA that does not match its record type's wire layout.
    #[error("invalid RDATA for {rtype}: {message}")]
    InvalidRData {
        /// Record type name.
        rtype: String,
        /// Description of the problem.
        message: String,
    },

    /// More than one OPT pseudo-record in a message.
    #[error("multiple OPT records in message (only one allowed)")]
    MultipleOptRecords,

    /// EDNS version other than 0.
    #[error("unsupported EDNS version {version}")]
    UnsupportedEdnsVersion {
        /// The version advertised by the peer.
        version: u8,
    },
}

impl Error {
    /// Creates a new `BufferTooShort` error.
    #[inline]
    pub fn buffer_too_short(expected: usize, actual: usize) -> Self {
        Self::BufferTooShort { expected, actual }
    }

    /// Creates a new `InvalidData` error.
    #[inline]
    pub fn invalid_data(offset: usize, message: impl Into<String>) -> Self {
        Self::InvalidData {
            offset,
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRData` error.
    #[inline]
    pub fn invalid_rdata(rtype: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRData {
            rtype: rtype.into(),
            message: message.into(),
        }
    }
}
