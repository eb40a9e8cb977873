//! # radix-dnssec
//!
//! DNSSEC validation for the radix resolver:
//!
//! - RRSIG verification over the answer and authority sections of a
//!   message ([`verify_rrsig`]),
//! - the DS chain check linking a zone's DNSKEY RRset to its parent
//!   ([`check_ds`]),
//! - NSEC3 proofs of non-existence for NXDOMAIN, NODATA, and insecure
//!   delegations ([`nsec3`]),
//! - the cryptographic primitives behind them ([`crypto`]), with
//!   signature verification behind the [`SignatureVerifier`] trait.
//!
//! The resolver loop owns DNSKEY acquisition and decides *when* to
//! validate; this crate only answers *whether* a given message, key
//! set, and proof material hold together.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod crypto;
pub mod nsec3;
pub mod verify;

pub use crypto::{dnskey_to_ds, signature_data, SignatureVerifier, StandardVerifier};
pub use nsec3::{nsec3_hash, nsec3_records, verify_delegation, verify_name_error, verify_nodata};
pub use verify::{build_key_map, check_ds, verify_rrsig, KeyMap};

use thiserror::Error;

/// Result type for validation operations.
pub type Result<T> = std::result::Result<T, DnssecError>;

/// Validation failures. Any of these is fatal to the lookup that
/// triggered the validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DnssecError {
    /// A zone that should be signed returned no usable DNSKEY records.
    #[error("no DNSKEY records found")]
    NoDnskey,

    /// The parent's DS set references no key in the zone's key map.
    #[error("no KSK DNSKEY found for DS records")]
    MissingKsk,

    /// The referenced KSK could not be converted to a DS record.
    #[error("failed to convert KSK DNSKEY record to DS record")]
    FailedToConvertKsk,

    /// The KSK digest does not match the DS from the parent zone.
    #[error("KSK DNSKEY record does not match DS record from parent zone")]
    MismatchingDs,

    /// A non-empty section carried no RRSIGs at all.
    #[error("no RRSIG records for zone that should be signed")]
    NoSignatures,

    /// An RRSIG references a key tag absent from the key map.
    #[error("no matching DNSKEY found for RRSIG records")]
    MissingDnskey,

    /// The signature's inception/expiration window excludes now.
    #[error("incorrect signature validity period")]
    InvalidSignaturePeriod,

    /// An RRSIG covers an RRset that is not present.
    #[error("signed records are missing")]
    MissingSigned,

    /// The cryptographic signature check failed.
    #[error("signature verification failed: {0}")]
    SignatureInvalid(String),

    /// The signing algorithm is not supported.
    #[error("unsupported DNSSEC algorithm: {0}")]
    UnsupportedAlgorithm(u8),

    /// A DNSKEY without the zone-key bit signed something.
    #[error("invalid DNSKEY flags: {0}")]
    InvalidKeyFlags(u16),

    /// A DNSKEY with a protocol other than 3.
    #[error("invalid DNSKEY protocol: expected 3, got {0}")]
    InvalidKeyProtocol(u8),

    /// The public key bytes could not be interpreted.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// No NSEC3 record's owner hash matched the name.
    #[error("no NSEC3 record matched the hashed name")]
    Nsec3Missing,

    /// No NSEC3 record's hash interval covered the name.
    #[error("no NSEC3 record covered the hashed name")]
    Nsec3Coverage,

    /// No ancestor of the name is matched by the NSEC3 set.
    #[error("no closest encloser found in the NSEC3 set")]
    Nsec3NoClosestEncloser,

    /// Coverage exists but the covering record lacks the opt-out bit.
    #[error("NSEC3 record covering the next closer name is not opt-out")]
    Nsec3OptOut,

    /// The type bitmap proves the queried data exists after all.
    #[error("NSEC3 type bitmap proves the queried type exists")]
    Nsec3TypeExists,

    /// A delegation's NSEC3 record is missing the NS type.
    #[error("NSEC3 record for the delegation is missing the NS type")]
    Nsec3MissingNs,
}
