//! DNSSEC record types: DNSKEY, DS, RRSIG, NSEC3.

use crate::error::{Error, Result};
use crate::name::{Name, NameParser};
use bytes::BytesMut;
use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};
use std::fmt;

/// DNSKEY record - a zone's public key (RFC 4034).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DNSKEY {
    flags: u16,
    protocol: u8,
    algorithm: u8,
    public_key: Vec<u8>,
}

impl DNSKEY {
    /// Zone Key flag bit.
    pub const FLAG_ZONE_KEY: u16 = 0x0100;
    /// Secure Entry Point flag bit.
    pub const FLAG_SEP: u16 = 0x0001;
    /// Flags value of a zone-signing key.
    pub const FLAGS_ZSK: u16 = 256;
    /// Flags value of a key-signing key.
    pub const FLAGS_KSK: u16 = 257;

    /// Creates a new DNSKEY record.
    pub fn new(flags: u16, protocol: u8, algorithm: u8, public_key: impl Into<Vec<u8>>) -> Self {
        Self {
            flags,
            protocol,
            algorithm,
            public_key: public_key.into(),
        }
    }

    /// Returns the flags field.
    #[inline]
    pub const fn flags(&self) -> u16 {
        self.flags
    }

    /// Returns true if the zone-key bit is set.
    #[inline]
    pub const fn is_zone_key(&self) -> bool {
        (self.flags & Self::FLAG_ZONE_KEY) != 0
    }

    /// Returns true if the secure-entry-point bit is set (a KSK).
    #[inline]
    pub const fn is_sep(&self) -> bool {
        (self.flags & Self::FLAG_SEP) != 0
    }

    /// Returns the protocol field (3 for anything valid).
    #[inline]
    pub const fn protocol(&self) -> u8 {
        self.protocol
    }

    /// Returns the algorithm number.
    #[inline]
    pub const fn algorithm(&self) -> u8 {
        self.algorithm
    }

    /// Returns the public key bytes.
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Computes the key tag (RFC 4034 appendix B).
    pub fn key_tag(&self) -> u16 {
        let mut buf = BytesMut::with_capacity(4 + self.public_key.len());
        self.write_to(&mut buf);

        let mut ac: u32 = 0;
        for (i, &byte) in buf.iter().enumerate() {
            if i & 1 == 0 {
                ac += u32::from(byte) << 8;
            } else {
                ac += u32::from(byte);
            }
        }
        ac += ac >> 16;
        (ac & 0xFFFF) as u16
    }

    /// Parses from RDATA bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(Error::invalid_rdata("DNSKEY", "too short"));
        }
        Ok(Self {
            flags: u16::from_be_bytes([data[0], data[1]]),
            protocol: data[2],
            algorithm: data[3],
            public_key: data[4..].to_vec(),
        })
    }

    /// Returns the wire length.
    pub fn wire_len(&self) -> usize {
        4 + self.public_key.len()
    }

    /// Appends the wire form to `buf`.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.flags.to_be_bytes());
        buf.extend_from_slice(&[self.protocol, self.algorithm]);
        buf.extend_from_slice(&self.public_key);
    }
}

impl fmt::Display for DNSKEY {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} ({} bytes, tag={})",
            self.flags,
            self.protocol,
            self.algorithm,
            self.public_key.len(),
            self.key_tag()
        )
    }
}

/// DS record - a digest of a child zone's KSK, published in the parent
/// (RFC 4034).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DS {
    key_tag: u16,
    algorithm: u8,
    digest_type: u8,
    digest: Vec<u8>,
}

impl DS {
    /// Creates a new DS record.
    pub fn new(key_tag: u16, algorithm: u8, digest_type: u8, digest: impl Into<Vec<u8>>) -> Self {
        Self {
            key_tag,
            algorithm,
            digest_type,
            digest: digest.into(),
        }
    }

    /// Returns the key tag of the referenced DNSKEY.
    #[inline]
    pub const fn key_tag(&self) -> u16 {
        self.key_tag
    }

    /// Returns the algorithm number.
    #[inline]
    pub const fn algorithm(&self) -> u8 {
        self.algorithm
    }

    /// Returns the digest type (1 = SHA-1, 2 = SHA-256, 4 = SHA-384).
    #[inline]
    pub const fn digest_type(&self) -> u8 {
        self.digest_type
    }

    /// Returns the digest bytes.
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// Parses from RDATA bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(Error::invalid_rdata("DS", "too short"));
        }
        Ok(Self {
            key_tag: u16::from_be_bytes([data[0], data[1]]),
            algorithm: data[2],
            digest_type: data[3],
            digest: data[4..].to_vec(),
        })
    }

    /// Returns the wire length.
    pub fn wire_len(&self) -> usize {
        4 + self.digest.len()
    }

    /// Appends the wire form to `buf`.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.key_tag.to_be_bytes());
        buf.extend_from_slice(&[self.algorithm, self.digest_type]);
        buf.extend_from_slice(&self.digest);
    }
}

impl fmt::Display for DS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.key_tag,
            self.algorithm,
            self.digest_type,
            HEXLOWER.encode(&self.digest)
        )
    }
}

/// RRSIG record - a signature over one RRset (RFC 4034).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RRSIG {
    type_covered: u16,
    algorithm: u8,
    labels: u8,
    original_ttl: u32,
    expiration: u32,
    inception: u32,
    key_tag: u16,
    signer: Name,
    signature: Vec<u8>,
}

impl RRSIG {
    /// Creates a new RRSIG record.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        type_covered: u16,
        algorithm: u8,
        labels: u8,
        original_ttl: u32,
        expiration: u32,
        inception: u32,
        key_tag: u16,
        signer: Name,
        signature: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            type_covered,
            algorithm,
            labels,
            original_ttl,
            expiration,
            inception,
            key_tag,
            signer,
            signature: signature.into(),
        }
    }

    /// Returns the covered record type code.
    #[inline]
    pub const fn type_covered(&self) -> u16 {
        self.type_covered
    }

    /// Returns the algorithm number.
    #[inline]
    pub const fn algorithm(&self) -> u8 {
        self.algorithm
    }

    /// Returns the label count of the signed owner name.
    #[inline]
    pub const fn labels(&self) -> u8 {
        self.labels
    }

    /// Returns the original TTL of the signed RRset.
    #[inline]
    pub const fn original_ttl(&self) -> u32 {
        self.original_ttl
    }

    /// Returns the expiration timestamp (serial-number arithmetic space).
    #[inline]
    pub const fn expiration(&self) -> u32 {
        self.expiration
    }

    /// Returns the inception timestamp.
    #[inline]
    pub const fn inception(&self) -> u32 {
        self.inception
    }

    /// Returns the key tag of the signing DNSKEY.
    #[inline]
    pub const fn key_tag(&self) -> u16 {
        self.key_tag
    }

    /// Returns the signer (zone) name.
    #[inline]
    pub fn signer(&self) -> &Name {
        &self.signer
    }

    /// Returns the raw signature bytes.
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Returns true if `now` (seconds since the epoch, truncated to 32
    /// bits) falls within the inception..=expiration window, compared
    /// with RFC 1982 serial-number arithmetic so timestamps survive the
    /// 2^32 wrap.
    pub fn is_valid_at(&self, now: u32) -> bool {
        serial_lte(self.inception, now) && serial_lte(now, self.expiration)
    }

    /// Parses from the message at the RDATA offset.
    pub fn parse(message: &[u8], offset: usize, rdlength: u16) -> Result<Self> {
        if offset + 18 > message.len() {
            return Err(Error::invalid_rdata("RRSIG", "too short"));
        }
        let type_covered = u16::from_be_bytes([message[offset], message[offset + 1]]);
        let algorithm = message[offset + 2];
        let labels = message[offset + 3];
        let original_ttl = u32::from_be_bytes(message[offset + 4..offset + 8].try_into().unwrap());
        let expiration = u32::from_be_bytes(message[offset + 8..offset + 12].try_into().unwrap());
        let inception = u32::from_be_bytes(message[offset + 12..offset + 16].try_into().unwrap());
        let key_tag = u16::from_be_bytes([message[offset + 16], message[offset + 17]]);

        let parser = NameParser::new(message);
        let (signer, name_len) = parser.parse_name(offset + 18)?;

        let sig_start = offset + 18 + name_len;
        let sig_end = offset + rdlength as usize;
        if sig_start > sig_end || sig_end > message.len() {
            return Err(Error::invalid_rdata("RRSIG", "signature truncated"));
        }
        let signature = message[sig_start..sig_end].to_vec();

        Ok(Self {
            type_covered,
            algorithm,
            labels,
            original_ttl,
            expiration,
            inception,
            key_tag,
            signer,
            signature,
        })
    }

    /// Returns the wire length.
    pub fn wire_len(&self) -> usize {
        18 + self.signer.wire_len() + self.signature.len()
    }

    /// Appends the wire form to `buf`.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.type_covered.to_be_bytes());
        buf.extend_from_slice(&[self.algorithm, self.labels]);
        buf.extend_from_slice(&self.original_ttl.to_be_bytes());
        buf.extend_from_slice(&self.expiration.to_be_bytes());
        buf.extend_from_slice(&self.inception.to_be_bytes());
        buf.extend_from_slice(&self.key_tag.to_be_bytes());
        self.signer.write_wire(buf);
        buf.extend_from_slice(&self.signature);
    }
}

/// RFC 1982 `a <= b` over 32-bit serial space.
fn serial_lte(a: u32, b: u32) -> bool {
    a == b || b.wrapping_sub(a) < 0x8000_0000
}

impl fmt::Display for RRSIG {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TYPE{} {} {} {} {} {} {} {}",
            self.type_covered,
            self.algorithm,
            self.labels,
            self.original_ttl,
            self.expiration,
            self.inception,
            self.key_tag,
            self.signer
        )
    }
}

/// NSEC3 record - hashed authenticated denial of existence (RFC 5155).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NSEC3 {
    hash_algorithm: u8,
    flags: u8,
    iterations: u16,
    salt: Vec<u8>,
    next_hashed: Vec<u8>,
    type_bitmap: Vec<u8>,
}

impl NSEC3 {
    /// Opt-out flag bit.
    pub const FLAG_OPT_OUT: u8 = 0x01;

    /// Creates a new NSEC3 record.
    pub fn new(
        hash_algorithm: u8,
        flags: u8,
        iterations: u16,
        salt: impl Into<Vec<u8>>,
        next_hashed: impl Into<Vec<u8>>,
        type_bitmap: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            hash_algorithm,
            flags,
            iterations,
            salt: salt.into(),
            next_hashed: next_hashed.into(),
            type_bitmap: type_bitmap.into(),
        }
    }

    /// Returns the hash algorithm (1 = SHA-1 is the only assignment).
    #[inline]
    pub const fn hash_algorithm(&self) -> u8 {
        self.hash_algorithm
    }

    /// Returns the flags byte.
    #[inline]
    pub const fn flags(&self) -> u8 {
        self.flags
    }

    /// Returns true if the opt-out bit is set.
    #[inline]
    pub const fn is_opt_out(&self) -> bool {
        (self.flags & Self::FLAG_OPT_OUT) != 0
    }

    /// Returns the iteration count.
    #[inline]
    pub const fn iterations(&self) -> u16 {
        self.iterations
    }

    /// Returns the salt.
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// Returns the next hashed owner name in the chain.
    pub fn next_hashed(&self) -> &[u8] {
        &self.next_hashed
    }

    /// Returns the raw type bitmap.
    pub fn type_bitmap(&self) -> &[u8] {
        &self.type_bitmap
    }

    /// Returns the record types present according to the bitmap.
    pub fn types(&self) -> Vec<u16> {
        let mut types = Vec::new();
        let mut pos = 0;
        while pos + 2 <= self.type_bitmap.len() {
            let window = u16::from(self.type_bitmap[pos]);
            let len = self.type_bitmap[pos + 1] as usize;
            pos += 2;
            if pos + len > self.type_bitmap.len() {
                break;
            }
            for (byte_idx, &byte) in self.type_bitmap[pos..pos + len].iter().enumerate() {
                for bit in 0..8u16 {
                    if byte & (0x80 >> bit) != 0 {
                        types.push(window * 256 + byte_idx as u16 * 8 + bit);
                    }
                }
            }
            pos += len;
        }
        types
    }

    /// Builds a type bitmap from a list of record type codes. Intended
    /// for tests and record construction.
    pub fn build_type_bitmap(types: &[u16]) -> Vec<u8> {
        let mut sorted = types.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut bitmap = Vec::new();
        let mut window_start = 0;
        while window_start < sorted.len() {
            let window = sorted[window_start] / 256;
            let mut bytes = [0u8; 32];
            let mut max_byte = 0;
            let mut i = window_start;
            while i < sorted.len() && sorted[i] / 256 == window {
                let low = sorted[i] % 256;
                let byte_idx = (low / 8) as usize;
                bytes[byte_idx] |= 0x80 >> (low % 8);
                max_byte = max_byte.max(byte_idx);
                i += 1;
            }
            bitmap.push(window as u8);
            bitmap.push((max_byte + 1) as u8);
            bitmap.extend_from_slice(&bytes[..=max_byte]);
            window_start = i;
        }
        bitmap
    }

    /// Parses from RDATA bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 5 {
            return Err(Error::invalid_rdata("NSEC3", "too short"));
        }
        let hash_algorithm = data[0];
        let flags = data[1];
        let iterations = u16::from_be_bytes([data[2], data[3]]);
        let salt_len = data[4] as usize;

        let mut pos = 5;
        if pos + salt_len > data.len() {
            return Err(Error::invalid_rdata("NSEC3", "salt truncated"));
        }
        let salt = data[pos..pos + salt_len].to_vec();
        pos += salt_len;

        if pos >= data.len() {
            return Err(Error::invalid_rdata("NSEC3", "missing hash length"));
        }
        let hash_len = data[pos] as usize;
        pos += 1;
        if pos + hash_len > data.len() {
            return Err(Error::invalid_rdata("NSEC3", "hash truncated"));
        }
        let next_hashed = data[pos..pos + hash_len].to_vec();
        pos += hash_len;

        Ok(Self {
            hash_algorithm,
            flags,
            iterations,
            salt,
            next_hashed,
            type_bitmap: data[pos..].to_vec(),
        })
    }

    /// Returns the wire length.
    pub fn wire_len(&self) -> usize {
        5 + self.salt.len() + 1 + self.next_hashed.len() + self.type_bitmap.len()
    }

    /// Appends the wire form to `buf`.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&[self.hash_algorithm, self.flags]);
        buf.extend_from_slice(&self.iterations.to_be_bytes());
        buf.extend_from_slice(&[self.salt.len() as u8]);
        buf.extend_from_slice(&self.salt);
        buf.extend_from_slice(&[self.next_hashed.len() as u8]);
        buf.extend_from_slice(&self.next_hashed);
        buf.extend_from_slice(&self.type_bitmap);
    }
}

impl fmt::Display for NSEC3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let salt = if self.salt.is_empty() {
            "-".to_string()
        } else {
            HEXLOWER.encode(&self.salt)
        };
        write!(
            f,
            "{} {} {} {} {}",
            self.hash_algorithm,
            self.flags,
            self.iterations,
            salt,
            data_encoding::BASE32HEX_NOPAD.encode(&self.next_hashed)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn dnskey_flags() {
        let zsk = DNSKEY::new(DNSKEY::FLAGS_ZSK, 3, 8, vec![1, 2, 3]);
        assert!(zsk.is_zone_key());
        assert!(!zsk.is_sep());

        let ksk = DNSKEY::new(DNSKEY::FLAGS_KSK, 3, 8, vec![1, 2, 3]);
        assert!(ksk.is_zone_key());
        assert!(ksk.is_sep());
    }

    #[test]
    fn ds_round_trip() {
        let ds = DS::new(20326, 8, 2, vec![0xde, 0xad, 0xbe, 0xef]);
        let mut buf = BytesMut::new();
        ds.write_to(&mut buf);
        assert_eq!(DS::parse(&buf).unwrap(), ds);
    }

    #[test]
    fn rrsig_validity_window() {
        let sig = RRSIG::new(1, 8, 2, 300, 2000, 1000, 1, Name::root(), vec![]);
        assert!(sig.is_valid_at(1000));
        assert!(sig.is_valid_at(1500));
        assert!(sig.is_valid_at(2000));
        assert!(!sig.is_valid_at(999));
        assert!(!sig.is_valid_at(2001));
    }

    #[test]
    fn rrsig_validity_across_serial_wrap() {
        // Window straddling the 2^32 boundary.
        let sig = RRSIG::new(1, 8, 2, 300, 100, u32::MAX - 100, 1, Name::root(), vec![]);
        assert!(sig.is_valid_at(u32::MAX - 50));
        assert!(sig.is_valid_at(10));
        assert!(!sig.is_valid_at(200));
    }

    #[test]
    fn nsec3_bitmap_round_trip() {
        let bitmap = NSEC3::build_type_bitmap(&[1, 2, 6, 46, 257]);
        let nsec3 = NSEC3::new(1, 0, 0, vec![], vec![0u8; 20], bitmap);
        let types = nsec3.types();
        assert_eq!(types, vec![1, 2, 6, 46, 257]);
    }

    #[test]
    fn nsec3_parse_round_trip() {
        let original = NSEC3::new(
            1,
            NSEC3::FLAG_OPT_OUT,
            12,
            vec![0xaa, 0xbb],
            vec![7u8; 20],
            NSEC3::build_type_bitmap(&[2, 43]),
        );
        let mut buf = BytesMut::new();
        original.write_to(&mut buf);
        let parsed = NSEC3::parse(&buf).unwrap();
        assert_eq!(parsed, original);
        assert!(parsed.is_opt_out());
    }

    #[test]
    fn dnskey_parse_round_trip() {
        let key = DNSKEY::new(257, 3, 13, vec![9u8; 64]);
        let mut buf = BytesMut::new();
        key.write_to(&mut buf);
        let parsed = DNSKEY::parse(&buf).unwrap();
        assert_eq!(parsed, key);
        assert_eq!(parsed.key_tag(), key.key_tag());
    }

    #[test]
    fn signer_name_parses() {
        let name = Name::from_str("example.com").unwrap();
        let sig = RRSIG::new(1, 8, 2, 300, 20, 10, 42, name.clone(), vec![1, 2, 3]);
        let mut buf = BytesMut::new();
        sig.write_to(&mut buf);
        let parsed = RRSIG::parse(&buf, 0, buf.len() as u16).unwrap();
        assert_eq!(parsed.signer(), &name);
        assert_eq!(parsed.signature(), &[1, 2, 3]);
    }
}
