//! Cryptographic primitives: DS digests, RRSIG signing data, and
//! per-algorithm signature verification.
//!
//! Signature verification sits behind [`SignatureVerifier`] so the
//! resolver loop can be exercised without key material; production code
//! uses [`StandardVerifier`].

use crate::{DnssecError, Result};
use bytes::BytesMut;
use radix_proto::rdata::{DNSKEY, DS, RRSIG};
use radix_proto::{Name, RData, ResourceRecord};
use sha2::{Digest, Sha256, Sha384};

/// Verifies an RRSIG over an RRset with a DNSKEY.
pub trait SignatureVerifier: Send + Sync {
    /// Checks the signature; `Ok(())` means the RRset is authentic
    /// under `key`.
    fn verify(&self, rrset: &[&ResourceRecord], rrsig: &RRSIG, key: &DNSKEY) -> Result<()>;
}

/// The production verifier: RSA/SHA-256, RSA/SHA-512, ECDSA P-256 and
/// P-384, and Ed25519.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardVerifier;

impl SignatureVerifier for StandardVerifier {
    fn verify(&self, rrset: &[&ResourceRecord], rrsig: &RRSIG, key: &DNSKEY) -> Result<()> {
        if !key.is_zone_key() {
            return Err(DnssecError::InvalidKeyFlags(key.flags()));
        }
        if key.protocol() != 3 {
            return Err(DnssecError::InvalidKeyProtocol(key.protocol()));
        }

        let data = signature_data(rrset, rrsig)?;
        match rrsig.algorithm() {
            8 => verify_rsa(
                key.public_key(),
                &data,
                rrsig.signature(),
                // Legacy bound: some zones still publish 1024-bit keys.
                &ring::signature::RSA_PKCS1_1024_8192_SHA256_FOR_LEGACY_USE_ONLY,
            ),
            10 => verify_rsa(
                key.public_key(),
                &data,
                rrsig.signature(),
                &ring::signature::RSA_PKCS1_1024_8192_SHA512_FOR_LEGACY_USE_ONLY,
            ),
            13 => verify_ecdsa_p256(key.public_key(), &data, rrsig.signature()),
            14 => verify_ecdsa_p384(key.public_key(), &data, rrsig.signature()),
            15 => verify_ed25519(key.public_key(), &data, rrsig.signature()),
            other => Err(DnssecError::UnsupportedAlgorithm(other)),
        }
    }
}

/// Converts a DNSKEY into the DS record its parent would publish.
/// Returns `None` for digest types this resolver cannot compute.
pub fn dnskey_to_ds(owner: &Name, key: &DNSKEY, digest_type: u8) -> Option<DS> {
    let mut data = BytesMut::new();
    owner.lowercased().write_wire(&mut data);
    key.write_to(&mut data);

    let digest: Vec<u8> = match digest_type {
        1 => {
            use sha1::{Digest as _, Sha1};
            Sha1::digest(&data).to_vec()
        }
        2 => Sha256::digest(&data).to_vec(),
        4 => Sha384::digest(&data).to_vec(),
        _ => return None,
    };

    Some(DS::new(key.key_tag(), key.algorithm(), digest_type, digest))
}

/// Builds the data an RRSIG signs: the RRSIG RDATA minus the signature,
/// followed by the covered RRset in canonical form (RFC 4034 section
/// 3.1.8.1).
pub fn signature_data(rrset: &[&ResourceRecord], rrsig: &RRSIG) -> Result<Vec<u8>> {
    let mut data = BytesMut::new();

    data.extend_from_slice(&rrsig.type_covered().to_be_bytes());
    data.extend_from_slice(&[rrsig.algorithm(), rrsig.labels()]);
    data.extend_from_slice(&rrsig.original_ttl().to_be_bytes());
    data.extend_from_slice(&rrsig.expiration().to_be_bytes());
    data.extend_from_slice(&rrsig.inception().to_be_bytes());
    data.extend_from_slice(&rrsig.key_tag().to_be_bytes());
    rrsig.signer().lowercased().write_wire(&mut data);

    // Each record is serialized with a lowercased owner, the original
    // TTL, and canonical RDATA; the set is sorted by those bytes.
    let mut canonical: Vec<Vec<u8>> = rrset
        .iter()
        .map(|record| {
            let mut buf = BytesMut::new();
            record.name().lowercased().write_wire(&mut buf);
            buf.extend_from_slice(&rrsig.type_covered().to_be_bytes());
            buf.extend_from_slice(&record.rclass().to_u16().to_be_bytes());
            buf.extend_from_slice(&rrsig.original_ttl().to_be_bytes());

            let rdata = canonical_rdata(record.rdata());
            buf.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
            buf.extend_from_slice(&rdata);
            buf.to_vec()
        })
        .collect();
    canonical.sort();
    canonical.dedup();

    for record in canonical {
        data.extend_from_slice(&record);
    }
    Ok(data.to_vec())
}

/// Serializes RDATA with embedded domain names lowercased (RFC 4034
/// section 6.2); types without embedded names use their plain wire form.
fn canonical_rdata(rdata: &RData) -> Vec<u8> {
    let mut buf = BytesMut::new();
    match rdata {
        RData::NS(r) => r.nsdname().lowercased().write_wire(&mut buf),
        RData::CNAME(r) => r.target().lowercased().write_wire(&mut buf),
        RData::PTR(r) => r.ptrdname().lowercased().write_wire(&mut buf),
        RData::DNAME(r) => r.target().lowercased().write_wire(&mut buf),
        RData::MX(r) => {
            buf.extend_from_slice(&r.preference().to_be_bytes());
            r.exchange().lowercased().write_wire(&mut buf);
        }
        RData::SOA(r) => {
            r.mname().lowercased().write_wire(&mut buf);
            r.rname().lowercased().write_wire(&mut buf);
            buf.extend_from_slice(&r.serial().to_be_bytes());
            buf.extend_from_slice(&r.refresh().to_be_bytes());
            buf.extend_from_slice(&r.retry().to_be_bytes());
            buf.extend_from_slice(&r.expire().to_be_bytes());
            buf.extend_from_slice(&r.minimum().to_be_bytes());
        }
        RData::RRSIG(r) => {
            buf.extend_from_slice(&r.type_covered().to_be_bytes());
            buf.extend_from_slice(&[r.algorithm(), r.labels()]);
            buf.extend_from_slice(&r.original_ttl().to_be_bytes());
            buf.extend_from_slice(&r.expiration().to_be_bytes());
            buf.extend_from_slice(&r.inception().to_be_bytes());
            buf.extend_from_slice(&r.key_tag().to_be_bytes());
            r.signer().lowercased().write_wire(&mut buf);
            buf.extend_from_slice(r.signature());
        }
        other => other.write_to(&mut buf),
    }
    buf.to_vec()
}

/// Verifies an RSA signature. DNSKEY stores RSA keys as an exponent
/// length (1 or 3 bytes), the exponent, then the modulus (RFC 3110);
/// ring wants ASN.1 DER, so the key is re-encoded first.
fn verify_rsa(
    public_key: &[u8],
    data: &[u8],
    signature: &[u8],
    params: &'static ring::signature::RsaParameters,
) -> Result<()> {
    if public_key.is_empty() {
        return Err(DnssecError::InvalidPublicKey("empty public key".into()));
    }

    let (exp_len, exp_offset) = if public_key[0] == 0 {
        if public_key.len() < 3 {
            return Err(DnssecError::InvalidPublicKey(
                "truncated exponent length".into(),
            ));
        }
        (
            u16::from_be_bytes([public_key[1], public_key[2]]) as usize,
            3,
        )
    } else {
        (public_key[0] as usize, 1)
    };

    if public_key.len() < exp_offset + exp_len {
        return Err(DnssecError::InvalidPublicKey("truncated public key".into()));
    }
    let exponent = &public_key[exp_offset..exp_offset + exp_len];
    let modulus = &public_key[exp_offset + exp_len..];

    let der = rsa_public_key_der(modulus, exponent);
    ring::signature::UnparsedPublicKey::new(params, &der)
        .verify(data, signature)
        .map_err(|_| DnssecError::SignatureInvalid("RSA signature invalid".into()))
}

/// Minimal DER encoding of `RSAPublicKey ::= SEQUENCE { n, e }`.
fn rsa_public_key_der(modulus: &[u8], exponent: &[u8]) -> Vec<u8> {
    fn der_length(len: usize) -> Vec<u8> {
        if len < 128 {
            vec![len as u8]
        } else if len < 256 {
            vec![0x81, len as u8]
        } else {
            vec![0x82, (len >> 8) as u8, len as u8]
        }
    }

    fn der_integer(data: &[u8]) -> Vec<u8> {
        let pad = !data.is_empty() && (data[0] & 0x80) != 0;
        let mut out = vec![0x02];
        out.extend(der_length(data.len() + usize::from(pad)));
        if pad {
            out.push(0x00);
        }
        out.extend_from_slice(data);
        out
    }

    let n = der_integer(modulus);
    let e = der_integer(exponent);
    let mut sequence = vec![0x30];
    sequence.extend(der_length(n.len() + e.len()));
    sequence.extend(n);
    sequence.extend(e);
    sequence
}

/// Verifies an ECDSA P-256 signature. DNSKEY stores the key as a bare
/// 64-byte point and the signature as fixed-width `r || s`.
fn verify_ecdsa_p256(public_key: &[u8], data: &[u8], signature: &[u8]) -> Result<()> {
    use p256::ecdsa::signature::Verifier;
    use p256::ecdsa::{Signature, VerifyingKey};

    if public_key.len() != 64 {
        return Err(DnssecError::InvalidPublicKey(format!(
            "P-256 key should be 64 bytes, got {}",
            public_key.len()
        )));
    }
    let mut sec1 = Vec::with_capacity(65);
    sec1.push(0x04);
    sec1.extend_from_slice(public_key);

    let key = VerifyingKey::from_sec1_bytes(&sec1)
        .map_err(|e| DnssecError::InvalidPublicKey(e.to_string()))?;
    let sig = Signature::from_slice(signature)
        .map_err(|e| DnssecError::SignatureInvalid(e.to_string()))?;
    key.verify(data, &sig)
        .map_err(|e| DnssecError::SignatureInvalid(e.to_string()))
}

/// Verifies an ECDSA P-384 signature (96-byte point, 96-byte signature).
fn verify_ecdsa_p384(public_key: &[u8], data: &[u8], signature: &[u8]) -> Result<()> {
    use p384::ecdsa::signature::Verifier;
    use p384::ecdsa::{Signature, VerifyingKey};

    if public_key.len() != 96 {
        return Err(DnssecError::InvalidPublicKey(format!(
            "P-384 key should be 96 bytes, got {}",
            public_key.len()
        )));
    }
    let mut sec1 = Vec::with_capacity(97);
    sec1.push(0x04);
    sec1.extend_from_slice(public_key);

    let key = VerifyingKey::from_sec1_bytes(&sec1)
        .map_err(|e| DnssecError::InvalidPublicKey(e.to_string()))?;
    let sig = Signature::from_slice(signature)
        .map_err(|e| DnssecError::SignatureInvalid(e.to_string()))?;
    key.verify(data, &sig)
        .map_err(|e| DnssecError::SignatureInvalid(e.to_string()))
}

/// Verifies an Ed25519 signature.
fn verify_ed25519(public_key: &[u8], data: &[u8], signature: &[u8]) -> Result<()> {
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    let key_bytes: [u8; 32] = public_key.try_into().map_err(|_| {
        DnssecError::InvalidPublicKey(format!(
            "Ed25519 key should be 32 bytes, got {}",
            public_key.len()
        ))
    })?;
    let sig_bytes: [u8; 64] = signature.try_into().map_err(|_| {
        DnssecError::SignatureInvalid(format!(
            "Ed25519 signature should be 64 bytes, got {}",
            signature.len()
        ))
    })?;

    let key = VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| DnssecError::InvalidPublicKey(e.to_string()))?;
    key.verify(data, &Signature::from_bytes(&sig_bytes))
        .map_err(|e| DnssecError::SignatureInvalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use radix_proto::RecordType;
    use std::net::Ipv4Addr;
    use std::str::FromStr;

    #[test]
    fn ds_digest_lengths() {
        let zone = Name::from_str("example.com").unwrap();
        let key = DNSKEY::new(257, 3, 8, vec![1, 2, 3, 4]);

        assert_eq!(dnskey_to_ds(&zone, &key, 1).unwrap().digest().len(), 20);
        assert_eq!(dnskey_to_ds(&zone, &key, 2).unwrap().digest().len(), 32);
        assert_eq!(dnskey_to_ds(&zone, &key, 4).unwrap().digest().len(), 48);
        assert!(dnskey_to_ds(&zone, &key, 99).is_none());
    }

    #[test]
    fn ds_digest_ignores_owner_case() {
        let key = DNSKEY::new(257, 3, 8, vec![1, 2, 3, 4]);
        let lower = dnskey_to_ds(&Name::from_str("example.com").unwrap(), &key, 2).unwrap();
        let upper = dnskey_to_ds(&Name::from_str("EXAMPLE.COM").unwrap(), &key, 2).unwrap();
        assert_eq!(lower.digest(), upper.digest());
    }

    #[test]
    fn signature_data_is_order_independent() {
        let name = Name::from_str("example.com").unwrap();
        let rrsig = RRSIG::new(
            RecordType::A.to_u16(),
            8,
            2,
            300,
            2000,
            1000,
            42,
            name.clone(),
            vec![],
        );

        let a = ResourceRecord::a(name.clone(), 300, Ipv4Addr::new(192, 0, 2, 1));
        let b = ResourceRecord::a(name, 300, Ipv4Addr::new(192, 0, 2, 2));

        let forward = signature_data(&[&a, &b], &rrsig).unwrap();
        let backward = signature_data(&[&b, &a], &rrsig).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn unsupported_algorithm_is_rejected() {
        let name = Name::from_str("example.com").unwrap();
        let key = DNSKEY::new(256, 3, 3, vec![1, 2, 3]);
        let rrsig = RRSIG::new(1, 3, 2, 300, 2000, 1000, key.key_tag(), name.clone(), vec![0; 40]);
        let record = ResourceRecord::a(name, 300, Ipv4Addr::new(192, 0, 2, 1));

        assert_eq!(
            StandardVerifier.verify(&[&record], &rrsig, &key),
            Err(DnssecError::UnsupportedAlgorithm(3))
        );
    }

    #[test]
    fn non_zone_keys_are_rejected() {
        let name = Name::from_str("example.com").unwrap();
        let key = DNSKEY::new(0, 3, 8, vec![1, 2, 3]);
        let rrsig = RRSIG::new(1, 8, 2, 300, 2000, 1000, key.key_tag(), name.clone(), vec![0; 40]);
        let record = ResourceRecord::a(name, 300, Ipv4Addr::new(192, 0, 2, 1));

        assert_eq!(
            StandardVerifier.verify(&[&record], &rrsig, &key),
            Err(DnssecError::InvalidKeyFlags(0))
        );
    }
}
