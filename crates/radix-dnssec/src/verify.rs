//! RRSIG verification over messages and the DS chain check.

use crate::crypto::{dnskey_to_ds, SignatureVerifier};
use crate::{DnssecError, Result};
use radix_proto::rdata::DNSKEY;
use radix_proto::{Message, Name, RData, ResourceRecord};
use std::collections::HashMap;
use tracing::trace;

/// Zone keys indexed by key tag.
pub type KeyMap = HashMap<u16, DNSKEY>;

/// Builds a key map from DNSKEY records, admitting only the standard
/// ZSK (256) and KSK (257) flag values.
pub fn build_key_map(records: &[ResourceRecord]) -> KeyMap {
    let mut keys = KeyMap::new();
    for record in records {
        if let RData::DNSKEY(key) = record.rdata() {
            if key.flags() == DNSKEY::FLAGS_ZSK || key.flags() == DNSKEY::FLAGS_KSK {
                keys.insert(key.key_tag(), key.clone());
            }
        }
    }
    keys
}

/// Verifies every RRSIG in the answer and authority sections of `msg`
/// against `keys`.
///
/// A non-empty section with no RRSIGs at all fails `NoSignatures`; each
/// RRSIG must cover a non-empty RRset in its own section, reference a
/// known key, carry a valid cryptographic signature, and be inside its
/// validity window at `now`.
pub fn verify_rrsig(
    msg: &Message,
    keys: &KeyMap,
    verifier: &dyn SignatureVerifier,
    now: u32,
) -> Result<()> {
    for section in [msg.answers(), msg.authority()] {
        if section.is_empty() {
            continue;
        }

        let sigs: Vec<(&Name, &radix_proto::rdata::RRSIG)> = section
            .iter()
            .filter_map(|r| match r.rdata() {
                RData::RRSIG(sig) => Some((r.name(), sig)),
                _ => None,
            })
            .collect();
        if sigs.is_empty() {
            return Err(DnssecError::NoSignatures);
        }

        for (owner, sig) in sigs {
            let rrset: Vec<&ResourceRecord> = section
                .iter()
                .filter(|r| {
                    r.rtype().to_u16() == sig.type_covered() && r.name() == owner
                })
                .collect();
            if rrset.is_empty() {
                return Err(DnssecError::MissingSigned);
            }

            let key = keys.get(&sig.key_tag()).ok_or(DnssecError::MissingDnskey)?;
            verifier.verify(&rrset, sig, key)?;
            if !sig.is_valid_at(now) {
                return Err(DnssecError::InvalidSignaturePeriod);
            }
            trace!(owner = %owner, covered = sig.type_covered(), tag = sig.key_tag(), "rrsig verified");
        }
    }
    Ok(())
}

/// Checks a zone's key map against the DS set its parent served.
///
/// The first parent DS whose key tag is present in the map decides:
/// the DNSKEY is converted to a DS with the parent's digest algorithm
/// and the digests must agree byte for byte.
pub fn check_ds(keys: &KeyMap, parent_ds_set: &[ResourceRecord], zone: &Name) -> Result<()> {
    for record in parent_ds_set {
        let RData::DS(parent_ds) = record.rdata() else {
            continue;
        };
        // The flag value of the matched key is irrelevant here; any key
        // the parent committed to anchors the chain.
        let Some(ksk) = keys.get(&parent_ds.key_tag()) else {
            continue;
        };
        let ds = dnskey_to_ds(zone, ksk, parent_ds.digest_type())
            .ok_or(DnssecError::FailedToConvertKsk)?;
        if ds.digest() != parent_ds.digest() {
            return Err(DnssecError::MismatchingDs);
        }
        return Ok(());
    }
    Err(DnssecError::MissingKsk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use radix_proto::rdata::{DS, RRSIG};
    use radix_proto::{Header, RecordType};
    use std::net::Ipv4Addr;
    use std::str::FromStr;

    /// Accepts every signature; the chain logic is what is under test.
    struct AcceptAll;

    impl SignatureVerifier for AcceptAll {
        fn verify(
            &self,
            _rrset: &[&ResourceRecord],
            _rrsig: &RRSIG,
            _key: &DNSKEY,
        ) -> Result<()> {
            Ok(())
        }
    }

    fn dnskey_record(zone: &str, flags: u16) -> (ResourceRecord, DNSKEY) {
        let key = DNSKEY::new(flags, 3, 8, vec![flags as u8, 1, 2, 3]);
        let record = ResourceRecord::new(
            Name::from_str(zone).unwrap(),
            RecordType::DNSKEY,
            3600,
            RData::DNSKEY(key.clone()),
        );
        (record, key)
    }

    fn rrsig_record(owner: &str, covered: RecordType, key: &DNSKEY) -> ResourceRecord {
        let sig = RRSIG::new(
            covered.to_u16(),
            8,
            2,
            300,
            2_000_000,
            1_000_000,
            key.key_tag(),
            Name::from_str("example.org").unwrap(),
            vec![0xAB; 64],
        );
        ResourceRecord::new(
            Name::from_str(owner).unwrap(),
            RecordType::RRSIG,
            300,
            RData::RRSIG(sig),
        )
    }

    fn answer_message(records: Vec<ResourceRecord>) -> Message {
        let mut msg = Message::new(Header::default());
        for r in records {
            msg.add_answer(r);
        }
        msg
    }

    #[test]
    fn key_map_keeps_only_zone_key_flags() {
        let (zsk, _) = dnskey_record("example.org", 256);
        let (ksk, _) = dnskey_record("example.org", 257);
        let (odd, _) = dnskey_record("example.org", 0);

        let keys = build_key_map(&[zsk, ksk, odd]);
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn unsigned_section_fails() {
        let msg = answer_message(vec![ResourceRecord::a(
            Name::from_str("www.example.org").unwrap(),
            300,
            Ipv4Addr::new(192, 0, 2, 1),
        )]);
        assert_eq!(
            verify_rrsig(&msg, &KeyMap::new(), &AcceptAll, 1_500_000),
            Err(DnssecError::NoSignatures)
        );
    }

    #[test]
    fn signature_without_rrset_fails() {
        let (_, key) = dnskey_record("example.org", 256);
        let msg = answer_message(vec![rrsig_record("www.example.org", RecordType::A, &key)]);
        let keys = KeyMap::from([(key.key_tag(), key)]);

        assert_eq!(
            verify_rrsig(&msg, &keys, &AcceptAll, 1_500_000),
            Err(DnssecError::MissingSigned)
        );
    }

    #[test]
    fn signature_with_unknown_key_fails() {
        let (_, key) = dnskey_record("example.org", 256);
        let msg = answer_message(vec![
            ResourceRecord::a(
                Name::from_str("www.example.org").unwrap(),
                300,
                Ipv4Addr::new(192, 0, 2, 1),
            ),
            rrsig_record("www.example.org", RecordType::A, &key),
        ]);

        assert_eq!(
            verify_rrsig(&msg, &KeyMap::new(), &AcceptAll, 1_500_000),
            Err(DnssecError::MissingDnskey)
        );
    }

    #[test]
    fn expired_signature_fails() {
        let (_, key) = dnskey_record("example.org", 256);
        let msg = answer_message(vec![
            ResourceRecord::a(
                Name::from_str("www.example.org").unwrap(),
                300,
                Ipv4Addr::new(192, 0, 2, 1),
            ),
            rrsig_record("www.example.org", RecordType::A, &key),
        ]);
        let keys = KeyMap::from([(key.key_tag(), key)]);

        assert_eq!(
            verify_rrsig(&msg, &keys, &AcceptAll, 3_000_000),
            Err(DnssecError::InvalidSignaturePeriod)
        );
    }

    #[test]
    fn valid_chain_passes() {
        let (_, key) = dnskey_record("example.org", 256);
        let msg = answer_message(vec![
            ResourceRecord::a(
                Name::from_str("www.example.org").unwrap(),
                300,
                Ipv4Addr::new(192, 0, 2, 1),
            ),
            rrsig_record("www.example.org", RecordType::A, &key),
        ]);
        let keys = KeyMap::from([(key.key_tag(), key)]);

        assert!(verify_rrsig(&msg, &keys, &AcceptAll, 1_500_000).is_ok());
    }

    #[test]
    fn ds_chain_matches_and_mismatches() {
        let zone = Name::from_str("example.org").unwrap();
        let (_, ksk) = dnskey_record("example.org", 257);
        let keys = KeyMap::from([(ksk.key_tag(), ksk.clone())]);

        let good = dnskey_to_ds(&zone, &ksk, 2).unwrap();
        let good_rr = ResourceRecord::new(
            zone.clone(),
            RecordType::DS,
            3600,
            RData::DS(good),
        );
        assert!(check_ds(&keys, &[good_rr], &zone).is_ok());

        let bad = DS::new(ksk.key_tag(), 8, 2, vec![0u8; 32]);
        let bad_rr = ResourceRecord::new(zone.clone(), RecordType::DS, 3600, RData::DS(bad));
        assert_eq!(
            check_ds(&keys, &[bad_rr], &zone),
            Err(DnssecError::MismatchingDs)
        );

        let unrelated = DS::new(ksk.key_tag().wrapping_add(1), 8, 2, vec![0u8; 32]);
        let unrelated_rr =
            ResourceRecord::new(zone.clone(), RecordType::DS, 3600, RData::DS(unrelated));
        assert_eq!(
            check_ds(&keys, &[unrelated_rr], &zone),
            Err(DnssecError::MissingKsk)
        );
    }

    #[test]
    fn empty_sections_verify_trivially() {
        let msg = Message::new(Header::default());
        assert!(verify_rrsig(&msg, &KeyMap::new(), &AcceptAll, 0).is_ok());
    }
}
