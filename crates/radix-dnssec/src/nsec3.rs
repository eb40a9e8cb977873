//! NSEC3 denial-of-existence proofs (RFC 5155).
//!
//! Three proofs back the resolver loop: name error (NXDOMAIN), NODATA,
//! and insecure delegation. All of them reduce to two primitives over
//! the NSEC3 set of a response: find a record whose hashed owner
//! *matches* a name, or find one whose hash interval *covers* it.

use crate::{DnssecError, Result};
use data_encoding::BASE32HEX_NOPAD;
use radix_proto::rdata::NSEC3;
use radix_proto::{Name, Question, RData, RecordType, ResourceRecord};
use sha1::{Digest, Sha1};

/// Computes the NSEC3 hash of `name` under the given salt and iteration
/// count. Only SHA-1 is assigned for NSEC3.
pub fn nsec3_hash(name: &Name, salt: &[u8], iterations: u16) -> Vec<u8> {
    let mut hasher = Sha1::new();
    hasher.update(name.lowercased().as_wire());
    hasher.update(salt);
    let mut hash = hasher.finalize().to_vec();

    for _ in 0..iterations {
        let mut hasher = Sha1::new();
        hasher.update(&hash);
        hasher.update(salt);
        hash = hasher.finalize().to_vec();
    }
    hash
}

/// An NSEC3 record paired with its decoded owner hash.
struct HashedRecord<'a> {
    rdata: &'a NSEC3,
    owner_hash: Vec<u8>,
}

fn hashed_records(set: &[ResourceRecord]) -> Vec<HashedRecord<'_>> {
    set.iter()
        .filter_map(|record| {
            let RData::NSEC3(rdata) = record.rdata() else {
                return None;
            };
            // The first label of the owner name is the base32hex hash.
            let label = record.name().labels().next()?;
            let upper: Vec<u8> = label.as_bytes().to_ascii_uppercase();
            let owner_hash = BASE32HEX_NOPAD.decode(&upper).ok()?;
            Some(HashedRecord { rdata, owner_hash })
        })
        .collect()
}

impl HashedRecord<'_> {
    /// True if this record's owner hash equals the hash of `name`.
    fn matches(&self, name: &Name) -> bool {
        if self.rdata.hash_algorithm() != 1 {
            return false;
        }
        nsec3_hash(name, self.rdata.salt(), self.rdata.iterations()) == self.owner_hash
    }

    /// True if the hash of `name` falls strictly between this record's
    /// owner hash and its next hash, accounting for the chain wrapping
    /// at the end of the zone.
    fn covers(&self, name: &Name) -> bool {
        if self.rdata.hash_algorithm() != 1 {
            return false;
        }
        let hash = nsec3_hash(name, self.rdata.salt(), self.rdata.iterations());
        let owner = self.owner_hash.as_slice();
        let next = self.rdata.next_hashed();

        if owner < next {
            owner < hash.as_slice() && hash.as_slice() < next
        } else {
            // Last interval of the chain.
            hash.as_slice() > owner || hash.as_slice() < next
        }
    }
}

fn bitmap_has(types: &[u16], wanted: &[RecordType]) -> bool {
    wanted.iter().any(|t| types.contains(&t.to_u16()))
}

/// Finds the NSEC3 record whose owner hash matches `name` and returns
/// its type bitmap.
fn find_matching(name: &Name, set: &[ResourceRecord]) -> Result<Vec<u16>> {
    for record in hashed_records(set) {
        if record.matches(name) {
            return Ok(record.rdata.types());
        }
    }
    Err(DnssecError::Nsec3Missing)
}

/// Finds the NSEC3 record covering `name`; returns its type bitmap and
/// opt-out flag.
fn find_coverer(name: &Name, set: &[ResourceRecord]) -> Result<(Vec<u16>, bool)> {
    for record in hashed_records(set) {
        if record.covers(name) {
            return Ok((record.rdata.types(), record.rdata.is_opt_out()));
        }
    }
    Err(DnssecError::Nsec3Coverage)
}

/// Walks up from `name` to the longest ancestor with a matching NSEC3
/// record. Returns the closest encloser and the next-closer name (one
/// label below the encloser on the path to `name`).
fn find_closest_encloser(name: &Name, set: &[ResourceRecord]) -> Option<(Name, Name)> {
    let mut next_closer = name.clone();
    let mut candidate = name.clone();
    loop {
        if find_matching(&candidate, set).is_ok() {
            return Some((candidate, next_closer));
        }
        let parent = candidate.parent()?;
        next_closer = candidate;
        candidate = parent;
    }
}

/// Proves that the queried name does not exist: a closest encloser must
/// be matched, and the wildcard at the encloser must be covered.
pub fn verify_name_error(q: &Question, nsec3_set: &[ResourceRecord]) -> Result<()> {
    let (closest_encloser, _) = find_closest_encloser(&q.qname, nsec3_set)
        .ok_or(DnssecError::Nsec3NoClosestEncloser)?;
    let wildcard = closest_encloser.prepend_label(b"*").map_err(|_| {
        DnssecError::Nsec3NoClosestEncloser
    })?;
    find_coverer(&wildcard, nsec3_set)?;
    Ok(())
}

/// Proves that the name exists but the queried type does not. For DS
/// queries an opt-out coverer of the next-closer name is also accepted.
pub fn verify_nodata(q: &Question, nsec3_set: &[ResourceRecord]) -> Result<()> {
    match find_matching(&q.qname, nsec3_set) {
        Ok(types) => {
            if types.contains(&q.qtype.to_u16()) || types.contains(&RecordType::CNAME.to_u16()) {
                return Err(DnssecError::Nsec3TypeExists);
            }
            Ok(())
        }
        Err(err) => {
            if q.record_type() != Some(RecordType::DS) {
                return Err(err);
            }
            let (_, next_closer) = find_closest_encloser(&q.qname, nsec3_set)
                .ok_or(DnssecError::Nsec3NoClosestEncloser)?;
            let (_, opt_out) = find_coverer(&next_closer, nsec3_set)?;
            if !opt_out {
                return Err(DnssecError::Nsec3OptOut);
            }
            Ok(())
        }
    }
}

/// Proves that a referral into `delegation` is legitimately unsigned:
/// either a matching NSEC3 shows NS without DS/SOA, or an opt-out
/// record covers the next-closer name.
pub fn verify_delegation(delegation: &Name, nsec3_set: &[ResourceRecord]) -> Result<()> {
    match find_matching(delegation, nsec3_set) {
        Ok(types) => {
            if !bitmap_has(&types, &[RecordType::NS]) {
                return Err(DnssecError::Nsec3MissingNs);
            }
            if bitmap_has(&types, &[RecordType::DS, RecordType::SOA]) {
                return Err(DnssecError::Nsec3TypeExists);
            }
            Ok(())
        }
        Err(_) => {
            let (_, next_closer) = find_closest_encloser(delegation, nsec3_set)
                .ok_or(DnssecError::Nsec3NoClosestEncloser)?;
            let (_, opt_out) = find_coverer(&next_closer, nsec3_set)?;
            if !opt_out {
                return Err(DnssecError::Nsec3OptOut);
            }
            Ok(())
        }
    }
}

/// Extracts the NSEC3 records from a response section.
pub fn nsec3_records(section: &[ResourceRecord]) -> Vec<ResourceRecord> {
    section
        .iter()
        .filter(|r| r.record_type() == Some(RecordType::NSEC3))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use radix_proto::rdata::NSEC3 as Nsec3Rdata;
    use std::str::FromStr;

    /// RFC 5155 appendix A: H("example", salt=AABBCCDD, 12 iterations)
    /// = 0p9mhaveqvm6t7vbl5lop2u3t2rp3tom (base32hex).
    #[test]
    fn known_hash_vector() {
        let name = Name::from_str("example").unwrap();
        let hash = nsec3_hash(&name, &[0xAA, 0xBB, 0xCC, 0xDD], 12);
        assert_eq!(
            BASE32HEX_NOPAD.encode(&hash).to_lowercase(),
            "0p9mhaveqvm6t7vbl5lop2u3t2rp3tom"
        );
    }

    const SALT: &[u8] = &[0xAA, 0xBB, 0xCC, 0xDD];
    const ITERATIONS: u16 = 12;

    fn owner_for(name: &Name, zone: &str) -> Name {
        let hash = nsec3_hash(name, SALT, ITERATIONS);
        let label = BASE32HEX_NOPAD.encode(&hash).to_lowercase();
        Name::from_str(zone)
            .unwrap()
            .prepend_label(label.as_bytes())
            .unwrap()
    }

    fn nsec3_matching(name: &Name, zone: &str, types: &[u16], opt_out: bool) -> ResourceRecord {
        // next = owner hash + 1, so the record's interval covers nothing
        // and only its owner match is observable.
        let mut next = nsec3_hash(name, SALT, ITERATIONS);
        for i in (0..next.len()).rev() {
            let (value, carry) = next[i].overflowing_add(1);
            next[i] = value;
            if !carry {
                break;
            }
        }

        let flags = if opt_out { Nsec3Rdata::FLAG_OPT_OUT } else { 0 };
        let rdata = Nsec3Rdata::new(
            1,
            flags,
            ITERATIONS,
            SALT,
            next,
            Nsec3Rdata::build_type_bitmap(types),
        );
        ResourceRecord::new(
            owner_for(name, zone),
            RecordType::NSEC3,
            3600,
            RData::NSEC3(rdata),
        )
    }

    /// Builds an NSEC3 record whose hash interval spans the entire hash
    /// space short of its endpoints, covering any realistic hash.
    fn nsec3_covering(_name: &Name, zone: &str, opt_out: bool) -> ResourceRecord {
        let flags = if opt_out { Nsec3Rdata::FLAG_OPT_OUT } else { 0 };
        let rdata = Nsec3Rdata::new(
            1,
            flags,
            ITERATIONS,
            SALT,
            vec![0xFFu8; 20],
            Nsec3Rdata::build_type_bitmap(&[RecordType::A.to_u16()]),
        );
        let label = BASE32HEX_NOPAD.encode(&[0u8; 20]).to_lowercase();
        let owner = Name::from_str(zone)
            .unwrap()
            .prepend_label(label.as_bytes())
            .unwrap();
        ResourceRecord::new(owner, RecordType::NSEC3, 3600, RData::NSEC3(rdata))
    }

    #[test]
    fn name_error_needs_encloser_and_wildcard_coverage() {
        let qname = Name::from_str("missing.example.org").unwrap();
        let encloser = Name::from_str("example.org").unwrap();
        let wildcard = encloser.prepend_label(b"*").unwrap();

        let set = vec![
            nsec3_matching(&encloser, "example.org", &[2, 6], false),
            nsec3_covering(&wildcard, "example.org", false),
        ];
        let q = Question::a(qname);
        assert!(verify_name_error(&q, &set).is_ok());

        // Without wildcard coverage the proof fails.
        let set = vec![nsec3_matching(&encloser, "example.org", &[2, 6], false)];
        assert_eq!(
            verify_name_error(&q, &set),
            Err(DnssecError::Nsec3Coverage)
        );

        // Without any matching ancestor there is no closest encloser.
        assert_eq!(
            verify_name_error(&q, &[]),
            Err(DnssecError::Nsec3NoClosestEncloser)
        );
    }

    #[test]
    fn nodata_requires_type_absent_from_bitmap() {
        let qname = Name::from_str("host.example.org").unwrap();
        let q = Question::aaaa(qname.clone());

        let set = vec![nsec3_matching(&qname, "example.org", &[1, 2], false)];
        assert!(verify_nodata(&q, &set).is_ok());

        let set = vec![nsec3_matching(&qname, "example.org", &[1, 28], false)];
        assert_eq!(verify_nodata(&q, &set), Err(DnssecError::Nsec3TypeExists));

        // CNAME in the bitmap also defeats the proof.
        let set = vec![nsec3_matching(&qname, "example.org", &[5], false)];
        assert_eq!(verify_nodata(&q, &set), Err(DnssecError::Nsec3TypeExists));
    }

    #[test]
    fn delegation_proof_checks_ns_and_ds() {
        let zone = Name::from_str("child.example.org").unwrap();

        let set = vec![nsec3_matching(&zone, "example.org", &[2], false)];
        assert!(verify_delegation(&zone, &set).is_ok());

        // DS present in the bitmap means the delegation should be signed.
        let set = vec![nsec3_matching(&zone, "example.org", &[2, 43], false)];
        assert_eq!(
            verify_delegation(&zone, &set),
            Err(DnssecError::Nsec3TypeExists)
        );

        // Missing NS bit.
        let set = vec![nsec3_matching(&zone, "example.org", &[1], false)];
        assert_eq!(
            verify_delegation(&zone, &set),
            Err(DnssecError::Nsec3MissingNs)
        );
    }

    #[test]
    fn opt_out_coverage_accepts_unsigned_delegation() {
        let zone = Name::from_str("child.example.org").unwrap();
        let parent = Name::from_str("example.org").unwrap();

        // The parent matches, the next closer (the zone itself) is
        // covered by an opt-out record.
        let set = vec![
            nsec3_matching(&parent, "example.org", &[2, 6], false),
            nsec3_covering(&zone, "example.org", true),
        ];
        assert!(verify_delegation(&zone, &set).is_ok());

        // Same chain without opt-out is a failure.
        let set = vec![
            nsec3_matching(&parent, "example.org", &[2, 6], false),
            nsec3_covering(&zone, "example.org", false),
        ];
        assert_eq!(verify_delegation(&zone, &set), Err(DnssecError::Nsec3OptOut));
    }
}
