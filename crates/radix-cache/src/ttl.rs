//! Effective-TTL computation for cached answers.
//!
//! The lifetime of a cached answer is the smallest header TTL across
//! every record in it, further capped by how long any covering RRSIG
//! remains valid. RRSIG expiration timestamps live in 32-bit serial
//! space (RFC 1982), so they are widened against the current 68-year
//! window before subtracting.

use crate::clock::unix_seconds;
use radix_proto::{RData, ResourceRecord};
use std::time::SystemTime;

/// One serial-arithmetic window: 2^31 seconds, roughly 68 years.
const YEAR68: i64 = 1 << 31;

/// Returns the number of seconds until an RRSIG expiration timestamp,
/// negative if it has already passed.
fn seconds_until_expiration(expiration: u32, now_unix: i64) -> i64 {
    let mut window = now_unix / YEAR68 - 1;
    if window < 0 {
        window = 0;
    }
    i64::from(expiration) + window * YEAR68 - now_unix
}

/// Computes the effective minimum TTL of a record set at `now`,
/// saturating at zero. An empty set has TTL zero.
pub fn min_ttl<'a, I>(records: I, now: SystemTime) -> u32
where
    I: IntoIterator<Item = &'a ResourceRecord>,
{
    let now_unix = unix_seconds(now);
    let mut min: Option<i64> = None;

    for record in records {
        let ttl = i64::from(record.ttl());
        if min.map_or(true, |m| ttl < m) {
            min = Some(ttl);
        }
        if let RData::RRSIG(sig) = record.rdata() {
            let left = seconds_until_expiration(sig.expiration(), now_unix);
            if min.map_or(true, |m| left < m) {
                min = Some(left);
            }
        }
    }

    min.unwrap_or(0).max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use radix_proto::{Name, RecordType, ResourceRecord};
    use std::net::Ipv4Addr;
    use std::str::FromStr;
    use std::time::{Duration, UNIX_EPOCH};

    fn a_record(ttl: u32) -> ResourceRecord {
        ResourceRecord::a(
            Name::from_str("testing").unwrap(),
            ttl,
            Ipv4Addr::new(1, 2, 3, 4),
        )
    }

    fn rrsig_record(ttl: u32, expiration: u32) -> ResourceRecord {
        ResourceRecord::new(
            Name::from_str("testing").unwrap(),
            RecordType::RRSIG,
            ttl,
            RData::RRSIG(radix_proto::rdata::RRSIG::new(
                1,
                8,
                1,
                ttl,
                expiration,
                0,
                12345,
                Name::root(),
                vec![],
            )),
        )
    }

    #[test]
    fn smallest_header_ttl_wins() {
        let now = SystemTime::now();
        let set = [a_record(2), a_record(5), a_record(1)];
        assert_eq!(min_ttl(&set, now), 1);
    }

    #[test]
    fn empty_set_is_zero() {
        assert_eq!(min_ttl([].iter(), SystemTime::now()), 0);
    }

    #[test]
    fn rrsig_expiration_caps_the_ttl() {
        // Build an expiration that decodes to now + 1s in the current
        // 68-year window, the same construction the wrap rule undoes.
        let now = SystemTime::now();
        let n = unix_seconds(now) + 1;
        let window = (n / YEAR68 - 1).max(0);
        let expiration = (n - window * YEAR68) as u32;

        let set = [a_record(5), rrsig_record(4, expiration)];
        assert_eq!(min_ttl(&set, now), 1);
    }

    #[test]
    fn expired_rrsig_saturates_at_zero() {
        let now = UNIX_EPOCH + Duration::from_secs(1_000_000);
        let set = [a_record(300), rrsig_record(300, 999_000)];
        assert_eq!(min_ttl(&set, now), 0);
    }
}
