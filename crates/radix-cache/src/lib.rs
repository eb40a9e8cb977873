//! # radix-cache
//!
//! The answer cache for the radix resolver: a serialized map from a
//! question fingerprint to one TTL-bounded answer.
//!
//! Semantics the resolver depends on:
//!
//! - at most one live entry per question,
//! - `expires_at` is computed once at insertion and never slides,
//! - an insertion whose effective minimum TTL is zero is dropped,
//! - entries pinned with `forever` (root trust anchors) never expire.
//!
//! Time is injected through [`Clock`] so tests can advance it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod ttl;

pub use clock::{Clock, FakeClock, SystemClock};
pub use ttl::min_ttl;

use parking_lot::RwLock;
use radix_proto::{Question, ResourceRecord, ResponseCode};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, trace};

/// The answer to a resolution, as returned by lookups and stored in the
/// cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Answer section records.
    pub answer: Vec<ResourceRecord>,
    /// Authority section records.
    pub authority: Vec<ResourceRecord>,
    /// Additional section records.
    pub additional: Vec<ResourceRecord>,
    /// Response code of the final response.
    pub rcode: ResponseCode,
    /// True iff every signed step from the root down to this answer
    /// verified.
    pub authenticated: bool,
}

impl Answer {
    /// Creates an empty answer with the given rcode.
    pub fn empty(rcode: ResponseCode, authenticated: bool) -> Self {
        Self {
            answer: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
            rcode,
            authenticated,
        }
    }

    /// Iterates over all records in the three sections.
    pub fn records(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.answer
            .iter()
            .chain(self.authority.iter())
            .chain(self.additional.iter())
    }
}

/// Width of a question fingerprint.
pub const FINGERPRINT_LEN: usize = 20;

/// A fixed-width digest identifying a question. Collisions read as
/// cache misses.
pub type Fingerprint = [u8; FINGERPRINT_LEN];

/// Computes the fingerprint of a question: SHA-1 over the query type
/// and the lowercased wire-form name.
pub fn fingerprint(q: &Question) -> Fingerprint {
    let mut hasher = Sha1::new();
    hasher.update(q.qtype.to_u16().to_be_bytes());
    hasher.update(q.qname.lowercased().as_wire());
    hasher.finalize().into()
}

/// The cache interface the resolver programs against.
pub trait AnswerCache: Send + Sync {
    /// Returns a live cached answer for `q`, if any.
    fn get(&self, q: &Question) -> Option<Answer>;

    /// Inserts or replaces the entry for `q`. With `forever` false, an
    /// answer whose minimum TTL computes to zero is not stored.
    fn add(&self, q: &Question, answer: &Answer, forever: bool);

    /// Drops every expired entry.
    fn prune(&self);
}

struct CacheEntry {
    answer: Answer,
    forever: bool,
    expires_at: SystemTime,
}

impl CacheEntry {
    fn is_live(&self, now: SystemTime) -> bool {
        self.forever || now < self.expires_at
    }
}

/// The standard [`AnswerCache`]: one mutex-serialized map.
pub struct BasicCache {
    entries: RwLock<HashMap<Fingerprint, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl BasicCache {
    /// Creates an empty cache on the given clock.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Creates an empty cache on the system clock.
    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Returns the number of stored entries, live or not.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Spawns a task that prunes this cache every `interval` until the
    /// cache is dropped by all other holders.
    pub fn spawn_pruner(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match weak.upgrade() {
                    Some(cache) => cache.prune(),
                    None => break,
                }
            }
        })
    }
}

impl AnswerCache for BasicCache {
    fn get(&self, q: &Question) -> Option<Answer> {
        let key = fingerprint(q);
        let entries = self.entries.read();
        let entry = entries.get(&key)?;
        if !entry.is_live(self.clock.now()) {
            return None;
        }
        trace!(name = %q.qname, qtype = %q.qtype, "answer cache hit");
        Some(entry.answer.clone())
    }

    fn add(&self, q: &Question, answer: &Answer, forever: bool) {
        let now = self.clock.now();
        let ttl = min_ttl(answer.records(), now);
        if !forever && ttl == 0 {
            trace!(name = %q.qname, "dropping zero-ttl insertion");
            return;
        }
        let entry = CacheEntry {
            answer: answer.clone(),
            forever,
            expires_at: now + Duration::from_secs(u64::from(ttl)),
        };
        self.entries.write().insert(fingerprint(q), entry);
    }

    fn prune(&self) {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, remaining = entries.len(), "pruned answer cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radix_proto::{Name, RData, RecordType};
    use std::net::Ipv4Addr;
    use std::str::FromStr;
    use std::time::UNIX_EPOCH;

    fn fake_cache() -> (Arc<FakeClock>, BasicCache) {
        let clock = Arc::new(FakeClock::new(UNIX_EPOCH + Duration::from_secs(1_700_000_000)));
        let cache = BasicCache::new(clock.clone());
        (clock, cache)
    }

    fn answer_with_ttl(ttl: u32) -> Answer {
        let mut a = Answer::empty(ResponseCode::NoError, false);
        a.answer.push(ResourceRecord::a(
            Name::from_str("testing").unwrap(),
            ttl,
            Ipv4Addr::new(1, 2, 3, 4),
        ));
        a
    }

    #[test]
    fn forever_entries_survive_pruning() {
        let (clock, cache) = fake_cache();
        let q = Question::a(Name::from_str("testing").unwrap());

        assert!(cache.get(&q).is_none());

        let a = answer_with_ttl(5);
        cache.add(&q, &a, true);
        assert_eq!(cache.get(&q), Some(a.clone()));

        clock.advance(Duration::from_secs(30));
        cache.prune();
        assert_eq!(cache.get(&q), Some(a));
    }

    #[test]
    fn expired_entries_are_pruned() {
        let (clock, cache) = fake_cache();
        let q = Question::a(Name::from_str("testing-2").unwrap());

        let a = answer_with_ttl(5);
        cache.add(&q, &a, false);
        assert_eq!(cache.get(&q), Some(a));

        clock.advance(Duration::from_secs(30));
        cache.prune();
        assert!(cache.get(&q).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn replacement_resets_expiry_from_new_answer() {
        let (clock, cache) = fake_cache();
        let q = Question::a(Name::from_str("x").unwrap());

        cache.add(&q, &answer_with_ttl(5), false);
        clock.advance(Duration::from_secs(2));
        cache.add(&q, &answer_with_ttl(2), false);
        clock.advance(Duration::from_secs(3));
        cache.prune();
        assert!(cache.get(&q).is_none());
    }

    #[test]
    fn zero_ttl_insertion_is_dropped() {
        let (_clock, cache) = fake_cache();
        let q = Question::a(Name::from_str("x").unwrap());

        cache.add(&q, &answer_with_ttl(0), false);
        assert!(cache.get(&q).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn get_is_ttl_aware_without_prune() {
        let (clock, cache) = fake_cache();
        let q = Question::a(Name::from_str("x").unwrap());

        cache.add(&q, &answer_with_ttl(10), false);
        clock.advance(Duration::from_secs(20));
        assert!(cache.get(&q).is_none());
    }

    #[test]
    fn rrsig_near_expiration_bounds_entry_lifetime() {
        let (clock, cache) = fake_cache();
        let q = Question::a(Name::from_str("signed").unwrap());

        let now_unix = crate::clock::unix_seconds(clock.now());
        let expiration = (now_unix + 1) as u32; // within the first window
        let mut a = answer_with_ttl(5);
        a.answer.push(ResourceRecord::new(
            Name::from_str("signed").unwrap(),
            RecordType::RRSIG,
            5,
            RData::RRSIG(radix_proto::rdata::RRSIG::new(
                1,
                8,
                1,
                5,
                expiration,
                0,
                1,
                Name::root(),
                vec![],
            )),
        ));

        cache.add(&q, &a, false);
        assert!(cache.get(&q).is_some());
        clock.advance(Duration::from_secs(2));
        assert!(cache.get(&q).is_none());
    }

    #[tokio::test]
    async fn background_pruner_removes_expired_entries() {
        let clock = Arc::new(FakeClock::new(UNIX_EPOCH + Duration::from_secs(1_700_000_000)));
        let cache = Arc::new(BasicCache::new(clock.clone()));
        let q = Question::a(Name::from_str("transient").unwrap());

        cache.add(&q, &answer_with_ttl(5), false);
        clock.advance(Duration::from_secs(30));

        let handle = cache.spawn_pruner(Duration::from_millis(5));
        for _ in 0..100 {
            if cache.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(cache.is_empty());

        drop(cache);
        // With the last strong reference gone the pruner task winds down.
        let _ = tokio::time::timeout(Duration::from_secs(1), handle).await;
    }

    #[test]
    fn fingerprint_is_case_insensitive() {
        let a = fingerprint(&Question::a(Name::from_str("Example.COM").unwrap()));
        let b = fingerprint(&Question::a(Name::from_str("example.com").unwrap()));
        let c = fingerprint(&Question::aaaa(Name::from_str("example.com").unwrap()));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
