//! The iterative resolution loop.
//!
//! [`RecursiveResolver::lookup`] starts at a random root nameserver and
//! repeatedly queries the current authority, classifying each response
//! as an answer, an alias to chase, a negative answer, or a referral to
//! descend through. DNSSEC validation runs on every non-cached hop
//! while the chain of trust from the root remains unbroken.

use crate::transport::Exchanger;
use crate::{LookupContext, LookupLog, Nameserver, ResolverError, Result};
use futures::future::{BoxFuture, FutureExt};
use radix_cache::clock::unix_seconds;
use radix_cache::{Answer, AnswerCache, Clock, SystemClock};
use radix_dnssec::{
    build_key_map, check_ds, nsec3_records, verify_delegation, verify_name_error, verify_nodata,
    verify_rrsig, DnssecError, KeyMap, SignatureVerifier, StandardVerifier,
};
use radix_proto::{
    Message, Name, Question, RData, RecordType, ResourceRecord, ResponseCode, DNS_PORT,
};
use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, instrument, warn};

/// Maximum number of referral responses before a lookup fails. Also
/// bounds how deeply glueless-nameserver resolution may nest.
pub const MAX_REFERRALS: usize = 10;

/// Tunables for the resolution loop.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Follow AAAA glue and resolve IPv6 authority addresses.
    pub use_ipv6: bool,
    /// Set the DO bit and validate signed responses.
    pub use_dnssec: bool,
    /// Referral budget per lookup.
    pub max_referrals: usize,
    /// Timeout for a single query exchange.
    pub query_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            use_ipv6: false,
            use_dnssec: true,
            max_referrals: MAX_REFERRALS,
            query_timeout: Duration::from_secs(5),
        }
    }
}

/// A DNSKEY response held back until the validation that depends on it
/// succeeds, so the cache never learns keys that were not fully trusted.
struct PendingInsert {
    question: Question,
    answer: Answer,
}

/// A recursive, validating DNS resolver.
///
/// Concurrent lookups share the transport and the cache; everything
/// else is per-lookup state. Each call to [`lookup`](Self::lookup)
/// takes a [`LookupContext`] whose deadline bounds the whole
/// resolution; dropping the returned future cancels just as cleanly.
/// Neither path mutates the cache for the interrupted iteration.
pub struct RecursiveResolver {
    config: ResolverConfig,
    transport: Arc<dyn Exchanger>,
    verifier: Arc<dyn SignatureVerifier>,
    clock: Arc<dyn Clock>,
    cache: Option<Arc<dyn AnswerCache>>,
    root_nameservers: Vec<Nameserver>,
}

impl RecursiveResolver {
    /// Creates a resolver with the UDP transport and real crypto.
    ///
    /// `root_hints` is an RRset of root NS records with A (and AAAA)
    /// glue; `root_keys` are the root zone's DNSKEY records, inserted
    /// into the cache as permanently trusted.
    pub fn new(
        use_ipv6: bool,
        use_dnssec: bool,
        root_hints: &[ResourceRecord],
        root_keys: Vec<ResourceRecord>,
        cache: Option<Arc<dyn AnswerCache>>,
    ) -> Self {
        Self::with_parts(
            ResolverConfig {
                use_ipv6,
                use_dnssec,
                ..ResolverConfig::default()
            },
            Arc::new(crate::transport::UdpExchanger),
            Arc::new(StandardVerifier),
            Arc::new(SystemClock),
            root_hints,
            root_keys,
            cache,
        )
    }

    /// Creates a resolver from explicit parts. This is the seam tests
    /// and alternative transports plug into.
    pub fn with_parts(
        config: ResolverConfig,
        transport: Arc<dyn Exchanger>,
        verifier: Arc<dyn SignatureVerifier>,
        clock: Arc<dyn Clock>,
        root_hints: &[ResourceRecord],
        root_keys: Vec<ResourceRecord>,
        cache: Option<Arc<dyn AnswerCache>>,
    ) -> Self {
        let root = Name::root();
        let mut root_nameservers = Vec::new();
        for record in root_hints {
            match record.rdata() {
                RData::A(a) => root_nameservers.push(Nameserver {
                    name: record.name().clone(),
                    addr: IpAddr::V4(a.address()),
                    zone: root.clone(),
                }),
                RData::AAAA(aaaa) if config.use_ipv6 => root_nameservers.push(Nameserver {
                    name: record.name().clone(),
                    addr: IpAddr::V6(aaaa.address()),
                    zone: root.clone(),
                }),
                _ => {}
            }
        }

        let resolver = Self {
            config,
            transport,
            verifier,
            clock,
            cache,
            root_nameservers,
        };

        if let (Some(cache), false) = (&resolver.cache, root_keys.is_empty()) {
            let answer = Answer {
                answer: root_keys,
                authority: Vec::new(),
                additional: Vec::new(),
                rcode: ResponseCode::NoError,
                authenticated: true,
            };
            cache.add(&Question::dnskey(Name::root()), &answer, true);
        }

        resolver
    }

    /// Returns the configured root nameservers.
    pub fn roots(&self) -> &[Nameserver] {
        &self.root_nameservers
    }

    /// Resolves `question` iteratively from the root.
    ///
    /// `ctx` bounds the whole call: its deadline covers every hop and
    /// nested glueless-nameserver lookup, and expiry surfaces as
    /// [`ResolverError::Cancelled`]. The log is returned in both
    /// outcomes; on failure the hop that broke carries the error
    /// string.
    #[instrument(skip(self, ctx), fields(name = %question.qname, qtype = %question.qtype))]
    pub async fn lookup(
        &self,
        ctx: LookupContext,
        question: Question,
    ) -> (LookupLog, Result<Answer>) {
        self.lookup_at_depth(ctx, question, 0).await
    }

    /// Recursion entry point shared by user lookups and glueless
    /// nameserver resolution; `depth` counts the nesting and is charged
    /// against the referral budget, and `ctx` is shared by the whole
    /// nesting.
    fn lookup_at_depth(
        &self,
        ctx: LookupContext,
        question: Question,
        depth: usize,
    ) -> BoxFuture<'_, (LookupLog, Result<Answer>)> {
        async move {
            let mut ll = LookupLog::new(question.clone(), None);
            let result = self.resolve(ctx, question, depth, &mut ll).await;
            ll.finish();
            (ll, result)
        }
        .boxed()
    }

    async fn resolve(
        &self,
        ctx: LookupContext,
        mut q: Question,
        depth: usize,
        ll: &mut LookupLog,
    ) -> Result<Answer> {
        if depth >= self.config.max_referrals {
            warn!(name = %q.qname, depth, "nameserver resolution nested too deeply");
            return Err(ResolverError::TooManyReferrals);
        }

        let mut authority =
            choose(&self.root_nameservers).ok_or(ResolverError::NoNsAuthorities)?;
        let mut aliases: HashSet<Name> = HashSet::new();
        let mut chased: Vec<ResourceRecord> = Vec::new();
        let mut parent_ds_set: Vec<ResourceRecord> = Vec::new();

        for _ in 0..self.config.max_referrals {
            if ctx.is_expired() {
                return Err(ResolverError::Cancelled);
            }

            // The chain of trust is intact while we are talking to the
            // root or the previous referral supplied DS records.
            let chain_secure = authority.zone.is_root() || !parent_ds_set.is_empty();

            let (result, qlog) = self.query(ctx, &q, &authority).await;
            ll.composites.push(qlog);
            let hop = ll.composites.len() - 1;

            let r = match result {
                Ok(r) => r,
                Err(err) => {
                    ll.composites[hop].fail(&err);
                    return Err(err);
                }
            };

            let cache_hit = ll.composites[hop].cache_hit;
            let mut validated = cache_hit && ll.composites[hop].dnssec_valid;
            if self.config.use_dnssec && chain_secure && !cache_hit {
                let (key_log, checked) = self
                    .check_signatures(ctx, &r, &authority, &parent_ds_set)
                    .await;
                ll.composites[hop].composites.push(key_log);
                if let Err(err) = checked {
                    ll.composites[hop].fail(&err);
                    return Err(err);
                }
                validated = true;
            }
            ll.composites[hop].dnssec_valid = validated;
            ll.dnssec_valid = validated;

            if !r.rcode().is_success() {
                if r.is_nxdomain() {
                    let nsec_set = nsec3_records(r.authority());
                    // A signed zone must prove the name error.
                    if !nsec_set.is_empty() {
                        if let Err(err) = verify_name_error(&q, &nsec_set) {
                            return Err(self.fail_proof(ll, hop, err));
                        }
                    }
                }
                return Ok(extract_answer(&r, validated));
            }

            if !r.answers().is_empty() {
                if let Some(canonical) = is_alias(r.answers(), &q) {
                    if !aliases.insert(canonical.clone()) {
                        let err = ResolverError::AliasLoop;
                        ll.composites[hop].fail(&err);
                        return Err(err);
                    }
                    debug!(from = %q.qname, to = %canonical, "chasing alias from the root");
                    authority = choose(&self.root_nameservers)
                        .ok_or(ResolverError::NoNsAuthorities)?;
                    q.qname = canonical;
                    chased.extend(extract_rrset(r.answers(), None, RecordType::CNAME));
                    // The new name may live in a different branch of the
                    // tree; its chain is built fresh from the root.
                    parent_ds_set.clear();
                    continue;
                }

                if !cache_hit {
                    if let Some(cache) = &self.cache {
                        let cache = Arc::clone(cache);
                        let question = q.clone();
                        let answer = extract_answer(&r, validated);
                        tokio::spawn(async move {
                            cache.add(&question, &answer, false);
                        });
                    }
                }

                let mut answer = extract_answer(&r, validated);
                if !chased.is_empty() {
                    chased.extend(answer.answer);
                    answer.answer = std::mem::take(&mut chased);
                }
                return Ok(answer);
            }

            let nsec_set = nsec3_records(r.authority());
            if r.authority().is_empty() {
                // NODATA: the name exists, the type does not.
                if !nsec_set.is_empty() {
                    if let Err(err) = verify_nodata(&q, &nsec_set) {
                        return Err(self.fail_proof(ll, hop, err));
                    }
                }
                return Ok(Answer::empty(ResponseCode::NoError, validated));
            }

            // Referral.
            ll.composites[hop].referral = true;
            let (auth_logs, picked) = self
                .pick_authority(ctx, r.authority(), r.additional(), depth)
                .await;
            ll.composites[hop].composites.extend(auth_logs);
            authority = match picked {
                Ok(ns) => ns,
                Err(err) => {
                    ll.composites[hop].fail(&err);
                    return Err(err);
                }
            };

            let ds_set = extract_rrset(r.authority(), Some(&authority.zone), RecordType::DS);
            if !nsec_set.is_empty() && ds_set.is_empty() {
                // Unsigned delegation out of a signed zone needs proof.
                if let Err(err) = verify_delegation(&authority.zone, &nsec_set) {
                    return Err(self.fail_proof(ll, hop, err));
                }
            }
            if chain_secure {
                parent_ds_set = ds_set;
            }
        }

        Err(ResolverError::TooManyReferrals)
    }

    /// Marks a failed non-existence proof on the hop and lookup logs.
    fn fail_proof(&self, ll: &mut LookupLog, hop: usize, err: DnssecError) -> ResolverError {
        let err = ResolverError::from(err);
        ll.composites[hop].fail(&err);
        ll.composites[hop].dnssec_valid = false;
        ll.dnssec_valid = false;
        err
    }

    /// Sends one query to `auth`, preferring the cache. The returned
    /// log carries rcode, latency, and the cache/truncation flags.
    async fn query(
        &self,
        ctx: LookupContext,
        q: &Question,
        auth: &Nameserver,
    ) -> (Result<Message>, LookupLog) {
        let mut log = LookupLog::new(q.clone(), Some(auth.clone()));
        let result = self.query_inner(ctx, q, auth, &mut log).await;
        log.finish();
        (result, log)
    }

    async fn query_inner(
        &self,
        ctx: LookupContext,
        q: &Question,
        auth: &Nameserver,
        log: &mut LookupLog,
    ) -> Result<Message> {
        if let Some(cache) = &self.cache {
            if let Some(answer) = cache.get(q) {
                log.cache_hit = true;
                log.ns = None;
                log.dnssec_valid = answer.authenticated;
                log.rcode = ResponseCode::NoError;
                return Ok(message_from_answer(&answer));
            }
        }

        let message = Message::query(q.clone(), self.config.use_dnssec);
        let addr = SocketAddr::new(auth.addr, DNS_PORT);
        debug!(name = %q.qname, qtype = %q.qtype, server = %addr, zone = %auth.zone, "querying authority");

        // The exchange runs under the per-query timeout or the caller's
        // deadline, whichever comes first; hitting the deadline aborts
        // the in-flight exchange.
        let per_query = Instant::now() + self.config.query_timeout;
        let exchange_deadline = ctx.deadline().map_or(per_query, |d| d.min(per_query));

        let response = match timeout_at(
            exchange_deadline,
            self.transport.exchange(&message, addr),
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return Err(err.into()),
            Err(_) if ctx.is_expired() => return Err(ResolverError::Cancelled),
            Err(_) => return Err(ResolverError::Timeout),
        };

        log.rcode = response.rcode();
        log.truncated = response.is_truncated();
        if log.truncated {
            debug!(server = %addr, "response truncated, processing as received");
        }

        // Reject the whole message on any out-of-bailiwick record
        // rather than stripping it.
        for section in [response.answers(), response.authority()] {
            for record in section {
                if !record.name().is_subdomain_of(&auth.zone) {
                    warn!(owner = %record.name(), zone = %auth.zone, "out of bailiwick record");
                    return Err(ResolverError::OutOfBailiwick);
                }
            }
        }

        Ok(response)
    }

    /// Fetches and validates the DNSKEY RRset for the authority's zone,
    /// plus the deferred cache insertion the caller commits once the
    /// wider validation succeeds.
    async fn lookup_dnskey(
        &self,
        ctx: LookupContext,
        auth: &Nameserver,
    ) -> (LookupLog, Result<(KeyMap, Option<PendingInsert>)>) {
        let q = Question::dnskey(auth.zone.clone());

        if let Some(cache) = &self.cache {
            if let Some(answer) = cache.get(&q) {
                let mut log = LookupLog::new(q, None);
                log.cache_hit = true;
                log.dnssec_valid = answer.authenticated;
                log.rcode = ResponseCode::NoError;
                log.finish();

                let keys = build_key_map(&answer.answer);
                if keys.is_empty() {
                    let err = ResolverError::from(DnssecError::NoDnskey);
                    log.fail(&err);
                    return (log, Err(err));
                }
                return (log, Ok((keys, None)));
            }
        }

        let (result, mut log) = self.query(ctx, &q, auth).await;
        let r = match result {
            Ok(r) => r,
            Err(err) => {
                log.fail(&err);
                return (log, Err(err));
            }
        };

        if r.answers().is_empty() || !r.rcode().is_success() {
            let err = ResolverError::from(DnssecError::NoDnskey);
            log.fail(&err);
            return (log, Err(err));
        }

        let keys = build_key_map(r.answers());
        if keys.is_empty() {
            let err = ResolverError::from(DnssecError::NoDnskey);
            log.fail(&err);
            return (log, Err(err));
        }

        // Below the root the DNSKEY RRset is signed by its own KSK; the
        // root set is anchored by the operator-supplied trust keys.
        if !auth.zone.is_root() {
            if let Err(err) = verify_rrsig(&r, &keys, self.verifier.as_ref(), self.now()) {
                let err = ResolverError::from(err);
                log.fail(&err);
                return (log, Err(err));
            }
        }

        let pending = PendingInsert {
            question: q,
            answer: Answer {
                answer: r.answers().to_vec(),
                authority: r.authority().to_vec(),
                additional: r.additional().to_vec(),
                rcode: ResponseCode::NoError,
                authenticated: true,
            },
        };
        (log, Ok((keys, Some(pending))))
    }

    /// Validates `msg` for the authority's zone: acquire keys, bridge
    /// them to the parent DS set, then verify every RRSIG. The DNSKEY
    /// response only enters the cache after all of that holds.
    async fn check_signatures(
        &self,
        ctx: LookupContext,
        msg: &Message,
        auth: &Nameserver,
        parent_ds_set: &[ResourceRecord],
    ) -> (LookupLog, Result<()>) {
        let (mut log, keys_result) = self.lookup_dnskey(ctx, auth).await;
        let (keys, pending) = match keys_result {
            Ok(v) => v,
            Err(err) => return (log, Err(err)),
        };

        let outcome = (|| -> std::result::Result<(), DnssecError> {
            if !parent_ds_set.is_empty() {
                check_ds(&keys, parent_ds_set, &auth.zone)?;
            }
            verify_rrsig(msg, &keys, self.verifier.as_ref(), self.now())
        })();

        match outcome {
            Ok(()) => {
                log.dnssec_valid = true;
                if !log.cache_hit {
                    if let (Some(cache), Some(pending)) = (&self.cache, pending) {
                        cache.add(&pending.question, &pending.answer, false);
                    }
                }
                (log, Ok(()))
            }
            Err(err) => {
                let err = ResolverError::from(err);
                log.fail(&err);
                (log, Err(err))
            }
        }
    }

    /// Chooses the next authority from a referral's NS records and
    /// glue. Without usable glue, one nameserver is resolved through a
    /// full nested lookup.
    async fn pick_authority(
        &self,
        ctx: LookupContext,
        auths: &[ResourceRecord],
        extras: &[ResourceRecord],
        depth: usize,
    ) -> (Vec<LookupLog>, Result<Nameserver>) {
        let (zones, ns_to_zone) = split_auths_by_zone(auths, extras, self.config.use_ipv6);

        if zones.is_empty() {
            if ns_to_zone.is_empty() {
                return (Vec::new(), Err(ResolverError::NoNsAuthorities));
            }
            let pairs: Vec<(Name, Name)> = ns_to_zone
                .iter()
                .map(|(ns, zone)| (ns.clone(), zone.clone()))
                .collect();
            let Some((ns, zone)) = choose(&pairs) else {
                return (Vec::new(), Err(ResolverError::NoNsAuthorities));
            };

            debug!(ns = %ns, zone = %zone, "referral without glue, resolving nameserver");
            let (logs, resolved) = self.lookup_ns(ctx, &ns, depth).await;
            let resolved = resolved.map(|mut nameserver| {
                nameserver.zone = zone;
                nameserver
            });
            return (logs, resolved);
        }

        for (ns, zone) in shuffled(
            ns_to_zone
                .iter()
                .map(|(ns, zone)| (ns.clone(), zone.clone()))
                .collect(),
        ) {
            if let Some(addr) = zones.get(&zone).and_then(|addrs| choose(addrs)) {
                return (
                    Vec::new(),
                    Ok(Nameserver {
                        name: ns,
                        addr,
                        zone,
                    }),
                );
            }
        }

        (Vec::new(), Err(ResolverError::NoNsAuthorities))
    }

    /// Resolves a glueless nameserver's address with a nested lookup:
    /// A first, then AAAA when IPv6 is enabled.
    async fn lookup_ns(
        &self,
        ctx: LookupContext,
        name: &Name,
        depth: usize,
    ) -> (Vec<LookupLog>, Result<Nameserver>) {
        let mut qtypes = vec![RecordType::A];
        if self.config.use_ipv6 {
            qtypes.push(RecordType::AAAA);
        }

        let mut logs = Vec::new();
        let mut last_err = ResolverError::NoAuthorityAddress;

        for qtype in qtypes {
            let (log, result) = self
                .lookup_at_depth(ctx, Question::new(name.clone(), qtype), depth + 1)
                .await;
            logs.push(log);

            let answer = match result {
                Ok(answer) => answer,
                Err(err) => {
                    last_err = err;
                    continue;
                }
            };
            if !answer.rcode.is_success() {
                last_err = ResolverError::BadAnswer(answer.rcode);
                continue;
            }

            let addrs: Vec<IpAddr> = answer
                .answer
                .iter()
                .filter(|record| record.name() == name)
                .filter_map(|record| match record.rdata() {
                    RData::A(a) => Some(IpAddr::V4(a.address())),
                    RData::AAAA(aaaa) if self.config.use_ipv6 => {
                        Some(IpAddr::V6(aaaa.address()))
                    }
                    _ => None,
                })
                .collect();

            if let Some(addr) = choose(&addrs) {
                return (
                    logs,
                    Ok(Nameserver {
                        name: name.clone(),
                        addr,
                        zone: Name::root(),
                    }),
                );
            }
        }

        (logs, Err(last_err))
    }

    /// Current time in 32-bit serial space, for signature windows.
    fn now(&self) -> u32 {
        unix_seconds(self.clock.now()) as u32
    }
}

/// Builds a response-shaped message out of a cached answer.
fn message_from_answer(answer: &Answer) -> Message {
    let mut msg = Message::default();
    msg.set_answers(answer.answer.clone());
    msg.set_authority(answer.authority.clone());
    msg.set_additional(answer.additional.clone());
    msg
}

/// Copies a response into the caller-facing [`Answer`] shape.
fn extract_answer(msg: &Message, authenticated: bool) -> Answer {
    Answer {
        answer: msg.answers().to_vec(),
        authority: msg.authority().to_vec(),
        additional: msg.additional().to_vec(),
        rcode: msg.rcode(),
        authenticated,
    }
}

/// Filters `records` down to one type, optionally restricted to one
/// owner name.
fn extract_rrset(
    records: &[ResourceRecord],
    name: Option<&Name>,
    rtype: RecordType,
) -> Vec<ResourceRecord> {
    records
        .iter()
        .filter(|r| r.record_type() == Some(rtype))
        .filter(|r| name.map_or(true, |n| r.name() == n))
        .cloned()
        .collect()
}

/// Decides whether an answer is an alias for `q` and returns the
/// canonical name to chase.
fn is_alias(answer: &[ResourceRecord], q: &Question) -> Option<Name> {
    let filtered: Vec<&ResourceRecord> = answer
        .iter()
        .filter(|r| r.record_type() != Some(RecordType::RRSIG))
        .collect();
    if filtered.is_empty() {
        return None;
    }

    if filtered.len() > 1 {
        // Several records are only an alias when they form a CNAME
        // chain and CNAME itself was not the question.
        if q.record_type() == Some(RecordType::CNAME)
            || !filtered
                .iter()
                .all(|r| r.record_type() == Some(RecordType::CNAME))
        {
            return None;
        }
        return collapse_cname_chain(&q.qname, &filtered);
    }

    match filtered[0].rdata() {
        RData::CNAME(cname) if q.record_type() != Some(RecordType::CNAME) => {
            Some(cname.target().clone())
        }
        RData::DNAME(dname) if q.record_type() != Some(RecordType::DNAME) => {
            let owner = filtered[0].name();
            if &q.qname == owner {
                Some(dname.target().clone())
            } else {
                q.qname.replace_suffix(owner, dname.target())
            }
        }
        _ => None,
    }
}

/// Follows owner -> target through a CNAME chain starting at `qname`;
/// the final target is the canonical name. Steps are bounded by the
/// chain length so a malformed cyclic answer cannot spin.
fn collapse_cname_chain(qname: &Name, records: &[&ResourceRecord]) -> Option<Name> {
    let mut targets: HashMap<&Name, &Name> = HashMap::new();
    for record in records {
        if let RData::CNAME(cname) = record.rdata() {
            targets.insert(record.name(), cname.target());
        }
    }

    let mut canonical: Option<&Name> = None;
    let mut current = qname;
    for _ in 0..records.len() {
        match targets.get(current) {
            Some(&target) => {
                canonical = Some(target);
                current = target;
            }
            None => break,
        }
    }
    canonical.cloned()
}

/// Groups a referral's NS targets by delegated zone and collects their
/// glue addresses from the additional section.
fn split_auths_by_zone(
    auths: &[ResourceRecord],
    extras: &[ResourceRecord],
    use_ipv6: bool,
) -> (HashMap<Name, Vec<IpAddr>>, HashMap<Name, Name>) {
    let mut ns_to_zone: HashMap<Name, Name> = HashMap::new();
    for record in auths {
        if let RData::NS(ns) = record.rdata() {
            ns_to_zone.insert(ns.nsdname().clone(), record.name().clone());
        }
    }

    let mut zones: HashMap<Name, Vec<IpAddr>> = HashMap::new();
    for record in extras {
        let Some(zone) = ns_to_zone.get(record.name()) else {
            continue;
        };
        match record.rdata() {
            RData::A(a) => zones
                .entry(zone.clone())
                .or_default()
                .push(IpAddr::V4(a.address())),
            RData::AAAA(aaaa) if use_ipv6 => zones
                .entry(zone.clone())
                .or_default()
                .push(IpAddr::V6(aaaa.address())),
            _ => {}
        }
    }

    (zones, ns_to_zone)
}

/// Uniformly random element, cloned out.
fn choose<T: Clone>(items: &[T]) -> Option<T> {
    use rand::seq::SliceRandom;
    items.choose(&mut rand::thread_rng()).cloned()
}

/// Uniformly random permutation.
fn shuffled<T>(mut items: Vec<T>) -> Vec<T> {
    use rand::seq::SliceRandom;
    items.shuffle(&mut rand::thread_rng());
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::str::FromStr;

    fn name(s: &str) -> Name {
        Name::from_str(s).unwrap()
    }

    fn cname_rr(owner: &str, target: &str) -> ResourceRecord {
        ResourceRecord::cname(name(owner), 300, name(target))
    }

    #[test]
    fn single_cname_is_an_alias() {
        let q = Question::a(name("a.example"));
        let answer = vec![cname_rr("a.example", "b.example")];
        assert_eq!(is_alias(&answer, &q), Some(name("b.example")));
    }

    #[test]
    fn cname_query_is_not_chased() {
        let q = Question::new(name("a.example"), RecordType::CNAME);
        let answer = vec![cname_rr("a.example", "b.example")];
        assert_eq!(is_alias(&answer, &q), None);
    }

    #[test]
    fn cname_chain_collapses_to_last_target() {
        let q = Question::a(name("a.example"));
        let answer = vec![
            cname_rr("b.example", "c.example"),
            cname_rr("a.example", "b.example"),
        ];
        assert_eq!(is_alias(&answer, &q), Some(name("c.example")));
    }

    #[test]
    fn mixed_record_answer_is_not_an_alias() {
        let q = Question::a(name("a.example"));
        let answer = vec![
            cname_rr("a.example", "b.example"),
            ResourceRecord::a(name("b.example"), 300, Ipv4Addr::new(192, 0, 2, 1)),
        ];
        assert_eq!(is_alias(&answer, &q), None);
    }

    #[test]
    fn rrsig_records_are_ignored_when_detecting_aliases() {
        let q = Question::a(name("a.example"));
        let sig = ResourceRecord::new(
            name("a.example"),
            RecordType::RRSIG,
            300,
            RData::RRSIG(radix_proto::rdata::RRSIG::new(
                5,
                8,
                2,
                300,
                2,
                1,
                7,
                name("example"),
                vec![],
            )),
        );
        let answer = vec![cname_rr("a.example", "b.example"), sig];
        assert_eq!(is_alias(&answer, &q), Some(name("b.example")));
    }

    #[test]
    fn dname_rewrites_the_query_name() {
        let q = Question::a(name("host.old.example"));
        let answer = vec![ResourceRecord::new(
            name("old.example"),
            RecordType::DNAME,
            300,
            RData::DNAME(radix_proto::rdata::DNAME::new(name("new.example"))),
        )];
        assert_eq!(is_alias(&answer, &q), Some(name("host.new.example")));
    }

    #[test]
    fn dname_for_unrelated_name_is_ignored() {
        let q = Question::a(name("host.other.example"));
        let answer = vec![ResourceRecord::new(
            name("old.example"),
            RecordType::DNAME,
            300,
            RData::DNAME(radix_proto::rdata::DNAME::new(name("new.example"))),
        )];
        assert_eq!(is_alias(&answer, &q), None);
    }

    #[test]
    fn cyclic_cname_answer_terminates() {
        let q = Question::a(name("a.example"));
        let answer = vec![
            cname_rr("a.example", "b.example"),
            cname_rr("b.example", "a.example"),
        ];
        // The collapse is bounded; whatever it lands on, it returns.
        let result = is_alias(&answer, &q);
        assert!(result.is_some());
    }

    #[test]
    fn split_auths_groups_glue_by_zone() {
        let auths = vec![
            ResourceRecord::ns(name("example"), 300, name("ns1.example")),
            ResourceRecord::ns(name("example"), 300, name("ns2.example")),
        ];
        let extras = vec![
            ResourceRecord::a(name("ns1.example"), 300, Ipv4Addr::new(192, 0, 2, 1)),
            ResourceRecord::aaaa(name("ns2.example"), 300, "2001:db8::1".parse().unwrap()),
            ResourceRecord::a(name("unrelated.example"), 300, Ipv4Addr::new(192, 0, 2, 9)),
        ];

        let (zones, ns_to_zone) = split_auths_by_zone(&auths, &extras, false);
        assert_eq!(ns_to_zone.len(), 2);
        assert_eq!(zones[&name("example")].len(), 1); // AAAA ignored without IPv6

        let (zones, _) = split_auths_by_zone(&auths, &extras, true);
        assert_eq!(zones[&name("example")].len(), 2);
    }

    #[test]
    fn config_defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.max_referrals, MAX_REFERRALS);
        assert!(config.use_dnssec);
        assert!(!config.use_ipv6);
    }

    #[test]
    fn roots_respect_ipv6_flag() {
        let hints = crate::hints::builtin_root_hints(true);

        let v4_only = RecursiveResolver::new(false, true, &hints, Vec::new(), None);
        assert_eq!(v4_only.roots().len(), 13);

        let dual = RecursiveResolver::new(true, true, &hints, Vec::new(), None);
        assert_eq!(dual.roots().len(), 26);
        assert!(dual.roots().iter().all(|ns| ns.zone.is_root()));
    }
}
