//! # radix-resolver
//!
//! A recursive, iterative, DNSSEC-validating DNS resolver.
//!
//! [`RecursiveResolver::lookup`] walks the delegation tree from a root
//! nameserver down to an authority for the queried name, validating
//! each signed step, chasing aliases, and consulting the shared answer
//! cache. Every lookup returns a [`LookupLog`] tree describing how the
//! answer was obtained.
//!
//! ```rust,ignore
//! use radix_cache::BasicCache;
//! use radix_proto::{Name, Question};
//! use radix_resolver::{builtin_root_hints, LookupContext, RecursiveResolver};
//! use std::str::FromStr;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let cache = Arc::new(BasicCache::with_system_clock());
//! let resolver = RecursiveResolver::new(false, true, &builtin_root_hints(false), root_keys, Some(cache));
//! let ctx = LookupContext::with_timeout(Duration::from_secs(30));
//! let (log, answer) = resolver.lookup(ctx, Question::a(Name::from_str("example.com.")?)).await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod hints;
pub mod resolver;
pub mod transport;

pub use hints::builtin_root_hints;
pub use resolver::{RecursiveResolver, ResolverConfig, MAX_REFERRALS};
pub use transport::{Exchanger, TransportError, UdpExchanger};

use radix_dnssec::DnssecError;
use radix_proto::{Name, Question, ResponseCode};
use serde::Serialize;
use std::net::IpAddr;
use std::time::{Duration, Instant, SystemTime};
use thiserror::Error;

/// Resolution errors.
#[derive(Error, Debug)]
pub enum ResolverError {
    /// The referral chain exceeded [`MAX_REFERRALS`].
    #[error("too many referrals")]
    TooManyReferrals,

    /// A referral carried no NS records to descend through.
    #[error("no NS authority records found")]
    NoNsAuthorities,

    /// Resolving a glueless nameserver produced no addresses.
    #[error("no A/AAAA records found for the chosen authority")]
    NoAuthorityAddress,

    /// A record in the response falls outside the authority's zone.
    #[error("out of bailiwick record in message")]
    OutOfBailiwick,

    /// An alias chain revisited a canonical name.
    #[error("alias loop detected")]
    AliasLoop,

    /// A sub-lookup returned a non-success rcode.
    #[error("response contained a non-zero RCODE: {0}")]
    BadAnswer(ResponseCode),

    /// No response arrived within the query timeout.
    #[error("query timed out")]
    Timeout,

    /// The caller's context deadline expired mid-lookup.
    #[error("lookup cancelled: context deadline exceeded")]
    Cancelled,

    /// Transport failure (socket errors, malformed responses).
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    /// DNSSEC validation failure.
    #[error("dnssec: {0}")]
    Dnssec(#[from] DnssecError),
}

/// Result type for resolver operations.
pub type Result<T> = std::result::Result<T, ResolverError>;

/// Cancellation context for one lookup call.
///
/// Carries an optional deadline bounding the entire resolution,
/// nested glueless-nameserver lookups included. The deadline is
/// checked between hops and imposed on every in-flight transport
/// exchange (alongside the per-query timeout), so expiry aborts the
/// current exchange and surfaces promptly as
/// [`ResolverError::Cancelled`]. State from the interrupted iteration
/// is discarded; the cache is not touched.
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupContext {
    deadline: Option<tokio::time::Instant>,
}

impl LookupContext {
    /// A context that never cancels.
    pub fn new() -> Self {
        Self { deadline: None }
    }

    /// A context that cancels at `deadline`.
    pub fn with_deadline(deadline: tokio::time::Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    /// A context that cancels `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(tokio::time::Instant::now() + timeout),
        }
    }

    /// Returns the deadline, if one was set.
    pub fn deadline(&self) -> Option<tokio::time::Instant> {
        self.deadline
    }

    /// Returns true once the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.deadline
            .map_or(false, |deadline| tokio::time::Instant::now() >= deadline)
    }
}

/// An upstream authoritative nameserver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Nameserver {
    /// Hostname of the server.
    pub name: Name,
    /// Address queries are sent to.
    pub addr: IpAddr,
    /// The zone apex this server is authoritative for.
    pub zone: Name,
}

/// One hop of a resolution, with nested hops in `composites`.
///
/// Serializes to JSON for diagnostics; flags that are false and empty
/// collections are omitted.
#[derive(Debug, Clone, Serialize)]
pub struct LookupLog {
    /// The question asked at this hop.
    pub query: Question,

    /// Response code observed.
    pub rcode: ResponseCode,

    /// True if the answer came from the cache.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cache_hit: bool,

    /// True if this hop's data validated.
    pub dnssec_valid: bool,

    /// Wall time spent on this hop, children included.
    pub latency: Duration,

    /// Error that ended the hop, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// True if the response arrived truncated.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,

    /// True if the response was a referral.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub referral: bool,

    /// When the hop started.
    pub started: SystemTime,

    /// The server contacted; absent on cache hits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ns: Option<Nameserver>,

    /// Nested hops: referrals, DNSKEY fetches, authority resolutions.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub composites: Vec<LookupLog>,

    #[serde(skip)]
    begun: Instant,
}

impl LookupLog {
    /// Starts a log for a question sent to `ns`.
    pub fn new(query: Question, ns: Option<Nameserver>) -> Self {
        Self {
            query,
            rcode: ResponseCode::NoError,
            cache_hit: false,
            dnssec_valid: false,
            latency: Duration::ZERO,
            error: None,
            truncated: false,
            referral: false,
            started: SystemTime::now(),
            ns,
            composites: Vec::new(),
            begun: Instant::now(),
        }
    }

    /// Stamps the hop latency.
    pub fn finish(&mut self) {
        self.latency = self.begun.elapsed();
    }

    /// Records the error that ended this hop.
    pub fn fail(&mut self, err: &ResolverError) {
        self.error = Some(err.to_string());
    }
}
