//! Per-request cacheability decisions.
//!
//! Computed fresh for every request; nothing is memoized. The exclusion
//! sets are closed (compile-time) rather than configuration so the
//! compiler checks exhaustiveness wherever a decision is consumed.

use std::time::Duration;

use axum::http::Method;
use url::form_urlencoded;

use super::config::CacheConfig;

/// Paths never cached: their results are materialized views over mutable
/// assessment-assignment state, and staleness would directly corrupt
/// workflow decisions.
const EXCLUDED_PATHS: &[&str] = &["/participants/unassessed", "/participants/ready"];

/// An explicit "not yet assessed" status filter marks the same
/// staleness-sensitive state and is excluded on the value, not the path.
const VOLATILE_STATUS_PARAM: &str = "status";
const VOLATILE_STATUS_VALUE: &str = "BELUM";

/// Near-static reference geography, served with the long TTL tier.
const REFERENCE_PREFIX: &str = "/regions";

/// Path groups cached per caller where auth narrows visibility.
const CALLER_SCOPED_PREFIXES: &[&str] = &["/participants", "/assessors"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The process-wide kill switch is off.
    Disabled,
    /// Mutating requests are never read from or written to the cache.
    Method,
    ExcludedPath,
    VolatileQuery,
}

/// Outcome of the policy check for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDecision {
    Skip(SkipReason),
    Store {
        ttl: Duration,
        scope_to_caller: bool,
    },
}

pub fn decide(
    config: &CacheConfig,
    method: &Method,
    path: &str,
    query: Option<&str>,
) -> CacheDecision {
    if !config.enabled {
        return CacheDecision::Skip(SkipReason::Disabled);
    }
    if method != Method::GET {
        return CacheDecision::Skip(SkipReason::Method);
    }
    if EXCLUDED_PATHS.contains(&path) {
        return CacheDecision::Skip(SkipReason::ExcludedPath);
    }
    if query.is_some_and(has_volatile_status) {
        return CacheDecision::Skip(SkipReason::VolatileQuery);
    }

    let ttl = if path.starts_with(REFERENCE_PREFIX) {
        config.reference_ttl()
    } else {
        config.default_ttl()
    };
    let scope_to_caller = CALLER_SCOPED_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix));

    CacheDecision::Store {
        ttl,
        scope_to_caller,
    }
}

fn has_volatile_status(query: &str) -> bool {
    form_urlencoded::parse(query.as_bytes())
        .any(|(name, value)| name == VOLATILE_STATUS_PARAM && value == VOLATILE_STATUS_VALUE)
}
