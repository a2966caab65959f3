//! Cache key derivation.
//!
//! Maps a request's shape to a stable string key. Referentially
//! transparent: the same inputs always produce the same key, and any
//! differing query-parameter value produces a different key.

use url::form_urlencoded;

/// Fixed namespace prefix for every key.
pub const NAMESPACE: &str = "quran";

/// Schema-version suffix. Bump when the cached payload shape changes so new
/// code never serves stale-shaped entries written under old keys.
pub const SCHEMA_VERSION: &str = "v1";

const DELIMITER: &str = ":";

/// The request shape a key is derived from.
#[derive(Debug, Clone, Copy)]
pub struct KeyParts<'a> {
    /// Request path; leading/trailing slashes are ignored.
    pub path: &'a str,
    /// Raw query string (may be empty).
    pub query: &'a str,
    /// Caller identity, when the fronting auth layer supplied one.
    pub caller: Option<&'a str>,
    /// Whether this path group is cached per caller.
    pub scope_to_caller: bool,
}

/// Derive the cache key:
/// `<namespace>:<path-segments>[:user:<callerId>][:<param>:<value>...]:<version>`
///
/// Parameter names are sorted lexicographically so `?a=1&b=2` and
/// `?b=2&a=1` land on the same key. Values are taken verbatim — a filter
/// list passed as a JSON string is keyed character-for-character, so
/// equivalent filters serialized in a different order miss each other.
/// Accepted limitation, not a defect to fix here.
pub fn derive(parts: &KeyParts<'_>) -> String {
    let mut segments: Vec<String> = Vec::new();
    segments.push(NAMESPACE.to_string());
    segments.extend(
        parts
            .path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string),
    );

    if parts.scope_to_caller
        && let Some(caller) = parts.caller
    {
        segments.push("user".to_string());
        segments.push(caller.to_string());
    }

    let mut params: Vec<(String, String)> = form_urlencoded::parse(parts.query.as_bytes())
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    // Stable sort: duplicate names keep their arrival order.
    params.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, value) in params {
        segments.push(name);
        segments.push(value);
    }

    segments.push(SCHEMA_VERSION.to_string());
    segments.join(DELIMITER)
}
