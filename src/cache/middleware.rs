//! Read-through response cache middleware.
//!
//! Wraps downstream handlers: on a cacheable GET, serve from the store if
//! present; otherwise run the handler once, capture its finalized
//! response, and write it back without blocking the caller.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::counter;
use tracing::{debug, instrument, warn};

use super::{
    config::CacheConfig,
    keys::{self, KeyParts},
    policy::{self, CacheDecision},
    store::{ResponseStore, StoredResponse},
};

/// Cache-status annotation on every response passing through.
pub const CACHE_STATUS_HEADER: &str = "x-cache";
/// Derived key annotation on cacheable responses.
pub const CACHE_KEY_HEADER: &str = "x-cache-key";

pub const METRIC_CACHE_HIT: &str = "tasmik_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "tasmik_cache_miss_total";
pub const METRIC_CACHE_STORE_ERROR: &str = "tasmik_cache_store_error_total";

/// Responses above this size are served but not stored.
const MAX_CACHED_BODY_BYTES: usize = 1024 * 1024;

/// Opaque caller identity, inserted into request extensions by the
/// authentication layer fronting this router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerId(pub String);

/// Shared cache state for the middleware.
#[derive(Clone)]
pub struct CacheState {
    pub config: CacheConfig,
    pub store: Arc<dyn ResponseStore>,
}

/// Read-through caching around the downstream handler.
///
/// A store that errors at lookup time is treated the same as "not
/// cacheable": the request passes straight through. Caching must never
/// turn an otherwise-successful read into a failure.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn read_through(
    State(cache): State<CacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let decision = policy::decide(
        &cache.config,
        request.method(),
        request.uri().path(),
        request.uri().query(),
    );
    let (ttl, scope_to_caller) = match decision {
        CacheDecision::Skip(reason) => {
            debug!(reason = ?reason, "request not cacheable");
            let mut response = next.run(request).await;
            set_header(&mut response, CACHE_STATUS_HEADER, "DISABLED");
            return response;
        }
        CacheDecision::Store {
            ttl,
            scope_to_caller,
        } => (ttl, scope_to_caller),
    };

    let caller = request
        .extensions()
        .get::<CallerId>()
        .map(|caller| caller.0.clone());
    let key = keys::derive(&KeyParts {
        path: request.uri().path(),
        query: request.uri().query().unwrap_or(""),
        caller: caller.as_deref(),
        scope_to_caller,
    });

    match cache.store.get(&key).await {
        Ok(Some(stored)) => {
            counter!(METRIC_CACHE_HIT).increment(1);
            debug!(key = %key, outcome = "hit", "serving cached response");
            let mut response = rebuild_response(stored);
            annotate(&mut response, "HIT", &key);
            return response;
        }
        Ok(None) => {}
        Err(err) => {
            counter!(METRIC_CACHE_STORE_ERROR).increment(1);
            warn!(key = %key, error = %err, "cache backend unreachable, passing through");
            let mut response = next.run(request).await;
            set_header(&mut response, CACHE_STATUS_HEADER, "DISABLED");
            return response;
        }
    }

    counter!(METRIC_CACHE_MISS).increment(1);
    debug!(key = %key, outcome = "miss", "cache miss, executing handler");

    let response = next.run(request).await;

    // Only successful responses are stored; everything else is annotated
    // and returned untouched.
    if response.status() != StatusCode::OK || !body_within_cache_limit(&response) {
        let mut response = response;
        annotate(&mut response, "MISS", &key);
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_CACHED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(key = %key, error = %err, "failed to collect response body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let stored = StoredResponse {
        status: parts.status.as_u16(),
        headers: parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|text| (name.to_string(), text.to_string()))
            })
            .collect(),
        body: bytes.clone(),
    };

    // Fire-and-forget write-back: the caller never waits on it, and its
    // failure leaves the response untouched.
    let store = Arc::clone(&cache.store);
    let write_key = key.clone();
    tokio::spawn(async move {
        if let Err(err) = store.put(&write_key, stored, ttl).await {
            counter!(METRIC_CACHE_STORE_ERROR).increment(1);
            warn!(key = %write_key, error = %err, "cache write-back failed");
        }
    });

    let mut response = Response::from_parts(parts, Body::from(bytes));
    annotate(&mut response, "MISS", &key);
    response
}

fn body_within_cache_limit(response: &Response) -> bool {
    match response
        .headers()
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|text| text.parse::<u64>().ok())
    {
        Some(size) => size <= MAX_CACHED_BODY_BYTES as u64,
        // Unknown length; the collection cap still guards it.
        None => true,
    }
}

fn rebuild_response(stored: StoredResponse) -> Response {
    let mut builder = Response::builder().status(stored.status);
    for (name, value) in stored.headers {
        if let Ok(header_value) = HeaderValue::from_str(&value) {
            builder = builder.header(name, header_value);
        }
    }
    builder
        .body(Body::from(stored.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn annotate(response: &mut Response, status: &'static str, key: &str) {
    set_header(response, CACHE_STATUS_HEADER, status);
    if let Ok(value) = HeaderValue::from_str(key) {
        response.headers_mut().insert(CACHE_KEY_HEADER, value);
    }
}

fn set_header(response: &mut Response, name: &'static str, value: &'static str) {
    response
        .headers_mut()
        .insert(name, HeaderValue::from_static(value));
}
