//! Adapter between the admission gate and the `http` crate types.
//!
//! The serving layer stores the connection's peer address in the request
//! extensions (as [`ClientAddr`] or a bare `SocketAddr`), calls the gate, and
//! turns a rejection into [`too_many_requests`].

use crate::application::ports::InboundRequest;
use crate::domain::decision::{AdmissionDecision, Limit, RateLimitExceeded};
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use http::{Request, Response, StatusCode};
use serde_json::json;
use std::net::{IpAddr, SocketAddr};

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Peer address of the connection a request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAddr(pub SocketAddr);

impl<B> InboundRequest for Request<B> {
    fn header(&self, name: &str) -> Option<&str> {
        // Values that are not visible ASCII are treated as absent
        self.headers().get(name)?.to_str().ok()
    }

    fn peer_addr(&self) -> Option<IpAddr> {
        let extensions = self.extensions();
        extensions
            .get::<ClientAddr>()
            .map(|addr| addr.0.ip())
            .or_else(|| extensions.get::<SocketAddr>().map(SocketAddr::ip))
    }
}

/// Build the 429 response for a rejected request.
pub fn too_many_requests(exceeded: &RateLimitExceeded) -> Response<String> {
    let body = json!({
        "error": "too_many_requests",
        "message": exceeded.to_string(),
        "retryAfterSeconds": exceeded.retry_after_secs,
        "limit": exceeded.limit,
    })
    .to_string();

    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(RETRY_AFTER, HeaderValue::from(exceeded.retry_after_secs));
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(exceeded.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(0u64));
    response
}

/// Add rate limit headers to the response of an admitted request.
///
/// Bypassed requests have no limit, so nothing is added for them.
pub fn apply_rate_limit_headers(decision: &AdmissionDecision, headers: &mut HeaderMap) {
    if let Limit::Bounded(limit) = decision.limit {
        headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
        headers.insert(
            X_RATELIMIT_REMAINING,
            HeaderValue::from(decision.remaining().unwrap_or(0)),
        );
    }
}
