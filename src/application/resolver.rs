//! Client identity resolution.
//!
//! The resolver is proxy-aware but deliberately naive: it trusts the
//! forwarding header unconditionally. A client can spoof the header to bypass
//! or smear its own quota. This is a known limitation of generated services
//! and is kept for compatibility; hardening it would change which requests
//! share a quota.

use crate::application::ports::InboundRequest;
use crate::domain::identity::ClientIdentity;

/// Derives a stable rate-limit identity from an inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKeyResolver {
    identity_header: String,
}

impl ClientKeyResolver {
    /// Header consulted by default.
    pub const DEFAULT_HEADER: &'static str = "X-Forwarded-For";

    /// Create a resolver reading the given forwarding header.
    pub fn new(identity_header: impl Into<String>) -> Self {
        Self {
            identity_header: identity_header.into(),
        }
    }

    /// Name of the forwarding header.
    pub fn identity_header(&self) -> &str {
        &self.identity_header
    }

    /// Resolve the identity of a request. Never fails.
    ///
    /// Order of precedence:
    /// 1. first comma-separated entry of the forwarding header, trimmed, if non-empty
    /// 2. the peer IP address
    /// 3. the [`ClientIdentity::UNRESOLVED`] sentinel
    pub fn resolve<R>(&self, request: &R) -> ClientIdentity
    where
        R: InboundRequest + ?Sized,
    {
        if let Some(forwarded) = request.header(&self.identity_header) {
            let first = forwarded.split(',').next().unwrap_or_default().trim();
            if !first.is_empty() {
                return ClientIdentity::new(first);
            }
        }

        match request.peer_addr() {
            Some(addr) => ClientIdentity::new(addr.to_string()),
            None => ClientIdentity::unresolved(),
        }
    }
}

impl Default for ClientKeyResolver {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HEADER)
    }
}
