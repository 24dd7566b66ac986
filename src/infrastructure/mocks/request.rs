//! In-memory request double.

use crate::application::ports::InboundRequest;
use std::net::IpAddr;

/// Request with a fixed set of headers and an optional peer address.
///
/// Header names are matched case-insensitively, like real HTTP headers.
#[derive(Debug, Clone, Default)]
pub struct MockRequest {
    headers: Vec<(String, String)>,
    peer: Option<IpAddr>,
}

impl MockRequest {
    /// A request with neither headers nor a peer address.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A request from a directly connected peer.
    pub fn from_peer(peer: IpAddr) -> Self {
        Self {
            headers: Vec::new(),
            peer: Some(peer),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl InboundRequest for MockRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn peer_addr(&self) -> Option<IpAddr> {
        self.peer
    }
}
