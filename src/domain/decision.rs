//! Admission decisions and the client-facing rejection error.

use std::fmt;

/// Request limit reported with a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// At most this many requests per window
    Bounded(u64),
    /// Limiting is disabled
    Unbounded,
}

impl Limit {
    /// The numeric limit, if bounded.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Limit::Bounded(n) => Some(*n),
            Limit::Unbounded => None,
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Bounded(n) => write!(f, "{}", n),
            Limit::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// Result of one admission check.
///
/// One decision is produced per request. A rejected decision carries enough
/// metadata for the serving layer to build a "too many requests" response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionDecision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// Counter value after this request was registered (0 when bypassed)
    pub current_count: u64,
    /// Limit in force for this request
    pub limit: Limit,
    /// Seconds until the current window closes; 0 when allowed
    pub retry_after_secs: u64,
}

impl AdmissionDecision {
    /// An admitted request.
    pub fn allow(current_count: u64, limit: Limit) -> Self {
        Self {
            allowed: true,
            current_count,
            limit,
            retry_after_secs: 0,
        }
    }

    /// A rejected request.
    pub fn reject(current_count: u64, limit: u64, retry_after_secs: u64) -> Self {
        Self {
            allowed: false,
            current_count,
            limit: Limit::Bounded(limit),
            retry_after_secs,
        }
    }

    /// Decision returned when limiting is disabled.
    pub fn bypass() -> Self {
        Self::allow(0, Limit::Unbounded)
    }

    /// Check if this decision is Allow.
    pub fn is_allow(&self) -> bool {
        self.allowed
    }

    /// Check if this decision is Reject.
    pub fn is_reject(&self) -> bool {
        !self.allowed
    }

    /// Requests left in the current window, or `None` when unbounded.
    pub fn remaining(&self) -> Option<u64> {
        self.limit
            .as_u64()
            .map(|limit| limit.saturating_sub(self.current_count))
    }

    /// Convert into a `Result`, mapping a rejection to [`RateLimitExceeded`].
    pub fn into_result(self) -> Result<Self, RateLimitExceeded> {
        if self.allowed {
            return Ok(self);
        }
        Err(RateLimitExceeded {
            retry_after_secs: self.retry_after_secs,
            limit: self.limit.as_u64().unwrap_or(0),
            current_count: self.current_count,
        })
    }
}

/// A client exceeded its quota for the current window.
///
/// Recoverable and client-facing; never fatal to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitExceeded {
    /// Seconds the client should wait before retrying
    pub retry_after_secs: u64,
    /// Requests allowed per window
    pub limit: u64,
    /// Requests counted in the current window, including rejected ones
    pub current_count: u64,
}

impl fmt::Display for RateLimitExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rate limit of {} requests exceeded, retry after {}s",
            self.limit, self.retry_after_secs
        )
    }
}

impl std::error::Error for RateLimitExceeded {}
