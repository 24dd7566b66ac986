//! Rate limit policy configuration.
//!
//! A policy is supplied at startup and never mutated afterwards. The same type
//! appears inside a [`ServiceSpec`](crate::domain::spec::ServiceSpec), where it
//! may arrive unvalidated from endpoint analysis, so deserialization does not
//! enforce positivity; [`RateLimitPolicy::validate`] does.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Error returned when a rate limit policy is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyError {
    /// `max_requests_per_window` must be greater than zero
    ZeroMaxRequests,
    /// `window_size_seconds` must be greater than zero
    ZeroWindowSize,
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyError::ZeroMaxRequests => {
                write!(f, "max_requests_per_window must be greater than 0")
            }
            PolicyError::ZeroWindowSize => {
                write!(f, "window_size_seconds must be greater than 0")
            }
        }
    }
}

impl std::error::Error for PolicyError {}

/// Fixed-window rate limit policy.
///
/// # Example
/// ```
/// use restgate::RateLimitPolicy;
/// use std::time::Duration;
///
/// let policy = RateLimitPolicy::new(60, 60).unwrap();
/// assert_eq!(policy.window_size(), Duration::from_secs(60));
/// assert!(RateLimitPolicy::new(0, 60).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitPolicy {
    /// Requests admitted per identity in one window
    pub max_requests_per_window: u64,
    /// Length of one window
    pub window_size_seconds: u64,
    /// When false, every request is admitted without touching counter state
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl RateLimitPolicy {
    /// Default requests per window.
    pub const DEFAULT_MAX_REQUESTS: u64 = 60;
    /// Default window length in seconds.
    pub const DEFAULT_WINDOW_SECONDS: u64 = 60;

    /// Create an enabled policy.
    ///
    /// # Errors
    /// Returns `PolicyError` if either value is zero.
    pub fn new(
        max_requests_per_window: u64,
        window_size_seconds: u64,
    ) -> Result<Self, PolicyError> {
        let policy = Self {
            max_requests_per_window,
            window_size_seconds,
            enabled: true,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// A policy that admits everything.
    ///
    /// The limit fields keep their defaults so the policy stays valid if it is
    /// re-enabled by configuration.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Check that the limit fields are positive.
    ///
    /// This is independent of `enabled`; callers decide whether a disabled
    /// policy needs checking.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_requests_per_window == 0 {
            return Err(PolicyError::ZeroMaxRequests);
        }
        if self.window_size_seconds == 0 {
            return Err(PolicyError::ZeroWindowSize);
        }
        Ok(())
    }

    /// Window length as a `Duration`.
    pub fn window_size(&self) -> Duration {
        Duration::from_secs(self.window_size_seconds)
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_requests_per_window: Self::DEFAULT_MAX_REQUESTS,
            window_size_seconds: Self::DEFAULT_WINDOW_SECONDS,
            enabled: true,
        }
    }
}
