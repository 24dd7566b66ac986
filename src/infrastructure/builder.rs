//! Builder wiring an [`AdmissionGate`] onto sharded in-memory storage.

use crate::application::{
    counter::FixedWindowCounter,
    gate::AdmissionGate,
    metrics::Metrics,
    ports::{Clock, EvictionPolicy},
    resolver::ClientKeyResolver,
};
use crate::domain::{
    identity::ClientIdentity,
    policy::{PolicyError, RateLimitPolicy},
    window::WindowCounter,
};
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::config::AdmissionConfig;
use crate::infrastructure::eviction::LruEviction;
use crate::infrastructure::storage::ShardedStorage;
use std::sync::Arc;
use tracing::debug;

/// Storage used by gates created through [`AdmissionGate::builder`].
pub type CounterStorage = Arc<ShardedStorage<ClientIdentity, WindowCounter>>;

/// Error returned when building a gate fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The enabled policy has a zero limit or window
    InvalidPolicy(PolicyError),
    /// Maximum tracked clients must be greater than zero
    ZeroMaxClients,
    /// The identity header name must not be blank
    EmptyIdentityHeader,
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::InvalidPolicy(e) => write!(f, "invalid rate limit policy: {}", e),
            BuildError::ZeroMaxClients => write!(f, "max_clients must be greater than 0"),
            BuildError::EmptyIdentityHeader => write!(f, "identity header must not be empty"),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::InvalidPolicy(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PolicyError> for BuildError {
    fn from(e: PolicyError) -> Self {
        BuildError::InvalidPolicy(e)
    }
}

/// Builder for configuring an [`AdmissionGate`].
#[derive(Debug)]
pub struct AdmissionGateBuilder {
    policy: RateLimitPolicy,
    identity_header: String,
    max_clients: Option<usize>,
    clock: Option<Arc<dyn Clock>>,
}

impl AdmissionGateBuilder {
    /// Default capacity of the counter store.
    pub const DEFAULT_MAX_CLIENTS: usize = 10_000;

    /// Start from a loaded configuration file.
    pub fn from_config(config: &AdmissionConfig) -> Self {
        let builder = AdmissionGate::builder()
            .with_policy(config.rate_limit)
            .with_identity_header(config.identity_header.clone());
        match config.max_clients {
            Some(max) => builder.with_max_clients(max),
            None => builder.with_unlimited_clients(),
        }
    }

    /// Set the rate limit policy.
    pub fn with_policy(mut self, policy: RateLimitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the header the client identity is read from.
    pub fn with_identity_header(mut self, header: impl Into<String>) -> Self {
        self.identity_header = header.into();
        self
    }

    /// Bound the number of tracked identities.
    ///
    /// When a new identity arrives at capacity, the least recently seen one is
    /// evicted. The bound is approximate under concurrent inserts.
    pub fn with_max_clients(mut self, max: usize) -> Self {
        self.max_clients = Some(max);
        self
    }

    /// Track any number of identities.
    ///
    /// Only idle eviction limits memory then; run an eviction sweeper.
    pub fn with_unlimited_clients(mut self) -> Self {
        self.max_clients = None;
        self
    }

    /// Set a custom clock, mostly for tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the gate.
    ///
    /// A disabled policy is not checked for positive limits, since it never
    /// reaches the counter.
    ///
    /// # Errors
    /// Returns `BuildError` if the configuration is invalid.
    pub fn build(self) -> Result<AdmissionGate<CounterStorage>, BuildError> {
        if self.max_clients == Some(0) {
            return Err(BuildError::ZeroMaxClients);
        }
        if self.identity_header.trim().is_empty() {
            return Err(BuildError::EmptyIdentityHeader);
        }
        if self.policy.enabled {
            self.policy.validate()?;
        }

        let metrics = Metrics::new();
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));

        let mut storage = ShardedStorage::new().with_metrics(metrics.clone());
        if let Some(max) = self.max_clients {
            let eviction: Arc<dyn EvictionPolicy<ClientIdentity, WindowCounter>> =
                Arc::new(LruEviction::new(max));
            storage = storage.with_eviction_policy(eviction);
        }

        // A disabled policy may carry zero limits; the counter is never consulted then.
        let counter_policy = if self.policy.enabled {
            self.policy
        } else {
            RateLimitPolicy::default()
        };
        let counter = FixedWindowCounter::new(Arc::new(storage), &counter_policy)?;

        debug!(
            enabled = self.policy.enabled,
            limit = self.policy.max_requests_per_window,
            window_secs = self.policy.window_size_seconds,
            max_clients = ?self.max_clients,
            "admission gate built"
        );

        Ok(AdmissionGate::new(
            ClientKeyResolver::new(self.identity_header),
            counter,
            self.policy.enabled,
            metrics,
            clock,
        ))
    }
}

impl AdmissionGate<CounterStorage> {
    /// Create a builder for configuring the gate.
    ///
    /// Defaults:
    /// - Policy: 60 requests per 60 second window, enabled
    /// - Identity header: `X-Forwarded-For`
    /// - Max clients: 10,000 (with LRU eviction)
    /// - Clock: system clock
    pub fn builder() -> AdmissionGateBuilder {
        AdmissionGateBuilder {
            policy: RateLimitPolicy::default(),
            identity_header: ClientKeyResolver::DEFAULT_HEADER.to_string(),
            max_clients: Some(AdmissionGateBuilder::DEFAULT_MAX_CLIENTS),
            clock: None,
        }
    }

    /// Create a gate with a specific policy and default settings otherwise.
    ///
    /// # Errors
    /// Returns `BuildError::InvalidPolicy` if an enabled policy has a zero field.
    pub fn with_policy(policy: RateLimitPolicy) -> Result<Self, BuildError> {
        Self::builder().with_policy(policy).build()
    }
}
