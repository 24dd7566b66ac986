//! Admission gate coordination logic.
//!
//! The gate resolves the client identity of a request, asks the fixed-window
//! counter for a decision, and records metrics. It knows nothing about HTTP
//! status codes; the serving layer turns a rejection into a response.

use crate::application::counter::FixedWindowCounter;
use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, InboundRequest, Storage};
use crate::application::resolver::ClientKeyResolver;
use crate::domain::{
    decision::{AdmissionDecision, Limit},
    identity::ClientIdentity,
    window::WindowCounter,
};
use std::panic;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, trace};

#[cfg(feature = "async")]
use crate::application::sweeper::{EvictionSweeper, SweeperConfig, SweeperHandle};

/// Accepts or rejects requests before they reach business logic.
#[derive(Debug, Clone)]
pub struct AdmissionGate<S>
where
    S: Storage<ClientIdentity, WindowCounter> + Clone,
{
    resolver: ClientKeyResolver,
    counter: FixedWindowCounter<S>,
    enabled: bool,
    metrics: Metrics,
    clock: Arc<dyn Clock>,
}

impl<S> AdmissionGate<S>
where
    S: Storage<ClientIdentity, WindowCounter> + Clone,
{
    /// Create a new admission gate.
    ///
    /// # Arguments
    /// * `resolver` - Derives identities from requests
    /// * `counter` - The per-identity counter store, owned by this gate
    /// * `enabled` - When false, every request is admitted without touching counters
    /// * `metrics` - Metrics tracker
    /// * `clock` - Time source for [`AdmissionGate::admit_now`]
    pub fn new(
        resolver: ClientKeyResolver,
        counter: FixedWindowCounter<S>,
        enabled: bool,
        metrics: Metrics,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            resolver,
            counter,
            enabled,
            metrics,
            clock,
        }
    }

    /// Decide on a request received at `now`.
    ///
    /// Always returns a decision. A disabled policy admits the request with an
    /// unbounded limit and leaves counter state untouched.
    pub fn admit<R>(&self, request: &R, now: Instant) -> AdmissionDecision
    where
        R: InboundRequest + ?Sized,
    {
        if !self.enabled {
            self.metrics.record_bypassed();
            trace!("rate limiting disabled, request bypassed");
            return AdmissionDecision::bypass();
        }

        let identity = self.resolver.resolve(request);
        self.check_identity(identity, now)
    }

    /// Decide on a request received now, according to the gate's clock.
    pub fn admit_now<R>(&self, request: &R) -> AdmissionDecision
    where
        R: InboundRequest + ?Sized,
    {
        self.admit(request, self.clock.now())
    }

    /// Decide on a request from an already resolved identity.
    ///
    /// # Fail-Safe Behavior
    /// If the counter panics, the panic is contained, logged, and the request
    /// is admitted, so a fault in admission control never takes a request
    /// down with it.
    pub fn check_identity(&self, identity: ClientIdentity, now: Instant) -> AdmissionDecision {
        if !self.enabled {
            self.metrics.record_bypassed();
            return AdmissionDecision::bypass();
        }

        let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            self.counter.check_and_increment(identity.clone(), now)
        }));

        let decision = match result {
            Ok(decision) => decision,
            Err(_) => {
                error!(client = %identity, "admission check panicked, admitting request");
                AdmissionDecision::allow(0, Limit::Bounded(self.counter.limit()))
            }
        };

        if decision.allowed {
            self.metrics.record_allowed();
        } else {
            self.metrics.record_rejected();
            debug!(
                client = %identity,
                count = decision.current_count,
                limit = self.counter.limit(),
                retry_after_secs = decision.retry_after_secs,
                "request rejected by rate limit"
            );
        }

        decision
    }

    /// Whether limiting is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Get a reference to the identity resolver.
    pub fn resolver(&self) -> &ClientKeyResolver {
        &self.resolver
    }

    /// Get a reference to the counter store.
    pub fn counter(&self) -> &FixedWindowCounter<S> {
        &self.counter
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Get the gate's clock.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Start evicting idle counters of this gate in the background.
    #[cfg(feature = "async")]
    pub fn start_sweeper(&self, config: SweeperConfig) -> SweeperHandle
    where
        S: Send + Sync + 'static,
    {
        EvictionSweeper::new(self.counter.clone(), Arc::clone(&self.clock), config)
            .with_metrics(self.metrics.clone())
            .start()
    }
}
