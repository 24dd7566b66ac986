//! Per-identity fixed-window counting.
//!
//! The counter store owns one [`WindowCounter`] per identity. All state
//! transitions for an identity run inside [`Storage::with_entry_mut`], which
//! holds the storage shard's write lock, so concurrent requests from one
//! identity observe a serialized, strictly increasing count and eviction of
//! that identity cannot interleave with an increment.

use crate::application::ports::{Storage, Timestamped};
use crate::domain::{
    decision::AdmissionDecision,
    identity::ClientIdentity,
    policy::{PolicyError, RateLimitPolicy},
    window::WindowCounter,
};
use std::time::{Duration, Instant};
use tracing::debug;

impl Timestamped for WindowCounter {
    fn last_access(&self) -> Instant {
        self.last_seen()
    }
}

/// Fixed-window request counter keyed by client identity.
///
/// This type is generic over the storage implementation. In production, use
/// `Arc<ShardedStorage>`.
#[derive(Debug, Clone)]
pub struct FixedWindowCounter<S>
where
    S: Storage<ClientIdentity, WindowCounter> + Clone,
{
    storage: S,
    limit: u64,
    window: Duration,
}

impl<S> FixedWindowCounter<S>
where
    S: Storage<ClientIdentity, WindowCounter> + Clone,
{
    /// Create a counter enforcing `policy` over `storage`.
    ///
    /// The `enabled` flag is not consulted here; bypassing is the gate's job.
    ///
    /// # Errors
    /// Returns `PolicyError` if the policy's limits are not positive.
    pub fn new(storage: S, policy: &RateLimitPolicy) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self {
            storage,
            limit: policy.max_requests_per_window,
            window: policy.window_size(),
        })
    }

    /// Register a request from `identity` at `now` and decide on it.
    ///
    /// Creates the counter on first sight and replaces an expired one before
    /// incrementing.
    pub fn check_and_increment(&self, identity: ClientIdentity, now: Instant) -> AdmissionDecision {
        let (limit, window) = (self.limit, self.window);
        self.storage.with_entry_mut(
            identity,
            || WindowCounter::new(now),
            |counter| counter.register(now, limit, window),
        )
    }

    /// Stored count for an identity, without creating or rolling it over.
    pub fn count(&self, identity: &ClientIdentity) -> Option<u64> {
        self.storage.with_entry(identity, |counter| counter.count())
    }

    /// Remove counters whose identity has been silent for at least `ttl`.
    ///
    /// Returns the number of counters removed.
    pub fn evict_idle(&self, now: Instant, ttl: Duration) -> usize {
        let mut evicted = 0;
        self.storage.retain(|_, counter| {
            let keep = !counter.is_idle(now, ttl);
            if !keep {
                evicted += 1;
            }
            keep
        });
        if evicted > 0 {
            debug!(evicted, remaining = self.storage.len(), "evicted idle counters");
        }
        evicted
    }

    /// Requests admitted per window.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Number of tracked identities.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if no identity is tracked.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Drop all counters.
    pub fn clear(&self) {
        self.storage.clear();
    }

    /// Get a reference to the storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::ShardedStorage;
    use std::sync::Arc;

    fn counter(
        limit: u64,
        window_secs: u64,
    ) -> FixedWindowCounter<Arc<ShardedStorage<ClientIdentity, WindowCounter>>> {
        let policy = RateLimitPolicy::new(limit, window_secs).unwrap();
        FixedWindowCounter::new(Arc::new(ShardedStorage::new()), &policy).unwrap()
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let policy = RateLimitPolicy {
            max_requests_per_window: 0,
            window_size_seconds: 60,
            enabled: true,
        };
        let result = FixedWindowCounter::new(Arc::new(ShardedStorage::new()), &policy);
        assert!(matches!(result, Err(PolicyError::ZeroMaxRequests)));
    }

    #[test]
    fn test_sixty_per_minute() {
        let counter = counter(60, 60);
        let id = ClientIdentity::new("203.0.113.5");
        let start = Instant::now();

        for i in 0..60 {
            let now = start + Duration::from_millis(i * 500);
            assert!(counter.check_and_increment(id.clone(), now).is_allow());
        }

        let d = counter.check_and_increment(id.clone(), start + Duration::from_secs(45));
        assert!(d.is_reject());
        assert_eq!(d.retry_after_secs, 15);
        assert_eq!(counter.count(&id), Some(61));
    }

    #[test]
    fn test_identities_are_independent() {
        let counter = counter(1, 60);
        let now = Instant::now();
        let a = ClientIdentity::new("a");
        let b = ClientIdentity::new("b");

        assert!(counter.check_and_increment(a.clone(), now).is_allow());
        assert!(counter.check_and_increment(b.clone(), now).is_allow());
        assert!(counter.check_and_increment(a, now).is_reject());
        assert!(counter.check_and_increment(b, now).is_reject());
        assert_eq!(counter.len(), 2);
    }

    #[test]
    fn test_rollover_resets_to_one() {
        let counter = counter(2, 10);
        let id = ClientIdentity::new("c");
        let start = Instant::now();

        for _ in 0..5 {
            counter.check_and_increment(id.clone(), start);
        }
        assert_eq!(counter.count(&id), Some(5));

        let d = counter.check_and_increment(id.clone(), start + Duration::from_secs(10));
        assert!(d.is_allow());
        assert_eq!(d.current_count, 1);
    }

    #[test]
    fn test_count_does_not_create() {
        let counter = counter(5, 10);
        assert_eq!(counter.count(&ClientIdentity::new("ghost")), None);
        assert!(counter.is_empty());
    }

    #[test]
    fn test_monotonic_within_window() {
        let counter = counter(1000, 60);
        let id = ClientIdentity::new("m");
        let start = Instant::now();

        let mut last = 0;
        for i in 0..200 {
            let d = counter.check_and_increment(id.clone(), start + Duration::from_millis(i * 10));
            assert!(d.current_count > last);
            last = d.current_count;
        }
    }

    #[test]
    fn test_evict_idle() {
        let counter = counter(5, 10);
        let start = Instant::now();
        counter.check_and_increment(ClientIdentity::new("old"), start);
        counter.check_and_increment(ClientIdentity::new("fresh"), start + Duration::from_secs(15));

        let evicted = counter.evict_idle(start + Duration::from_secs(20), Duration::from_secs(20));
        assert_eq!(evicted, 1);
        assert_eq!(counter.count(&ClientIdentity::new("old")), None);
        assert_eq!(counter.count(&ClientIdentity::new("fresh")), Some(1));
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        use std::thread;

        let counter = Arc::new(counter(1_000, 60));
        let id = ClientIdentity::new("203.0.113.5");
        let now = Instant::now();
        let mut handles = vec![];

        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            let id = id.clone();
            handles.push(thread::spawn(move || {
                let mut seen = Vec::with_capacity(50);
                for _ in 0..50 {
                    let d = counter.check_and_increment(id.clone(), now);
                    assert!(d.is_allow());
                    seen.push(d.current_count);
                }
                seen
            }));
        }

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();

        // Every request observed a distinct count: no two share a final value
        assert_eq!(all, (1..=500).collect::<Vec<u64>>());
        assert_eq!(counter.count(&id), Some(500));
    }
}
