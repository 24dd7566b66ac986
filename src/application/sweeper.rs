//! Background eviction of idle counters.
//!
//! Without eviction the counter store grows with every identity ever seen. The
//! sweeper periodically removes counters that have been silent for
//! `idle_multiplier` windows.

use crate::application::counter::FixedWindowCounter;
use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, Storage};
use crate::domain::{identity::ClientIdentity, window::WindowCounter};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, trace};

/// Error returned when sweeper configuration validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweeperConfigError {
    /// Sweep interval must be greater than zero
    ZeroInterval,
    /// Idle multiplier must be greater than zero
    ZeroIdleMultiplier,
}

impl fmt::Display for SweeperConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweeperConfigError::ZeroInterval => write!(f, "sweep interval must be greater than 0"),
            SweeperConfigError::ZeroIdleMultiplier => {
                write!(f, "idle multiplier must be greater than 0")
            }
        }
    }
}

impl std::error::Error for SweeperConfigError {}

/// Error returned when the sweeper task does not stop cleanly.
#[derive(Debug)]
pub enum ShutdownError {
    /// The task panicked
    Panicked,
    /// The task was cancelled before it could observe the shutdown signal
    Cancelled,
}

impl fmt::Display for ShutdownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownError::Panicked => write!(f, "sweeper task panicked"),
            ShutdownError::Cancelled => write!(f, "sweeper task was cancelled"),
        }
    }
}

impl std::error::Error for ShutdownError {}

/// Configuration for idle counter eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweeperConfig {
    /// How often to sweep
    pub interval: Duration,
    /// A counter is idle after this many windows without a request
    pub idle_multiplier: u32,
}

impl SweeperConfig {
    /// Windows of silence before a counter is evicted, unless configured.
    pub const DEFAULT_IDLE_MULTIPLIER: u32 = 2;
    /// Time between sweeps, unless configured.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

    /// Create a sweeper config.
    ///
    /// # Errors
    /// Returns `SweeperConfigError` if `interval` or `idle_multiplier` is zero.
    pub fn new(interval: Duration, idle_multiplier: u32) -> Result<Self, SweeperConfigError> {
        if interval.is_zero() {
            return Err(SweeperConfigError::ZeroInterval);
        }
        if idle_multiplier == 0 {
            return Err(SweeperConfigError::ZeroIdleMultiplier);
        }
        Ok(Self {
            interval,
            idle_multiplier,
        })
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            idle_multiplier: Self::DEFAULT_IDLE_MULTIPLIER,
        }
    }
}

/// Periodically evicts idle counters from a counter store.
pub struct EvictionSweeper<S>
where
    S: Storage<ClientIdentity, WindowCounter> + Clone,
{
    counter: FixedWindowCounter<S>,
    clock: Arc<dyn Clock>,
    config: SweeperConfig,
    metrics: Option<Metrics>,
}

impl<S> EvictionSweeper<S>
where
    S: Storage<ClientIdentity, WindowCounter> + Clone,
{
    /// Create a sweeper over a counter store.
    ///
    /// The counter is cloned from the gate's so both share the same storage.
    pub fn new(
        counter: FixedWindowCounter<S>,
        clock: Arc<dyn Clock>,
        config: SweeperConfig,
    ) -> Self {
        Self {
            counter,
            clock,
            config,
            metrics: None,
        }
    }

    /// Record evictions in `metrics`.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Idle threshold: `idle_multiplier` windows.
    pub fn idle_ttl(&self) -> Duration {
        self.counter.window().saturating_mul(self.config.idle_multiplier)
    }

    /// Run a single sweep now. Returns the number of counters removed.
    pub fn sweep_once(&self) -> usize {
        let evicted = self.counter.evict_idle(self.clock.now(), self.idle_ttl());
        if let Some(metrics) = &self.metrics {
            metrics.record_evictions(evicted as u64);
        }
        evicted
    }

    /// Get the sweeper configuration.
    pub fn config(&self) -> &SweeperConfig {
        &self.config
    }

    /// Start sweeping in a background task.
    ///
    /// The task runs until [`SweeperHandle::shutdown`] is called. Dropping the
    /// handle without shutting down leaves the task running.
    pub fn start(self) -> SweeperHandle
    where
        S: Send + Sync + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = interval(self.config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = self.sweep_once();
                        trace!(evicted, tracked = self.counter.len(), "sweep finished");
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            debug!("eviction sweeper stopping");
                            break;
                        }
                    }
                }
            }
        });

        SweeperHandle {
            shutdown_tx,
            task: Some(task),
        }
    }
}

impl<S> fmt::Debug for EvictionSweeper<S>
where
    S: Storage<ClientIdentity, WindowCounter> + Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvictionSweeper")
            .field("counter", &self.counter)
            .field("config", &self.config)
            .finish()
    }
}

/// Handle to a running sweeper task.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Signal the task to stop and wait for it.
    ///
    /// # Errors
    /// Returns `ShutdownError` if the task panicked or was cancelled.
    pub async fn shutdown(mut self) -> Result<(), ShutdownError> {
        // The receiver lives in the task; a send error only means it already exited.
        let _ = self.shutdown_tx.send(true);

        match self.task.take() {
            Some(task) => task.await.map_err(|e| {
                if e.is_panic() {
                    ShutdownError::Panicked
                } else {
                    ShutdownError::Cancelled
                }
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::policy::RateLimitPolicy;
    use crate::infrastructure::mocks::MockClock;
    use crate::infrastructure::storage::ShardedStorage;
    use std::time::Instant;

    type TestCounter = FixedWindowCounter<Arc<ShardedStorage<ClientIdentity, WindowCounter>>>;

    fn counter(window_secs: u64) -> TestCounter {
        let policy = RateLimitPolicy::new(10, window_secs).unwrap();
        FixedWindowCounter::new(Arc::new(ShardedStorage::new()), &policy).unwrap()
    }

    #[test]
    fn test_config_rejects_zero() {
        assert_eq!(
            SweeperConfig::new(Duration::ZERO, 2),
            Err(SweeperConfigError::ZeroInterval)
        );
        assert_eq!(
            SweeperConfig::new(Duration::from_secs(1), 0),
            Err(SweeperConfigError::ZeroIdleMultiplier)
        );
        let config = SweeperConfig::new(Duration::from_secs(5), 3).unwrap();
        assert_eq!(config.idle_multiplier, 3);
    }

    #[test]
    fn test_sweep_once_uses_idle_multiplier() {
        let start = Instant::now();
        let clock = Arc::new(MockClock::new(start));
        let counter = counter(10);
        let metrics = Metrics::new();
        let sweeper = EvictionSweeper::new(counter.clone(), clock.clone(), SweeperConfig::default())
            .with_metrics(metrics.clone());
        assert_eq!(sweeper.idle_ttl(), Duration::from_secs(20));

        counter.check_and_increment(ClientIdentity::new("a"), start);
        clock.advance(Duration::from_secs(19));
        assert_eq!(sweeper.sweep_once(), 0);

        clock.advance(Duration::from_secs(1));
        assert_eq!(sweeper.sweep_once(), 1);
        assert!(counter.is_empty());
        assert_eq!(metrics.counters_evicted(), 1);
    }

    #[tokio::test]
    async fn test_background_sweep_and_shutdown() {
        let start = Instant::now();
        let clock = Arc::new(MockClock::new(start));
        let counter = counter(1);
        counter.check_and_increment(ClientIdentity::new("idle"), start);
        clock.advance(Duration::from_secs(5));

        let config = SweeperConfig::new(Duration::from_millis(20), 2).unwrap();
        let handle = EvictionSweeper::new(counter.clone(), clock, config).start();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(counter.is_empty());
        assert!(!handle.is_finished());

        handle.shutdown().await.expect("shutdown failed");
    }
}
