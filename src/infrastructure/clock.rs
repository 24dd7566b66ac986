//! Clock adapters.
//!
//! [`SystemClock`] backs [`AdmissionGate::admit_now`](crate::AdmissionGate::admit_now)
//! and the eviction sweeper in production. Tests drive time explicitly with
//! `MockClock` from `crate::infrastructure::mocks`, available in test builds or
//! with the `test-helpers` feature.

use crate::application::ports::Clock;
use std::time::Instant;

/// Monotonic wall time from `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let t1 = clock.now();
        std::thread::sleep(Duration::from_millis(5));
        assert!(clock.now() > t1);
    }
}
