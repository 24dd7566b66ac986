//! Fixed-window counter state machine.
//!
//! Each identity has at most one [`WindowCounter`]. A counter is either in an
//! active window (`now < window_start + W`) or expired; an expired counter is
//! replaced by a fresh one before it is incremented again.
//!
//! Fixed windows allow a burst of up to `2L` requests across a boundary
//! (`L` at the end of one window, `L` at the start of the next). That is the
//! documented behavior of generated services and must stay as is.

use crate::domain::decision::{AdmissionDecision, Limit};
use std::time::{Duration, Instant};

/// Per-identity request counter for one fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCounter {
    count: u64,
    window_start: Instant,
    last_seen: Instant,
}

impl WindowCounter {
    /// Create an empty counter whose window opens at `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            count: 0,
            window_start: now,
            last_seen: now,
        }
    }

    /// Requests counted in the current window, rejected ones included.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// When the current window opened.
    pub fn window_start(&self) -> Instant {
        self.window_start
    }

    /// When this identity was last seen.
    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }

    /// Check whether the window has closed at `now`.
    ///
    /// A request exactly at `window_start + window` belongs to the next window.
    pub fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.window_start) >= window
    }

    /// Check whether the identity has been silent for at least `ttl`.
    pub fn is_idle(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) >= ttl
    }

    /// Register one request and decide whether it is admitted.
    ///
    /// Rejected requests still advance the count; the next rollover clears it.
    pub fn register(&mut self, now: Instant, limit: u64, window: Duration) -> AdmissionDecision {
        if self.is_expired(now, window) {
            *self = Self::new(now);
        }

        self.count = self.count.saturating_add(1);
        self.last_seen = self.last_seen.max(now);

        if self.count > limit {
            let elapsed = now.saturating_duration_since(self.window_start);
            let retry_after = ceil_secs(window.saturating_sub(elapsed));
            AdmissionDecision::reject(self.count, limit, retry_after)
        } else {
            AdmissionDecision::allow(self.count, Limit::Bounded(limit))
        }
    }
}

fn ceil_secs(d: Duration) -> u64 {
    if d.subsec_nanos() > 0 {
        d.as_secs().saturating_add(1)
    } else {
        d.as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: Duration = Duration::from_secs(60);

    #[test]
    fn test_counts_up_to_limit_then_rejects() {
        let start = Instant::now();
        let mut counter = WindowCounter::new(start);

        for i in 1..=3 {
            let d = counter.register(start, 3, W);
            assert!(d.is_allow());
            assert_eq!(d.current_count, i);
        }

        let d = counter.register(start + Duration::from_secs(20), 3, W);
        assert!(d.is_reject());
        assert_eq!(d.current_count, 4);
        assert_eq!(d.retry_after_secs, 40);
    }

    #[test]
    fn test_rejections_keep_counting() {
        let start = Instant::now();
        let mut counter = WindowCounter::new(start);
        counter.register(start, 1, W);
        counter.register(start, 1, W);
        counter.register(start, 1, W);
        assert_eq!(counter.count(), 3);
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let start = Instant::now();
        let mut counter = WindowCounter::new(start);
        counter.register(start, 1, W);

        let d = counter.register(start + Duration::from_millis(59_001), 1, W);
        assert!(d.is_reject());
        assert_eq!(d.retry_after_secs, 1);

        let d = counter.register(start + Duration::from_millis(500), 1, W);
        assert_eq!(d.retry_after_secs, 60);
    }

    #[test]
    fn test_huge_window_rejects_without_overflow() {
        let start = Instant::now();
        let window = Duration::from_secs(u64::MAX);
        let mut counter = WindowCounter::new(start);
        assert!(counter.register(start, 1, window).is_allow());

        let d = counter.register(start + Duration::from_secs(10), 1, window);
        assert!(d.is_reject());
        assert_eq!(d.current_count, 2);
        assert_eq!(d.retry_after_secs, u64::MAX - 10);
    }

    #[test]
    fn test_rollover_exactly_at_boundary() {
        let start = Instant::now();
        let mut counter = WindowCounter::new(start);
        counter.register(start, 1, W);
        assert!(counter.register(start, 1, W).is_reject());

        let boundary = start + W;
        let d = counter.register(boundary, 1, W);
        assert!(d.is_allow());
        assert_eq!(d.current_count, 1);
        assert_eq!(counter.window_start(), boundary);
    }

    #[test]
    fn test_burst_across_boundary_is_preserved() {
        let start = Instant::now();
        let mut counter = WindowCounter::new(start);
        let late = start + Duration::from_millis(59_999);
        let early_next = start + W;

        let mut allowed = 0;
        for _ in 0..5 {
            if counter.register(late, 5, W).is_allow() {
                allowed += 1;
            }
        }
        for _ in 0..5 {
            if counter.register(early_next, 5, W).is_allow() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 10);
    }

    #[test]
    fn test_earlier_timestamp_stays_in_window() {
        let start = Instant::now() + Duration::from_secs(5);
        let mut counter = WindowCounter::new(start);
        let d = counter.register(start - Duration::from_secs(1), 5, W);
        assert!(d.is_allow());
        assert_eq!(counter.window_start(), start);
        assert_eq!(counter.last_seen(), start);
    }

    #[test]
    fn test_idle() {
        let start = Instant::now();
        let mut counter = WindowCounter::new(start);
        counter.register(start + Duration::from_secs(10), 5, W);

        assert!(!counter.is_idle(start + Duration::from_secs(100), 2 * W));
        assert!(counter.is_idle(start + Duration::from_secs(130), 2 * W));
    }
}
