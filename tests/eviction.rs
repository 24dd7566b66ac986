//! Integration tests for bounding the counter store.

use http::Request;
use restgate::{AdmissionGate, ClientIdentity, RateLimitPolicy};
use std::time::{Duration, Instant};

fn forwarded(client: &str) -> Request<()> {
    Request::builder()
        .header("X-Forwarded-For", client)
        .body(())
        .unwrap()
}

#[test]
fn test_capacity_evicts_least_recently_seen() {
    let gate = AdmissionGate::builder()
        .with_policy(RateLimitPolicy::new(100, 60).unwrap())
        .with_max_clients(5)
        .build()
        .unwrap();
    let start = Instant::now();

    for i in 0..10u64 {
        gate.admit(
            &forwarded(&format!("10.0.0.{}", i)),
            start + Duration::from_millis(i * 10),
        );
    }

    assert_eq!(gate.counter().len(), 5);
    assert_eq!(gate.metrics().counters_evicted(), 5);
    for i in 0..5 {
        assert_eq!(
            gate.counter().count(&ClientIdentity::new(format!("10.0.0.{}", i))),
            None
        );
    }
    for i in 5..10 {
        assert_eq!(
            gate.counter().count(&ClientIdentity::new(format!("10.0.0.{}", i))),
            Some(1)
        );
    }
}

#[test]
fn test_active_client_survives_capacity_eviction() {
    let gate = AdmissionGate::builder()
        .with_policy(RateLimitPolicy::new(100, 60).unwrap())
        .with_max_clients(2)
        .build()
        .unwrap();
    let start = Instant::now();
    let busy = forwarded("203.0.113.5");

    gate.admit(&busy, start);
    for i in 1..6u64 {
        let now = start + Duration::from_secs(i);
        gate.admit(&forwarded(&format!("198.51.100.{}", i)), now);
        // The busy client keeps refreshing its last-seen time
        gate.admit(&busy, now + Duration::from_millis(1));
    }

    assert_eq!(
        gate.counter().count(&ClientIdentity::new("203.0.113.5")),
        Some(6)
    );
}

#[test]
fn test_unlimited_clients_never_evict() {
    let gate = AdmissionGate::builder()
        .with_unlimited_clients()
        .build()
        .unwrap();
    let now = Instant::now();

    for i in 0..20_000u32 {
        gate.admit(&forwarded(&format!("10.{}.{}.{}", i >> 16, (i >> 8) & 0xff, i & 0xff)), now);
    }

    assert_eq!(gate.counter().len(), 20_000);
    assert_eq!(gate.metrics().counters_evicted(), 0);
}

#[test]
fn test_idle_eviction_keeps_recent_clients() {
    let gate = AdmissionGate::builder()
        .with_policy(RateLimitPolicy::new(10, 30).unwrap())
        .build()
        .unwrap();
    let start = Instant::now();

    gate.admit(&forwarded("idle"), start);
    gate.admit(&forwarded("recent"), start + Duration::from_secs(50));

    let ttl = gate.counter().window() * 2;
    let evicted = gate.counter().evict_idle(start + Duration::from_secs(60), ttl);

    assert_eq!(evicted, 1);
    assert_eq!(gate.counter().count(&ClientIdentity::new("idle")), None);
    assert_eq!(gate.counter().count(&ClientIdentity::new("recent")), Some(1));

    // An evicted client starts over with a fresh window
    let d = gate.admit(&forwarded("idle"), start + Duration::from_secs(61));
    assert_eq!(d.current_count, 1);
}
