//! Admission control in front of a toy request handler.
//!
//! Three clients share one gate with a limit of 3 requests per 10 second
//! window. Client C is idle until the window rolls over.

use http::{Request, Response, StatusCode};
use restgate::infrastructure::http::{apply_rate_limit_headers, too_many_requests, ClientAddr};
use restgate::{AdmissionGate, RateLimitPolicy};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

fn handle(
    gate: &AdmissionGate<restgate::CounterStorage>,
    req: &Request<()>,
    now: Instant,
) -> Response<String> {
    let decision = gate.admit(req, now);
    match decision.into_result() {
        Ok(decision) => {
            let mut resp = Response::new(format!("hello from {}", req.uri().path()));
            apply_rate_limit_headers(&decision, resp.headers_mut());
            resp
        }
        Err(exceeded) => too_many_requests(&exceeded),
    }
}

fn request(forwarded_for: Option<&str>, peer: &str) -> Request<()> {
    let mut builder = Request::builder().uri("/users");
    if let Some(value) = forwarded_for {
        builder = builder.header("X-Forwarded-For", value);
    }
    let mut req = builder.body(()).expect("static request is valid");
    let peer: SocketAddr = peer.parse().expect("static address is valid");
    req.extensions_mut().insert(ClientAddr(peer));
    req
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("restgate=debug"))
        .init();

    let gate = AdmissionGate::builder()
        .with_policy(RateLimitPolicy::new(3, 10).expect("positive limits"))
        .build()
        .expect("valid gate configuration");

    println!("=== Fixed Window Admission Example ===\n");
    println!("Policy: 3 requests per 10s window, per client\n");

    let start = Instant::now();
    let a = request(Some("203.0.113.5, 10.0.0.1"), "10.0.0.1:40000");
    let b = request(None, "198.51.100.7:51000");

    for i in 0..5 {
        let now = start + Duration::from_secs(i);
        let ra = handle(&gate, &a, now);
        let rb = handle(&gate, &b, now);
        println!("t={}s  client A -> {}  client B -> {}", i, ra.status(), rb.status());
    }

    let later = start + Duration::from_secs(10);
    let resp = handle(&gate, &a, later);
    println!("\nt=10s client A -> {} (new window)", resp.status());
    assert_eq!(resp.status(), StatusCode::OK);

    let snapshot = gate.metrics().snapshot();
    println!(
        "\nallowed: {}  rejected: {}  tracked clients: {}",
        snapshot.requests_allowed,
        snapshot.requests_rejected,
        gate.counter().len()
    );
}
