//! # restgate
//!
//! Admission control and service-spec validation for services generated from
//! REST endpoint descriptions.
//!
//! The crate has two independent halves:
//!
//! - **Admission control**: every inbound request passes through an
//!   [`AdmissionGate`] before business logic runs. The gate derives a client
//!   identity from the request and counts it against a fixed-window quota.
//! - **Spec validation and generation**: an endpoint analyzer produces a
//!   [`ServiceSpec`], the [`SpecValidator`] checks it, and only a
//!   [`ValidatedSpec`] can reach a renderer.
//!
//! ## Quick Start
//!
//! ```rust
//! use restgate::{AdmissionGate, RateLimitPolicy};
//! use restgate::infrastructure::http::{too_many_requests, ClientAddr};
//! use std::net::SocketAddr;
//!
//! let gate = AdmissionGate::builder()
//!     .with_policy(RateLimitPolicy::new(2, 60).unwrap())
//!     .build()
//!     .unwrap();
//!
//! let peer: SocketAddr = "192.0.2.1:50000".parse().unwrap();
//! let mut request = http::Request::builder().uri("/users").body(()).unwrap();
//! request.extensions_mut().insert(ClientAddr(peer));
//!
//! assert!(gate.admit_now(&request).is_allow());
//! assert!(gate.admit_now(&request).is_allow());
//!
//! // The third request in the same window is rejected
//! let decision = gate.admit_now(&request);
//! let response = decision.into_result().map_err(|e| too_many_requests(&e));
//! assert_eq!(response.unwrap_err().status(), http::StatusCode::TOO_MANY_REQUESTS);
//! ```
//!
//! ## Fixed Windows
//!
//! Each identity owns a counter `{count, window_start}`. A request at `now`:
//!
//! 1. starts a fresh window if none exists or `now >= window_start + W`,
//! 2. increments the count,
//! 3. is rejected when the count exceeds `L`, with
//!    `retry_after = ceil(window_start + W - now)` seconds.
//!
//! Rejected requests still count. A client can send up to `2L` requests across
//! a window boundary (`L` at the end of one window and `L` at the start of the
//! next); this is inherent to fixed windows.
//!
//! ## Client Identity
//!
//! The first comma-separated entry of `X-Forwarded-For` (configurable) is the
//! identity; without it the peer IP address is used. The header is trusted as
//! sent, so clients that can reach the service directly can choose their own
//! identity. Deploy behind a proxy that overwrites the header.
//!
//! Requests with no usable identity share one quota under the `"unresolved"`
//! identity.
//!
//! ## Memory Management
//!
//! The counter store keeps one small entry per identity. Two mechanisms bound
//! it:
//!
//! - **Capacity**: at most 10,000 identities by default; a new identity beyond
//!   that evicts the least recently seen one
//!   ([`AdmissionGateBuilder::with_max_clients`]).
//! - **Idle eviction**: with the `async` feature, [`AdmissionGate::start_sweeper`]
//!   removes counters silent for `idle_multiplier` windows (default 2).
//!
//! ## Scaling
//!
//! Counter state lives in process. Running `N` instances behind a load
//! balancer multiplies the effective limit by up to `N`.
//!
//! ## Spec Validation
//!
//! ```rust
//! use restgate::{HttpMethod, RouteSpec, ServiceSpec, SpecValidator, Violation};
//!
//! let spec = ServiceSpec::new(
//!     "users",
//!     "com.example.users",
//!     vec![
//!         RouteSpec::new(HttpMethod::Get, "/users"),
//!         RouteSpec::new(HttpMethod::Get, "/users"),
//!     ],
//! );
//!
//! let result = SpecValidator::new().validate(&spec);
//! assert_eq!(
//!     result.violations(),
//!     &[Violation::DuplicateRoute(HttpMethod::Get, "/users".to_string())]
//! );
//! ```
//!
//! ## Features
//!
//! - `async` (default): background eviction sweeper on tokio
//! - `test-helpers`: exposes `infrastructure::mocks` outside this crate's tests

// Domain layer - pure business logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    decision::{AdmissionDecision, Limit, RateLimitExceeded},
    identity::ClientIdentity,
    policy::{PolicyError, RateLimitPolicy},
    spec::{
        CredentialConfig, HttpMethod, ObservabilityFlags, RouteSpec, SecurityMode, ServiceSpec,
        SpecParseError,
    },
    window::WindowCounter,
};

pub use application::{
    counter::FixedWindowCounter,
    gate::AdmissionGate,
    generation::{GenerationError, GenerationPipeline, GenerationReport},
    metrics::{Metrics, MetricsSnapshot},
    ports::{
        AnalysisError, Clock, EndpointAnalyzer, EndpointReference, EvictionCandidate,
        EvictionPolicy, FileSet, InboundRequest, ProjectRenderer, RenderError, Storage,
    },
    resolver::ClientKeyResolver,
    validator::{SpecValidationError, SpecValidator, ValidatedSpec, ValidationResult, Violation},
};

#[cfg(feature = "async")]
pub use application::sweeper::{
    EvictionSweeper, ShutdownError, SweeperConfig, SweeperConfigError, SweeperHandle,
};

pub use infrastructure::{
    builder::{AdmissionGateBuilder, BuildError, CounterStorage},
    clock::SystemClock,
    config::{AdmissionConfig, ConfigError},
    eviction::LruEviction,
    storage::ShardedStorage,
};
