//! Infrastructure layer - external adapters and integrations.
//!
//! This layer provides adapters for:
//! - Clock abstraction (system time vs mock)
//! - Storage implementations (sharded maps) and capacity eviction
//! - Gate construction and YAML configuration
//! - The `http` crate request and response types

pub mod builder;
pub mod clock;
pub mod config;
pub mod eviction;
pub mod http;
pub mod storage;

/// Mock implementations for testing.
///
/// Only available with the `test-helpers` feature or during test builds.
///
/// ```toml
/// [dev-dependencies]
/// restgate = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
