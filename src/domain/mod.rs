//! Domain layer - pure business logic with no external dependencies.
//!
//! This layer contains the core concepts and invariants of admission control
//! and service generation:
//! - Client identities (rate-limit subjects)
//! - Rate limit policies and fixed-window counters
//! - Admission decisions
//! - The service specification model
//!
//! All types in this layer are pure and easily testable.

pub mod decision;
pub mod identity;
pub mod policy;
pub mod spec;
pub mod window;
