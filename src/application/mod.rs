//! Application layer - orchestration of domain logic.
//!
//! - Identity resolution and fixed-window counting
//! - The admission gate and its metrics
//! - Spec validation and the generation pipeline
//! - Idle counter eviction (feature `async`)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters and outer collaborators implement. This keeps the application
//! layer independent from infrastructure details.

pub mod counter;
pub mod gate;
pub mod generation;
pub mod metrics;
pub mod ports;
pub mod resolver;
pub mod validator;

#[cfg(feature = "async")]
pub mod sweeper;
