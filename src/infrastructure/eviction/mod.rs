//! Capacity eviction adapters for the counter store.
//!
//! Adapters here implement the `EvictionPolicy` port of the application layer.

pub mod lru;

pub use lru::LruEviction;
