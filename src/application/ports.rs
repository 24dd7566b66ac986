//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports, and the outer
//! collaborators (serving layer, endpoint analyzer, template renderer) are
//! reached only through them.

use crate::domain::spec::ServiceSpec;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Instant;

/// Candidate entry for eviction consideration.
///
/// Values are cloned to avoid holding concurrent map guards while a policy
/// makes its choice.
pub struct EvictionCandidate<K, V> {
    /// The key of the entry
    pub key: K,
    /// The value of the entry (cloned)
    pub value: V,
    /// Last access time for LRU-based strategies
    pub last_access: Instant,
}

/// Values that record when they were last touched.
pub trait Timestamped {
    /// Last time the value was read or written by a request.
    fn last_access(&self) -> Instant;
}

/// Port for capacity eviction decisions.
///
/// The storage layer delegates the choice of victim to a pluggable policy
/// when it is about to insert a new key.
pub trait EvictionPolicy<K, V>: Send + Sync + Debug
where
    K: Clone,
    V: Clone,
{
    /// Select a victim from the given candidates, or None to skip eviction.
    fn select_victim(&self, candidates: &[EvictionCandidate<K, V>]) -> Option<K>;

    /// Check if inserting one more entry requires an eviction first.
    fn should_evict(&self, current_entries: usize) -> bool;
}

/// Port for obtaining current time.
///
/// Infrastructure provides `SystemClock`; tests use `MockClock`.
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;
}

/// Port for concurrent key-value storage.
///
/// Implementations must serialize all accessor calls for the same key, so that
/// a read-modify-write inside [`Storage::with_entry_mut`] is linearizable per key
/// and mutually exclusive with removal of that key.
pub trait Storage<K, V>: Send + Sync + Debug
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Send + Sync,
{
    /// Access an entry with mutable access, creating it if necessary.
    ///
    /// # Arguments
    /// * `key` - The key to look up
    /// * `factory` - Function to create a new value if the key doesn't exist
    /// * `accessor` - Function that gets mutable access to the value
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R;

    /// Read an existing entry without creating it.
    fn with_entry<F, R>(&self, key: &K, accessor: F) -> Option<R>
    where
        F: FnOnce(&V) -> R;

    /// Get the number of entries in the storage.
    fn len(&self) -> usize;

    /// Check if the storage is empty.
    fn is_empty(&self) -> bool;

    /// Clear all entries from the storage.
    fn clear(&self);

    /// Iterate over all entries, providing access to both key and value.
    fn for_each<F>(&self, f: F)
    where
        F: FnMut(&K, &V);

    /// Remove entries for which the predicate returns false.
    fn retain<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V) -> bool;
}

/// Port for the inbound request seen by the admission gate.
///
/// The serving layer adapts its own request type to this trait.
pub trait InboundRequest {
    /// Value of a header, looked up case-insensitively.
    fn header(&self, name: &str) -> Option<&str>;

    /// Address of the directly connected peer, if known.
    fn peer_addr(&self) -> Option<IpAddr>;
}

impl<T: InboundRequest + ?Sized> InboundRequest for &T {
    fn header(&self, name: &str) -> Option<&str> {
        (**self).header(name)
    }

    fn peer_addr(&self) -> Option<IpAddr> {
        (**self).peer_addr()
    }
}

/// Reference to a REST endpoint plus any auxiliary documentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointReference {
    pub url: String,
    pub documentation: Option<String>,
}

impl EndpointReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            documentation: None,
        }
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }
}

/// Error reported by an endpoint analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisError {
    pub message: String,
}

impl AnalysisError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "endpoint analysis failed: {}", self.message)
    }
}

impl std::error::Error for AnalysisError {}

/// Port for the endpoint analyzer.
///
/// The analyzer is a black box (typically backed by a hosted language model).
/// It either returns a spec-shaped value or fails explicitly; nothing else is
/// assumed about how the spec is derived.
pub trait EndpointAnalyzer: Send + Sync {
    fn analyze(&self, endpoint: &EndpointReference) -> Result<ServiceSpec, AnalysisError>;
}

/// Rendered project files keyed by relative path.
pub type FileSet = BTreeMap<PathBuf, String>;

/// Error reported by a project renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderError {
    pub message: String,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "project rendering failed: {}", self.message)
    }
}

impl std::error::Error for RenderError {}

/// Port for the template renderer.
///
/// Rendering is a pure function of a validated spec; the type makes it
/// impossible to hand an unvalidated spec to a renderer.
pub trait ProjectRenderer: Send + Sync {
    fn render(
        &self,
        spec: &crate::application::validator::ValidatedSpec,
    ) -> Result<FileSet, RenderError>;
}
