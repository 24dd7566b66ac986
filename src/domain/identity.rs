//! Client identities used as rate-limit keys.
//!
//! An identity is *not* an authenticated principal. It is whatever string the
//! resolver derived from the request, typically the client network address.

use std::fmt;

/// Opaque key identifying a rate-limit subject.
///
/// Identities are derived fresh for every request and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// Identity shared by every request from which nothing usable could be derived.
    ///
    /// All such requests draw from one quota instead of bypassing limiting.
    pub const UNRESOLVED: &'static str = "unresolved";

    /// Create an identity from a raw key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The sentinel identity.
    pub fn unresolved() -> Self {
        Self(Self::UNRESOLVED.to_string())
    }

    /// Check whether this is the sentinel identity.
    pub fn is_unresolved(&self) -> bool {
        self.0 == Self::UNRESOLVED
    }

    /// Borrow the raw key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientIdentity {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ClientIdentity {
    fn from(key: String) -> Self {
        Self(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel() {
        let id = ClientIdentity::unresolved();
        assert!(id.is_unresolved());
        assert_eq!(id.as_str(), "unresolved");
        assert!(!ClientIdentity::new("10.0.0.1").is_unresolved());
    }

    #[test]
    fn test_display_is_raw_key() {
        let id = ClientIdentity::from("203.0.113.5");
        assert_eq!(format!("{}", id), "203.0.113.5");
    }
}
