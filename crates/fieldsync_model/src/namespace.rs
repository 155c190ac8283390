//! Logical grouping of entity kinds.

use serde::{Deserialize, Serialize};

/// A logical grouping of entity kinds belonging to one remote application
/// area, e.g. `field_service`.
///
/// One sync worker owns one namespace; different namespaces share no mutable
/// state and may sync concurrently.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    /// Creates a namespace from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The namespace for the field-service domain.
    pub fn field_service() -> Self {
        Self::new("field_service")
    }

    /// Returns the namespace name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::field_service()
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_namespace() {
        assert_eq!(Namespace::default().as_str(), "field_service");
        assert_eq!(Namespace::default(), Namespace::field_service());
    }

    #[test]
    fn display_roundtrip() {
        let ns = Namespace::new("inventory");
        assert_eq!(ns.to_string(), "inventory");
    }
}
