//! Lock key namespacing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default namespace prefix for lock keys.
pub const DEFAULT_NAMESPACE: &str = "distlock";

/// Prefix shared by every lock key an application creates.
///
/// Keys are `"<namespace>:<resource>"`. For a fixed namespace the mapping is
/// injective, so distinct resources never share a key. Applications sharing
/// one store keep apart by choosing distinct namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    /// Create a namespace with the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    /// Get the prefix.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive the store key for a resource.
    pub fn key_for(&self, resource: &str) -> String {
        format!("{}:{}", self.0, resource)
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Namespace {
    fn from(prefix: &str) -> Self {
        Self::new(prefix)
    }
}

impl From<String> for Namespace {
    fn from(prefix: String) -> Self {
        Self(prefix)
    }
}
