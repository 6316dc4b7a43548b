//! Ownership tokens.

use std::fmt;
use uuid::Uuid;

/// Proof of ownership stored as the lock key's value.
///
/// A fresh random (v4) UUID is generated for every acquisition, so no two
/// live acquisitions share a token, even for the same resource in the same
/// process.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockToken(String);

impl LockToken {
    /// Generate a fresh token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing token value, e.g. one persisted by another process.
    pub fn from_string(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the token as stored in the backing store.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tokens_are_unique() {
        let tokens: HashSet<LockToken> = (0..1000).map(|_| LockToken::generate()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn test_token_is_hyphenated_uuid() {
        let token = LockToken::generate();
        assert_eq!(token.as_str().len(), 36);
        assert!(Uuid::parse_str(token.as_str()).is_ok());
    }
}
