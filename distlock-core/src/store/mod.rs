//! Lock storage backends
//!
//! The lock protocol needs exactly two atomic capabilities from its store:
//!
//! - **set-if-absent with expiry** to take the lock
//! - **compare-and-delete** to release it only while still owned
//!
//! [`MemoryStore`] implements them in process (tests, single instance).
//! The `distlock-redis` crate provides the networked implementation.

mod memory;

pub use memory::MemoryStore;

use crate::error::StoreResult;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Shared handle to a lock store.
pub type SharedStore = Arc<dyn LockStore>;

/// Capability surface a backing store must provide.
///
/// Both operations must be atomic at the store. A "check then set" or
/// "get then delete" emulation reintroduces the races the protocol exists to
/// prevent.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Set `key` to `value` only if `key` is currently absent, expiring it
    /// after `ttl`. Returns whether the set happened.
    ///
    /// A zero `ttl` is passed through unvalidated; how it is interpreted is
    /// store specific.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool>;

    /// Delete `key` only if its current value equals `expected`.
    /// Returns whether the key was deleted.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> StoreResult<bool>;

    /// Get store type name for debugging
    fn store_type(&self) -> &'static str;
}
