// distlock - Distributed mutual-exclusion locks over a shared key-value store
//
// A lock key holds a per-acquisition token with a lease TTL. Acquisition polls
// an atomic set-if-absent; release runs an atomic compare-and-delete so a
// stale holder can never remove someone else's lock.

// Re-export core functionality
pub use distlock_core::*;

// Re-export optional crates
#[cfg(feature = "redis")]
pub use distlock_redis;

#[cfg(feature = "redis")]
pub use distlock_redis::{RedisConfig, RedisConfigBuilder, RedisLockStore};

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        CancellationToken, Lock, LockConfig, LockError, LockManager, LockOption, LockResult,
        LockStore, MemoryStore, ReleaseOutcome, SharedStore, StoreError, acquire, release,
        with_expire, with_sleep_per_try, with_timeout,
    };

    #[cfg(feature = "redis")]
    pub use crate::{RedisConfig, RedisLockStore};
}
