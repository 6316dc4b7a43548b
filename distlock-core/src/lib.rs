//! Store-backed distributed locks
//!
//! A mutual-exclusion lock whose state lives in a shared key-value store, so
//! independent processes can coordinate access to a named resource.
//!
//! ## Features
//!
//! - **Lease expiry** - every lock key carries a TTL, so a crashed holder
//!   cannot block the resource forever
//! - **Token-checked release** - release deletes the key only while it still
//!   holds this acquisition's token, in one atomic store operation
//! - **Bounded polling** - acquisition retries until a configurable timeout
//! - **Pluggable stores** - anything implementing [`LockStore`]
//!
//! This is a single-store lock. It gives no quorum guarantees and no lease
//! renewal; mutual exclusion is bounded by the store's consistency and the
//! lease duration.
//!
//! ## Quick Start
//!
//! ```rust
//! use distlock_core::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), LockError> {
//! let store: SharedStore = Arc::new(MemoryStore::new());
//! let manager = LockManager::new(LockConfig::default().timeout(Duration::from_secs(10)));
//!
//! let lock = manager.acquire("my_resource", &store).await?;
//! // critical section ...
//! lock.release().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod key;
pub mod lock;
pub mod manager;
pub mod store;
pub mod token;

pub use config::{
    DEFAULT_EXPIRE, DEFAULT_SLEEP_PER_TRY, DEFAULT_TIMEOUT, LockConfig, LockOption, with_expire,
    with_sleep_per_try, with_timeout,
};
pub use error::{LockError, LockResult, StoreError, StoreOperation, StoreResult};
pub use key::{DEFAULT_NAMESPACE, Namespace};
pub use lock::{Lock, ReleaseOutcome, release};
pub use manager::{LockManager, acquire};
pub use store::{LockStore, MemoryStore, SharedStore};
pub use token::LockToken;

pub use tokio_util::sync::CancellationToken;
