//! # distlock Redis
//!
//! Redis backend for `distlock-core` locks.
//!
//! ## Features
//!
//! - **Atomic acquire**: `SET key token NX PX ttl`
//! - **Atomic release**: server-side Lua compare-and-delete
//! - **Reconnecting connection**: built on `redis::aio::ConnectionManager`
//! - **Env config**: `RedisConfig::from_env()`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use distlock_core::{LockManager, SharedStore, with_timeout};
//! use distlock_redis::{RedisConfig, RedisLockStore};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RedisConfig::from_env().build();
//!     let store: SharedStore = Arc::new(RedisLockStore::new(&config).await?);
//!
//!     let lock = LockManager::default()
//!         .acquire_with("my_resource", &store, [with_timeout(Duration::from_secs(10))])
//!         .await?;
//!
//!     // Critical section
//!
//!     lock.release().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod store;

pub use config::{RedisConfig, RedisConfigBuilder};
pub use error::{RedisError, Result};
pub use store::RedisLockStore;

// Re-export redis crate for convenience
pub use redis;
