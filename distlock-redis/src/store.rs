//! Redis lock store
//!
//! Takes a lock with `SET key token NX PX ttl` and releases it with a Lua
//! script, so both operations are atomic on the server.

use async_trait::async_trait;
use distlock_core::{LockStore, StoreError, StoreResult};
use redis::aio::ConnectionManager;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, trace};

use crate::{RedisConfig, RedisError, Result};

/// Deletes KEYS[1] only if it holds ARGV[1].
const RELEASE_SCRIPT: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    return redis.call("del", KEYS[1])
else
    return 0
end
"#;

/// Redis-backed lock store
///
/// Cheap to clone; clones share the underlying multiplexed connection.
#[derive(Clone)]
pub struct RedisLockStore {
    conn: ConnectionManager,
    release_script: redis::Script,
    command_timeout: Duration,
}

impl RedisLockStore {
    /// Connect using a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the server cannot be reached
    /// within the connection timeout.
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        debug!(url = %config.url, "Connecting to Redis for locks");

        let client = redis::Client::open(config.connection_url())
            .map_err(|e| RedisError::Config(e.to_string()))?;

        let conn = tokio::time::timeout(config.connection_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| RedisError::Timeout)?
            .map_err(|e| RedisError::Connection(e.to_string()))?;

        let store = Self::from_connection(conn).with_command_timeout(config.command_timeout);

        if let Some(name) = &config.connection_name {
            let mut conn = store.conn.clone();
            let _: () = store
                .bounded(redis::cmd("CLIENT").arg("SETNAME").arg(name).query_async(&mut conn))
                .await
                .map_err(|e| RedisError::Connection(format!("CLIENT SETNAME failed: {}", e)))?;
        }

        info!(url = %config.url, name = ?config.connection_name, "Redis lock store connected");

        Ok(store)
    }

    /// Connect to a URL with default settings.
    pub async fn from_url(url: &str) -> Result<Self> {
        Self::new(&RedisConfig::new(url)).await
    }

    /// Wrap an existing connection manager.
    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self {
            conn,
            release_script: redis::Script::new(RELEASE_SCRIPT),
            command_timeout: RedisConfig::default().command_timeout,
        }
    }

    /// Set the per-operation timeout.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Check if the connection is healthy.
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = self
            .bounded(redis::cmd("PING").query_async(&mut conn))
            .await?;
        Ok(())
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.command_timeout, op).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(RedisError::Timeout),
        }
    }
}

/// PX argument for a TTL. `None` for a zero TTL (no expiry); sub-millisecond
/// TTLs round up to 1ms since Redis rejects `PX 0`.
fn px_millis(ttl: Duration) -> Option<u64> {
    if ttl.is_zero() {
        None
    } else {
        Some((ttl.as_millis() as u64).max(1))
    }
}

#[async_trait]
impl LockStore for RedisLockStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("NX");
        if let Some(ms) = px_millis(ttl) {
            cmd.arg("PX").arg(ms);
        }

        let mut conn = self.conn.clone();
        let reply: Option<String> = self
            .bounded(cmd.query_async(&mut conn))
            .await
            .map_err(StoreError::from)?;

        let set = reply.is_some();
        trace!(key = %key, ttl = ?ttl, set, "Redis SET NX");
        Ok(set)
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let mut invocation = self.release_script.key(key);
        invocation.arg(expected);

        let deleted: i64 = self
            .bounded(invocation.invoke_async(&mut conn))
            .await
            .map_err(StoreError::from)?;

        trace!(key = %key, deleted, "Redis compare-and-delete");
        release_reply(deleted).map_err(StoreError::from)
    }

    fn store_type(&self) -> &'static str {
        "redis"
    }
}

/// The release script replies with the DEL count, or 0 on a token mismatch.
fn release_reply(deleted: i64) -> Result<bool> {
    match deleted {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RedisError::Command(format!("unexpected release reply: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_px_millis() {
        assert_eq!(px_millis(Duration::ZERO), None);
        assert_eq!(px_millis(Duration::from_micros(10)), Some(1));
        assert_eq!(px_millis(Duration::from_millis(200)), Some(200));
        assert_eq!(px_millis(Duration::from_secs(30)), Some(30_000));
    }

    #[test]
    fn test_release_reply() {
        assert!(!release_reply(0).unwrap());
        assert!(release_reply(1).unwrap());
        assert!(matches!(release_reply(2), Err(RedisError::Command(_))));
        assert!(matches!(release_reply(-1), Err(RedisError::Command(_))));
    }

    #[test]
    fn test_release_script_checks_token() {
        assert!(RELEASE_SCRIPT.contains(r#"redis.call("get", KEYS[1]) == ARGV[1]"#));
        assert!(RELEASE_SCRIPT.contains(r#"redis.call("del", KEYS[1])"#));
    }
}
