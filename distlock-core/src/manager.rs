//! Lock acquisition by bounded polling

use std::time::Duration;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{LockConfig, LockOption};
use crate::error::{LockError, LockResult, StoreOperation};
use crate::lock::Lock;
use crate::store::SharedStore;
use crate::token::LockToken;

/// Runs the acquisition protocol against a store.
///
/// The manager holds only its configuration; all coordination happens in the
/// store through its atomic set-if-absent. Waiters poll, so which of several
/// waiters wins a freed lock is unspecified (no queue, no fairness).
#[derive(Debug, Clone, Default)]
pub struct LockManager {
    config: LockConfig,
}

impl LockManager {
    /// Create a manager with the given configuration.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use distlock_core::{LockConfig, LockManager};
    /// use std::time::Duration;
    ///
    /// let manager = LockManager::new(LockConfig::default().timeout(Duration::from_secs(10)));
    /// assert_eq!(manager.key_for("my_resource"), "distlock:my_resource");
    /// ```
    pub fn new(config: LockConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Key used in the store for `resource`.
    pub fn key_for(&self, resource: &str) -> String {
        self.config.namespace.key_for(resource)
    }

    /// Acquire the lock for `resource`, polling until the configured timeout.
    ///
    /// Returns [`LockError::AcquireTimeout`] if the lock stayed held, or
    /// [`LockError::Store`] as soon as the store fails.
    pub async fn acquire(&self, resource: &str, store: &SharedStore) -> LockResult<Lock> {
        self.poll(resource, store, &self.config, None).await
    }

    /// Acquire with per-call overrides applied over the manager's config.
    pub async fn acquire_with<I>(
        &self,
        resource: &str,
        store: &SharedStore,
        options: I,
    ) -> LockResult<Lock>
    where
        I: IntoIterator<Item = LockOption>,
    {
        let config = self.config.clone().with_options(options);
        self.poll(resource, store, &config, None).await
    }

    /// Acquire, aborting with [`LockError::Cancelled`] once `cancel` fires.
    pub async fn acquire_cancellable(
        &self,
        resource: &str,
        store: &SharedStore,
        cancel: &CancellationToken,
    ) -> LockResult<Lock> {
        self.poll(resource, store, &self.config, Some(cancel)).await
    }

    /// Make a single attempt. `None` means the lock is currently held.
    pub async fn try_acquire(
        &self,
        resource: &str,
        store: &SharedStore,
    ) -> LockResult<Option<Lock>> {
        let key = self.key_for(resource);
        let token = LockToken::generate();

        if set_if_absent(store, &key, &token, &self.config).await? {
            info!(resource = %resource, key = %key, "Acquired lock");
            Ok(Some(Lock::new(store.clone(), resource.to_string(), key, token)))
        } else {
            debug!(resource = %resource, key = %key, "Lock already held");
            Ok(None)
        }
    }

    async fn poll(
        &self,
        resource: &str,
        store: &SharedStore,
        config: &LockConfig,
        cancel: Option<&CancellationToken>,
    ) -> LockResult<Lock> {
        let key = config.namespace.key_for(resource);
        let token = LockToken::generate();
        let started = Instant::now();
        let mut attempts: u64 = 0;

        loop {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                return Err(cancelled(resource, &key, attempts));
            }

            attempts += 1;
            if set_if_absent(store, &key, &token, config).await? {
                info!(resource = %resource, key = %key, attempts, "Acquired lock");
                return Ok(Lock::new(store.clone(), resource.to_string(), key, token));
            }

            if started.elapsed() >= config.timeout {
                debug!(resource = %resource, key = %key, attempts, "Acquire lock timeout");
                return Err(LockError::AcquireTimeout {
                    resource: resource.to_string(),
                    timeout: config.timeout,
                });
            }

            match cancel {
                Some(cancel) => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(cancelled(resource, &key, attempts)),
                        _ = pause(config.sleep_per_try) => {}
                    }
                }
                None => pause(config.sleep_per_try).await,
            }
        }
    }
}

async fn set_if_absent(
    store: &SharedStore,
    key: &str,
    token: &LockToken,
    config: &LockConfig,
) -> LockResult<bool> {
    store
        .set_if_absent(key, token.as_str(), config.expire)
        .await
        .map_err(|e| LockError::store(StoreOperation::SetIfAbsent, key, e))
}

/// Wait between attempts. A zero pause still yields so other tasks on the
/// same worker (such as the current holder) can make progress.
async fn pause(duration: Duration) {
    if duration.is_zero() {
        tokio::task::yield_now().await;
    } else {
        sleep(duration).await;
    }
}

fn cancelled(resource: &str, key: &str, attempts: u64) -> LockError {
    debug!(resource = %resource, key = %key, attempts, "Acquire cancelled");
    LockError::Cancelled {
        resource: resource.to_string(),
    }
}

/// Acquire `resource` with the default configuration plus `options`.
///
/// ```rust,ignore
/// let options = [with_timeout(Duration::from_secs(10))];
/// let lock = distlock_core::acquire("my_resource", &store, options).await?;
/// // do something ...
/// lock.release().await?;
/// ```
pub async fn acquire<I>(resource: &str, store: &SharedStore, options: I) -> LockResult<Lock>
where
    I: IntoIterator<Item = LockOption>,
{
    LockManager::default().acquire_with(resource, store, options).await
}
