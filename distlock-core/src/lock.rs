//! Lock handles and token-checked release

use std::fmt;
use tracing::{debug, warn};

use crate::error::{LockError, LockResult, StoreOperation};
use crate::store::SharedStore;
use crate::token::LockToken;

/// Result of a release call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The key held our token and was deleted.
    Released,
    /// The key was gone or held another token. The lease outlived the
    /// critical section and someone else may have held the resource since.
    OwnershipMismatch,
    /// There was no lock to release.
    NotHeld,
}

impl ReleaseOutcome {
    /// Check if the store key was actually deleted.
    pub fn is_released(&self) -> bool {
        matches!(self, Self::Released)
    }
}

/// A held lock.
///
/// Created by a successful acquire. The handle is exclusively owned and is
/// not `Clone`: sharing it would let two callers believe they can release
/// the same key.
///
/// Dropping an unreleased lock schedules a best-effort release on the
/// current Tokio runtime. Call [`Lock::release`] to observe the outcome.
pub struct Lock {
    store: Option<SharedStore>,
    resource: String,
    key: String,
    token: LockToken,
    armed: bool,
}

impl Lock {
    pub(crate) fn new(store: SharedStore, resource: String, key: String, token: LockToken) -> Self {
        Self {
            store: Some(store),
            resource,
            key,
            token,
            armed: true,
        }
    }

    /// Rebuild a handle from its parts, e.g. from a token persisted by
    /// another process. Without a store, [`Lock::release`] reports
    /// [`LockError::NoStore`].
    pub fn from_parts(
        resource: impl Into<String>,
        key: impl Into<String>,
        token: LockToken,
        store: Option<SharedStore>,
    ) -> Self {
        Self {
            armed: store.is_some(),
            store,
            resource: resource.into(),
            key: key.into(),
            token,
        }
    }

    /// Get the resource name
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Get the lock key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the ownership token
    pub fn token(&self) -> &LockToken {
        &self.token
    }

    /// Check whether a store handle is bound
    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Release the lock.
    ///
    /// Deletes the key only if it still holds this lock's token, in one
    /// atomic store operation. A mismatch is not an error: it is returned as
    /// [`ReleaseOutcome::OwnershipMismatch`] and logged at warn level.
    pub async fn release(mut self) -> LockResult<ReleaseOutcome> {
        self.armed = false;
        let store = self.store.clone().ok_or(LockError::NoStore)?;
        release_token(&store, &self.resource, &self.key, &self.token).await
    }

    /// Release an optional lock. `None` is a no-op returning
    /// [`ReleaseOutcome::NotHeld`] without touching any store.
    pub async fn release_opt(lock: Option<Self>) -> LockResult<ReleaseOutcome> {
        match lock {
            Some(lock) => lock.release().await,
            None => Ok(ReleaseOutcome::NotHeld),
        }
    }

    /// Give up the handle without touching the store. The key stays until its
    /// lease expires.
    pub fn leak(mut self) {
        self.armed = false;
        debug!(resource = %self.resource, key = %self.key, "Lock abandoned to its lease");
    }
}

/// Release an optional lock. `None` is a no-op.
pub async fn release(lock: Option<Lock>) -> LockResult<ReleaseOutcome> {
    Lock::release_opt(lock).await
}

async fn release_token(
    store: &SharedStore,
    resource: &str,
    key: &str,
    token: &LockToken,
) -> LockResult<ReleaseOutcome> {
    let deleted = store
        .compare_and_delete(key, token.as_str())
        .await
        .map_err(|e| LockError::store(StoreOperation::CompareAndDelete, key, e))?;

    if deleted {
        debug!(resource = %resource, key = %key, "Released lock");
        Ok(ReleaseOutcome::Released)
    } else {
        warn!(
            resource = %resource,
            key = %key,
            "Released lock with mismatched token (expired or taken over)"
        );
        Ok(ReleaseOutcome::OwnershipMismatch)
    }
}

impl Drop for Lock {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Some(store) = self.store.clone() else {
            return;
        };

        let resource = std::mem::take(&mut self.resource);
        let key = std::mem::take(&mut self.key);
        let token = self.token.clone();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = release_token(&store, &resource, &key, &token).await {
                        warn!(
                            resource = %resource,
                            key = %key,
                            error = %e,
                            "Release on drop failed"
                        );
                    }
                });
            }
            Err(_) => {
                warn!(
                    resource = %resource,
                    key = %key,
                    "Lock dropped outside a Tokio runtime; left to expire"
                );
            }
        }
    }
}

impl fmt::Debug for Lock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lock")
            .field("resource", &self.resource)
            .field("key", &self.key)
            .field("token", &self.token)
            .field("store", &self.store.as_ref().map(|s| s.store_type()))
            .finish()
    }
}
